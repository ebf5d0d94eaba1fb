//! Samples and series
//!
//! Backend records are loosely shaped JSON objects. This module pulls a
//! timestamp, a value and an owner out of each one and assembles the
//! sorted series a panel renders. Records that cannot be read are skipped.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashSet;

use super::kinds::{MetricKind, ValueFields, FALLBACK_VALUE_FIELD, TIMESTAMP_FIELDS, USER_FIELDS};

/// A measured value
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
#[serde(untagged)]
pub enum SampleValue {
    Scalar(f64),
    /// Two-component reading, e.g. systolic/diastolic
    Pair(f64, f64),
}

impl SampleValue {
    /// Value used for averages, ranges and band classification
    pub fn primary(&self) -> f64 {
        match *self {
            SampleValue::Scalar(v) => v,
            SampleValue::Pair(a, _) => a,
        }
    }

    pub fn secondary(&self) -> Option<f64> {
        match *self {
            SampleValue::Scalar(_) => None,
            SampleValue::Pair(_, b) => Some(b),
        }
    }
}

/// A single immutable reading
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MetricSample {
    pub timestamp: DateTime<Utc>,
    pub value: SampleValue,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

impl MetricSample {
    pub fn new(timestamp: DateTime<Utc>, value: SampleValue) -> Self {
        Self {
            timestamp,
            value,
            user_id: None,
        }
    }

    /// Builder method: set owner
    pub fn user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    /// Read one backend record for `kind`; None if it lacks a usable
    /// timestamp or value
    pub fn from_record(kind: MetricKind, record: &Value) -> Option<Self> {
        let object = record.as_object()?;

        let timestamp = TIMESTAMP_FIELDS
            .iter()
            .find_map(|field| object.get(*field).and_then(parse_timestamp))?;

        let value = match kind.value_fields() {
            ValueFields::Single(field) => {
                let v = number_field(object, field).or_else(|| number_field(object, FALLBACK_VALUE_FIELD))?;
                SampleValue::Scalar(v)
            }
            ValueFields::Pair(first, second) => {
                match (number_field(object, first), number_field(object, second)) {
                    (Some(a), Some(b)) => SampleValue::Pair(a, b),
                    _ => object.get(FALLBACK_VALUE_FIELD).and_then(parse_pair)?,
                }
            }
        };

        let user_id = USER_FIELDS.iter().find_map(|field| match object.get(*field)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        });

        Some(Self {
            timestamp,
            value,
            user_id,
        })
    }
}

/// Samples sorted ascending by timestamp
#[derive(Debug, Clone, Serialize, PartialEq, Default)]
#[serde(transparent)]
pub struct MetricSeries {
    samples: Vec<MetricSample>,
}

impl MetricSeries {
    /// Build a series from already-parsed samples, applying `kind`'s
    /// ordering rules
    pub fn from_samples(kind: MetricKind, mut samples: Vec<MetricSample>) -> Self {
        if kind.dedup_timestamps() {
            let mut seen = HashSet::new();
            samples.retain(|s| seen.insert(s.timestamp));
        }
        samples.sort_by_key(|s| s.timestamp);
        Self { samples }
    }

    /// Parse backend records, skipping unreadable ones
    pub fn from_records(kind: MetricKind, records: &[Value]) -> Self {
        let mut skipped = 0usize;
        let samples: Vec<MetricSample> = records
            .iter()
            .filter_map(|record| {
                let sample = MetricSample::from_record(kind, record);
                if sample.is_none() {
                    skipped += 1;
                }
                sample
            })
            .collect();

        if skipped > 0 {
            tracing::debug!(metric = %kind, skipped, "skipped unreadable records");
        }

        Self::from_samples(kind, samples)
    }

    pub fn samples(&self) -> &[MetricSample] {
        &self.samples
    }

    pub fn iter(&self) -> std::slice::Iter<'_, MetricSample> {
        self.samples.iter()
    }

    pub fn latest(&self) -> Option<&MetricSample> {
        self.samples.last()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Primary component of every sample, in order
    pub fn primary_values(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.value.primary()).collect()
    }
}

/// Parse a backend timestamp.
///
/// Accepts RFC 3339, naive date-times (taken as UTC) and bare dates
/// (UTC midnight).
pub fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    let s = value.as_str()?.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            return Some(dt.and_utc());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

fn number_field(object: &Map<String, Value>, field: &str) -> Option<f64> {
    let value = match object.get(field)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    value.filter(|v| v.is_finite())
}

fn parse_pair(value: &Value) -> Option<SampleValue> {
    let (a, b) = value.as_str()?.split_once('/')?;
    let a = a.trim().parse::<f64>().ok()?;
    let b = b.trim().parse::<f64>().ok()?;
    Some(SampleValue::Pair(a, b))
}
