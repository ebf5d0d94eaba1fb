//! Derived statistics and classification
//!
//! Pure functions over a series. Empty input never panics: averages and
//! extremes fall back to zero.

use serde::Serialize;
use std::fmt;

use super::sample::{MetricSeries, SampleValue};

/// Classification band label
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Status {
    Low,
    Normal,
    Elevated,
    High,
    Critical,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Low => "Low",
            Status::Normal => "Normal",
            Status::Elevated => "Elevated",
            Status::High => "High",
            Status::Critical => "Critical",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Upper edge of a band
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Bound {
    /// value < x
    Below(f64),
    /// value <= x
    AtMost(f64),
    /// catch-all
    Any,
}

impl Bound {
    fn admits(&self, value: f64) -> bool {
        match *self {
            Bound::Below(x) => value < x,
            Bound::AtMost(x) => value <= x,
            Bound::Any => true,
        }
    }
}

/// One classification band; bands are checked in order
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Band {
    pub bound: Bound,
    pub status: Status,
}

impl Band {
    pub const fn new(bound: Bound, status: Status) -> Self {
        Self { bound, status }
    }
}

/// How a metric maps a value onto a status
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Classifier {
    /// Ordered thresholds on the primary value
    Bands(&'static [Band]),
    /// Systolic/diastolic categories
    BloodPressure,
}

impl Classifier {
    pub fn classify(&self, value: &SampleValue) -> Status {
        match self {
            Classifier::Bands(bands) => classify_bands(bands, value.primary()),
            Classifier::BloodPressure => {
                let (systolic, diastolic) = match *value {
                    SampleValue::Pair(s, d) => (s, d),
                    SampleValue::Scalar(s) => (s, 0.0),
                };
                classify_blood_pressure(systolic, diastolic)
            }
        }
    }
}

fn classify_bands(bands: &[Band], value: f64) -> Status {
    bands
        .iter()
        .find(|band| band.bound.admits(value))
        .map(|band| band.status)
        .unwrap_or(Status::Normal)
}

/// Blood pressure category from a systolic/diastolic reading (mmHg)
pub fn classify_blood_pressure(systolic: f64, diastolic: f64) -> Status {
    if systolic >= 180.0 || diastolic >= 120.0 {
        Status::Critical
    } else if systolic >= 130.0 || diastolic >= 80.0 {
        Status::High
    } else if systolic >= 120.0 {
        Status::Elevated
    } else {
        Status::Normal
    }
}

/// Arithmetic mean, 0 for empty input
pub fn average(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Minimum and maximum, `(0, 0)` for empty input
pub fn min_max(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    (min, max)
}

/// Summary of one component of a series
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Default)]
pub struct ComponentStats {
    pub average: f64,
    pub min: f64,
    pub max: f64,
    pub total: f64,
}

impl ComponentStats {
    pub fn compute(values: &[f64]) -> Self {
        let (min, max) = min_max(values);
        Self {
            average: average(values),
            min,
            max,
            total: values.iter().sum(),
        }
    }
}

/// Statistics derived from a series on every render
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SeriesStats {
    pub count: usize,
    pub primary: ComponentStats,
    /// Diastolic component for paired readings
    pub secondary: Option<ComponentStats>,
    pub latest: Option<SampleValue>,
}

impl SeriesStats {
    pub fn compute(series: &MetricSeries) -> Self {
        let primary: Vec<f64> = series.iter().map(|s| s.value.primary()).collect();
        let secondary: Vec<f64> = series.iter().filter_map(|s| s.value.secondary()).collect();

        Self {
            count: series.len(),
            primary: ComponentStats::compute(&primary),
            secondary: if secondary.is_empty() {
                None
            } else {
                Some(ComponentStats::compute(&secondary))
            },
            latest: series.latest().map(|s| s.value),
        }
    }
}
