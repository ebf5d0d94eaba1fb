//! Response envelope normalization
//!
//! The backend answers with a paginated envelope `{results, next, count}`,
//! but some endpoints return a bare array or a single object. Every shape
//! is normalized into a `Page` of records.

use serde::Deserialize;
use serde_json::Value;

/// Shapes a metric endpoint may answer with.
///
/// `next` and `count` stay loosely typed so a malformed link or count never
/// costs the envelope its records.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawPage {
    Envelope {
        results: Vec<Value>,
        #[serde(default)]
        next: Value,
        #[serde(default)]
        count: Value,
    },
    List(Vec<Value>),
    Single(Value),
}

/// One normalized page of records
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub records: Vec<Value>,
    pub next: Option<String>,
    pub count: Option<u64>,
}

impl Page {
    /// Normalize an already-decoded body
    pub fn from_value(value: Value) -> Self {
        match serde_json::from_value::<RawPage>(value) {
            Ok(RawPage::Envelope { results, next, count }) => Page {
                records: results,
                next: next_link(next),
                count: record_count(count),
            },
            Ok(RawPage::List(records)) => Page {
                records,
                next: None,
                count: None,
            },
            Ok(RawPage::Single(Value::Null)) | Err(_) => Page {
                records: Vec::new(),
                next: None,
                count: None,
            },
            Ok(RawPage::Single(record)) => Page {
                records: vec![record],
                next: None,
                count: None,
            },
        }
    }

    /// Decode and normalize a response body
    pub fn parse(body: &str) -> Result<Self, serde_json::Error> {
        if body.trim().is_empty() {
            return Ok(Self::from_value(Value::Null));
        }
        let value: Value = serde_json::from_str(body)?;
        Ok(Self::from_value(value))
    }
}

fn next_link(next: Value) -> Option<String> {
    match next {
        Value::String(link) if !link.trim().is_empty() => Some(link),
        Value::Null | Value::String(_) => None,
        other => {
            tracing::debug!(next = %other, "ignoring non-string next link");
            None
        }
    }
}

fn record_count(count: Value) -> Option<u64> {
    if count.is_null() {
        return None;
    }
    let parsed = match &count {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    if parsed.is_none() {
        tracing::debug!(count = %count, "ignoring malformed count");
    }
    parsed
}
