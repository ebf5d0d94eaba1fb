//! Vital-Sign Metrics
//!
//! Per-metric descriptors and the pure data side of a panel.
//!
//! - [`MetricKind`]: endpoint, field names, unit and thresholds for one vital
//! - [`MetricSeries`]: sorted samples parsed from backend records
//! - [`SeriesStats`]: average, extremes and latest value, recomputed per render

mod kinds;
mod sample;
mod stats;

pub use kinds::{Headline, MetricKind, ValueFields, FALLBACK_VALUE_FIELD, TIMESTAMP_FIELDS};
pub use sample::{parse_timestamp, MetricSample, MetricSeries, SampleValue};
pub use stats::{
    average, classify_blood_pressure, min_max, Band, Bound, Classifier, ComponentStats,
    SeriesStats, Status,
};
