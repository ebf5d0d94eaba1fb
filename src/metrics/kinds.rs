//! Metric descriptors
//!
//! One `MetricKind` per backend endpoint. The descriptor carries everything
//! that differs between panels: endpoint path, field names, unit, headline
//! rule and classification thresholds.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::stats::{Band, Bound, Classifier, Status};

/// A vital-sign type with its own backend endpoint
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    HeartRate,
    Spo2,
    Sleep,
    Stress,
    Hrv,
    BloodPressure,
    Steps,
    DailyActivity,
}

/// Which fields hold the measured value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueFields {
    Single(&'static str),
    Pair(&'static str, &'static str),
}

/// What the card headline shows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Headline {
    /// Most recent sample
    Latest,
    /// Sum over the whole series
    Total,
}

/// Fields tried, in order, for a sample's timestamp
pub const TIMESTAMP_FIELDS: &[&str] = &["date", "timestamp", "created_at"];

/// Field tried when the metric-specific value field is missing
pub const FALLBACK_VALUE_FIELD: &str = "value";

/// Fields tried for the owning user
pub const USER_FIELDS: &[&str] = &["user_id", "user"];

const HEART_RATE_BANDS: &[Band] = &[
    Band::new(Bound::Below(60.0), Status::Low),
    Band::new(Bound::AtMost(100.0), Status::Normal),
    Band::new(Bound::Any, Status::High),
];

const SPO2_BANDS: &[Band] = &[
    Band::new(Bound::Below(90.0), Status::Critical),
    Band::new(Bound::Below(95.0), Status::Low),
    Band::new(Bound::Any, Status::Normal),
];

const SLEEP_BANDS: &[Band] = &[
    Band::new(Bound::Below(6.0), Status::Low),
    Band::new(Bound::AtMost(9.0), Status::Normal),
    Band::new(Bound::Any, Status::High),
];

const STRESS_BANDS: &[Band] = &[
    Band::new(Bound::Below(30.0), Status::Low),
    Band::new(Bound::Below(60.0), Status::Normal),
    Band::new(Bound::Below(80.0), Status::Elevated),
    Band::new(Bound::Any, Status::High),
];

const HRV_BANDS: &[Band] = &[
    Band::new(Bound::Below(20.0), Status::Low),
    Band::new(Bound::AtMost(100.0), Status::Normal),
    Band::new(Bound::Any, Status::High),
];

const STEPS_BANDS: &[Band] = &[
    Band::new(Bound::Below(5000.0), Status::Low),
    Band::new(Bound::Below(10000.0), Status::Normal),
    Band::new(Bound::Any, Status::High),
];

const ACTIVITY_BANDS: &[Band] = &[
    Band::new(Bound::Below(30.0), Status::Low),
    Band::new(Bound::Any, Status::Normal),
];

impl MetricKind {
    /// Get all metric kinds in dashboard order
    pub fn all() -> &'static [MetricKind] {
        &[
            MetricKind::HeartRate,
            MetricKind::Spo2,
            MetricKind::BloodPressure,
            MetricKind::Sleep,
            MetricKind::Stress,
            MetricKind::Hrv,
            MetricKind::Steps,
            MetricKind::DailyActivity,
        ]
    }

    /// Backend endpoint path
    pub fn path(&self) -> &'static str {
        match self {
            MetricKind::HeartRate => "/api/HeartRate_Data/",
            MetricKind::Spo2 => "/api/Spo2-data/",
            MetricKind::Sleep => "/api/sleep-data/",
            MetricKind::Stress => "/api/Stress_Data/",
            MetricKind::Hrv => "/api/HRV_Iso_Data/",
            MetricKind::BloodPressure => "/api/BloodPressure_Data/",
            MetricKind::Steps => "/api/Steps/",
            MetricKind::DailyActivity => "/api/Day_total_activity/",
        }
    }

    /// Card title
    pub fn title(&self) -> &'static str {
        match self {
            MetricKind::HeartRate => "Heart Rate",
            MetricKind::Spo2 => "Blood Oxygen",
            MetricKind::Sleep => "Sleep",
            MetricKind::Stress => "Stress",
            MetricKind::Hrv => "HRV",
            MetricKind::BloodPressure => "Blood Pressure",
            MetricKind::Steps => "Steps",
            MetricKind::DailyActivity => "Daily Activity",
        }
    }

    pub fn value_fields(&self) -> ValueFields {
        match self {
            MetricKind::HeartRate => ValueFields::Single("once_heart_value"),
            MetricKind::Spo2 => ValueFields::Single("Blood_oxygen"),
            MetricKind::Sleep => ValueFields::Single("total_sleep_hours"),
            MetricKind::Stress => ValueFields::Single("stress"),
            MetricKind::Hrv => ValueFields::Single("hrv"),
            MetricKind::BloodPressure => ValueFields::Pair("systolic", "diastolic"),
            MetricKind::Steps => ValueFields::Single("steps"),
            MetricKind::DailyActivity => ValueFields::Single("active_minutes"),
        }
    }

    /// Unit suffix for display, empty for unitless scores
    pub fn unit(&self) -> &'static str {
        match self {
            MetricKind::HeartRate => "BPM",
            MetricKind::Spo2 => "%",
            MetricKind::Sleep => "h",
            MetricKind::Stress => "",
            MetricKind::Hrv => "ms",
            MetricKind::BloodPressure => "mmHg",
            MetricKind::Steps => "steps",
            MetricKind::DailyActivity => "min",
        }
    }

    /// Decimal places shown in the headline
    pub fn precision(&self) -> usize {
        match self {
            MetricKind::Sleep => 1,
            _ => 0,
        }
    }

    pub fn headline(&self) -> Headline {
        match self {
            MetricKind::Steps => Headline::Total,
            _ => Headline::Latest,
        }
    }

    pub fn classifier(&self) -> Classifier {
        match self {
            MetricKind::HeartRate => Classifier::Bands(HEART_RATE_BANDS),
            MetricKind::Spo2 => Classifier::Bands(SPO2_BANDS),
            MetricKind::Sleep => Classifier::Bands(SLEEP_BANDS),
            MetricKind::Stress => Classifier::Bands(STRESS_BANDS),
            MetricKind::Hrv => Classifier::Bands(HRV_BANDS),
            MetricKind::BloodPressure => Classifier::BloodPressure,
            MetricKind::Steps => Classifier::Bands(STEPS_BANDS),
            MetricKind::DailyActivity => Classifier::Bands(ACTIVITY_BANDS),
        }
    }

    /// Drop samples sharing an exact timestamp before sorting.
    ///
    /// Only the SpO2 feed does this; other feeds keep duplicates.
    pub fn dedup_timestamps(&self) -> bool {
        matches!(self, MetricKind::Spo2)
    }

    /// Stable identifier used on the command line and in config
    pub fn slug(&self) -> &'static str {
        match self {
            MetricKind::HeartRate => "heart_rate",
            MetricKind::Spo2 => "spo2",
            MetricKind::Sleep => "sleep",
            MetricKind::Stress => "stress",
            MetricKind::Hrv => "hrv",
            MetricKind::BloodPressure => "blood_pressure",
            MetricKind::Steps => "steps",
            MetricKind::DailyActivity => "daily_activity",
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for MetricKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        let kind = match normalized.as_str() {
            "heart_rate" | "heartrate" | "hr" => MetricKind::HeartRate,
            "spo2" | "blood_oxygen" => MetricKind::Spo2,
            "sleep" => MetricKind::Sleep,
            "stress" => MetricKind::Stress,
            "hrv" => MetricKind::Hrv,
            "blood_pressure" | "bp" => MetricKind::BloodPressure,
            "steps" => MetricKind::Steps,
            "daily_activity" | "activity" => MetricKind::DailyActivity,
            _ => return Err(format!("unknown metric '{}'", s)),
        };
        Ok(kind)
    }
}
