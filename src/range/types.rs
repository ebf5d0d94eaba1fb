//! Time range types for backend queries
//!
//! This module defines the selection types shared by every panel:
//! - `RangeToken`: relative window understood by the backend (`24h`, `7d`, `30d`)
//! - `TimeRange`: relative token, explicit dates, or a one-sided filter
//! - `Period`: the user-facing choice that maps onto a `TimeRange`

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Relative window token accepted by the backend `range` parameter
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum RangeToken {
    /// Last 24 hours
    #[default]
    #[serde(rename = "24h")]
    Day,
    /// Last 7 days
    #[serde(rename = "7d")]
    Week,
    /// Last 30 days
    #[serde(rename = "30d")]
    Month,
}

impl RangeToken {
    /// All tokens in ascending window size
    pub fn all() -> &'static [RangeToken] {
        &[RangeToken::Day, RangeToken::Week, RangeToken::Month]
    }

    /// Wire representation
    pub fn as_str(&self) -> &'static str {
        match self {
            RangeToken::Day => "24h",
            RangeToken::Week => "7d",
            RangeToken::Month => "30d",
        }
    }
}

impl fmt::Display for RangeToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RangeToken {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "24h" | "1d" => Ok(RangeToken::Day),
            "7d" | "1w" => Ok(RangeToken::Week),
            "30d" | "1m" => Ok(RangeToken::Month),
            other => Err(format!("unknown range token '{}' (expected 24h, 7d or 30d)", other)),
        }
    }
}

/// Time window for a metric query
///
/// Exactly one representation is active at a time. Absolute ranges are only
/// constructible with `from <= to`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeRange {
    /// Relative window ending now
    Relative(RangeToken),
    /// Explicit inclusive calendar dates
    Absolute { from: NaiveDate, to: NaiveDate },
    /// Lower bound only
    Since(NaiveDate),
    /// Upper bound only
    Until(NaiveDate),
}

impl Default for TimeRange {
    fn default() -> Self {
        TimeRange::Relative(RangeToken::default())
    }
}

impl TimeRange {
    /// Create an absolute range, returning None if `from > to`
    pub fn absolute(from: NaiveDate, to: NaiveDate) -> Option<Self> {
        if from <= to {
            Some(TimeRange::Absolute { from, to })
        } else {
            None
        }
    }

    /// Build a range from optional bounds, as a date picker would deliver them.
    ///
    /// Returns None when both bounds are absent (callers fall back to `24h`)
    /// or when the bounds are inverted.
    pub fn from_bounds(from: Option<NaiveDate>, to: Option<NaiveDate>) -> Option<Self> {
        match (from, to) {
            (Some(from), Some(to)) => Self::absolute(from, to),
            (Some(from), None) => Some(TimeRange::Since(from)),
            (None, Some(to)) => Some(TimeRange::Until(to)),
            (None, None) => None,
        }
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeRange::Relative(token) => write!(f, "last {}", token),
            TimeRange::Absolute { from, to } => write!(f, "{} to {}", from, to),
            TimeRange::Since(from) => write!(f, "since {}", from),
            TimeRange::Until(to) => write!(f, "until {}", to),
        }
    }
}

/// User-facing period selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Period {
    #[default]
    Today,
    Week,
    Month,
    Custom { from: NaiveDate, to: NaiveDate },
}

impl Period {
    /// Map the selection onto a query range.
    ///
    /// An inverted custom range has no valid absolute form and degrades to
    /// the default window.
    pub fn time_range(&self) -> TimeRange {
        match self {
            Period::Today => TimeRange::Relative(RangeToken::Day),
            Period::Week => TimeRange::Relative(RangeToken::Week),
            Period::Month => TimeRange::Relative(RangeToken::Month),
            Period::Custom { from, to } => TimeRange::absolute(*from, *to).unwrap_or_default(),
        }
    }
}

impl FromStr for Period {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "today" | "day" => Ok(Period::Today),
            "week" => Ok(Period::Week),
            "month" => Ok(Period::Month),
            other => other
                .parse::<RangeToken>()
                .map(|token| match token {
                    RangeToken::Day => Period::Today,
                    RangeToken::Week => Period::Week,
                    RangeToken::Month => Period::Month,
                })
                .map_err(|_| format!("unknown period '{}' (expected today, week or month)", other)),
        }
    }
}

/// Parse a calendar date from any of the representations the dashboard sees.
///
/// Supports `YYYY-MM-DD`, `YYYY/MM/DD`, `DD.MM.YYYY`, RFC 3339 timestamps and
/// `YYYY-MM-DD HH:MM:SS`. Timestamps keep their own calendar date.
pub fn parse_date(input: &str) -> Option<NaiveDate> {
    let s = input.trim();

    for format in ["%Y-%m-%d", "%Y/%m/%d", "%d.%m.%Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(s, format) {
            return Some(date);
        }
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }

    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            return Some(dt.date());
        }
    }

    None
}
