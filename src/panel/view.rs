//! Panel rendering
//!
//! Turns a panel's state into a card: headline value, status band and the
//! derived statistics. Everything here is recomputed per render.

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, FixedOffset, Offset, Utc};
use serde::Serialize;
use std::fmt;

use super::state::PanelState;
use crate::metrics::{Headline, MetricKind, MetricSeries, SampleValue, SeriesStats, Status};

/// Formats sample timestamps for display
pub trait DateFormatter: Send + Sync {
    fn format(&self, timestamp: &DateTime<Utc>) -> String;
}

const DEFAULT_PATTERN: &str = "%b %d, %H:%M";

/// strftime pattern in a fixed UTC offset
#[derive(Debug, Clone)]
pub struct PatternFormatter {
    pattern: String,
    offset: FixedOffset,
}

impl PatternFormatter {
    /// Invalid patterns and out-of-range offsets fall back to the defaults
    pub fn new(pattern: impl Into<String>, offset_minutes: i32) -> Self {
        let mut pattern = pattern.into();
        if StrftimeItems::new(&pattern).any(|item| matches!(item, Item::Error)) {
            tracing::warn!(pattern = %pattern, "invalid date format, using {}", DEFAULT_PATTERN);
            pattern = DEFAULT_PATTERN.to_string();
        }

        let offset = offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .unwrap_or_else(|| {
                tracing::warn!(offset_minutes, "UTC offset out of range, using UTC");
                Utc.fix()
            });

        Self { pattern, offset }
    }
}

impl Default for PatternFormatter {
    fn default() -> Self {
        Self::new(DEFAULT_PATTERN, 0)
    }
}

impl DateFormatter for PatternFormatter {
    fn format(&self, timestamp: &DateTime<Utc>) -> String {
        timestamp
            .with_timezone(&self.offset)
            .format(&self.pattern)
            .to_string()
    }
}

/// A rendered metric card
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CardView {
    pub metric: MetricKind,
    pub title: String,
    pub headline: String,
    pub status: Status,
    pub stats: SeriesStats,
    pub latest_at: Option<String>,
}

/// What a panel renders
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum PanelView {
    Loading { metric: MetricKind },
    Empty { metric: MetricKind, message: String },
    Error { metric: MetricKind, message: String, retryable: bool },
    Ready(CardView),
}

impl PanelView {
    pub fn render(kind: MetricKind, state: &PanelState, formatter: &dyn DateFormatter) -> Self {
        match state {
            PanelState::Loading => PanelView::Loading { metric: kind },
            PanelState::Empty => PanelView::Empty {
                metric: kind,
                message: format!("No {} data for this period", kind.title().to_lowercase()),
            },
            PanelState::Error { message, .. } => PanelView::Error {
                metric: kind,
                message: message.clone(),
                retryable: true,
            },
            PanelState::Success(series) => match card(kind, series, formatter) {
                Some(card) => PanelView::Ready(card),
                None => PanelView::Empty {
                    metric: kind,
                    message: format!("No {} data for this period", kind.title().to_lowercase()),
                },
            },
        }
    }

    pub fn card(&self) -> Option<&CardView> {
        match self {
            PanelView::Ready(card) => Some(card),
            _ => None,
        }
    }
}

fn card(kind: MetricKind, series: &MetricSeries, formatter: &dyn DateFormatter) -> Option<CardView> {
    let latest = series.latest()?;
    let stats = SeriesStats::compute(series);
    let value = headline_value(kind, series)?;

    Some(CardView {
        metric: kind,
        title: kind.title().to_string(),
        headline: format_value(kind, &value),
        status: kind.classifier().classify(&value),
        latest_at: Some(formatter.format(&latest.timestamp)),
        stats,
    })
}

/// The value a card leads with: the latest reading, or the period total
pub fn headline_value(kind: MetricKind, series: &MetricSeries) -> Option<SampleValue> {
    let latest = series.latest()?;
    Some(match kind.headline() {
        Headline::Latest => latest.value,
        Headline::Total => SampleValue::Scalar(series.primary_values().iter().sum()),
    })
}

/// Format a value with the metric's precision and unit
pub fn format_value(kind: MetricKind, value: &SampleValue) -> String {
    let precision = kind.precision();
    let number = match *value {
        SampleValue::Scalar(v) => format!("{:.*}", precision, v),
        SampleValue::Pair(a, b) => format!("{:.*}/{:.*}", precision, a, precision, b),
    };

    match kind.unit() {
        "" => number,
        "%" => format!("{}%", number),
        unit => format!("{} {}", number, unit),
    }
}

impl fmt::Display for PanelView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PanelView::Loading { metric } => write!(f, "{:<16} loading...", metric.title()),
            PanelView::Empty { metric, message } => write!(f, "{:<16} {}", metric.title(), message),
            PanelView::Error { metric, message, .. } => {
                write!(f, "{:<16} error: {} (retry available)", metric.title(), message)
            }
            PanelView::Ready(card) => {
                let kind = card.metric;
                write!(f, "{:<16} {:>14}  [{}]", card.title, card.headline, card.status)?;
                write!(
                    f,
                    "\n{:<16} avg {}  min {}  max {}  · {} samples",
                    "",
                    format_value(kind, &SampleValue::Scalar(card.stats.primary.average)),
                    format_value(kind, &SampleValue::Scalar(card.stats.primary.min)),
                    format_value(kind, &SampleValue::Scalar(card.stats.primary.max)),
                    card.stats.count
                )?;
                if let Some(latest_at) = &card.latest_at {
                    write!(f, "  · latest {}", latest_at)?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::MetricSample;
    use chrono::TimeZone;
    use std::sync::Arc;

    fn series(kind: MetricKind, values: &[SampleValue]) -> Arc<MetricSeries> {
        let samples = values
            .iter()
            .enumerate()
            .map(|(i, v)| {
                MetricSample::new(Utc.with_ymd_and_hms(2026, 1, 1, 8 + i as u32, 0, 0).unwrap(), *v)
            })
            .collect();
        Arc::new(MetricSeries::from_samples(kind, samples))
    }

    #[test]
    fn test_format_values() {
        assert_eq!(format_value(MetricKind::HeartRate, &SampleValue::Scalar(72.0)), "72 BPM");
        assert_eq!(format_value(MetricKind::Spo2, &SampleValue::Scalar(97.6)), "98%");
        assert_eq!(format_value(MetricKind::Sleep, &SampleValue::Scalar(7.34)), "7.3 h");
        assert_eq!(format_value(MetricKind::Stress, &SampleValue::Scalar(41.0)), "41");
        assert_eq!(
            format_value(MetricKind::BloodPressure, &SampleValue::Pair(120.0, 80.0)),
            "120/80 mmHg"
        );
    }

    #[test]
    fn test_ready_card_uses_latest() {
        let state = PanelState::from_series(series(
            MetricKind::HeartRate,
            &[SampleValue::Scalar(110.0), SampleValue::Scalar(72.0)],
        ));
        let view = PanelView::render(MetricKind::HeartRate, &state, &PatternFormatter::default());
        let card = view.card().unwrap();

        assert_eq!(card.headline, "72 BPM");
        assert_eq!(card.status, Status::Normal);
        assert_eq!(card.stats.primary.max, 110.0);
        assert_eq!(card.latest_at.as_deref(), Some("Jan 01, 09:00"));
    }

    #[test]
    fn test_steps_headline_is_total() {
        let state = PanelState::from_series(series(
            MetricKind::Steps,
            &[SampleValue::Scalar(4000.0), SampleValue::Scalar(7000.0)],
        ));
        let view = PanelView::render(MetricKind::Steps, &state, &PatternFormatter::default());
        let card = view.card().unwrap();

        assert_eq!(card.headline, "11000 steps");
        assert_eq!(card.status, Status::High);
    }

    #[test]
    fn test_non_ready_states() {
        let formatter = PatternFormatter::default();
        assert_eq!(
            PanelView::render(MetricKind::Hrv, &PanelState::Loading, &formatter),
            PanelView::Loading { metric: MetricKind::Hrv }
        );
        assert!(matches!(
            PanelView::render(MetricKind::Hrv, &PanelState::Empty, &formatter),
            PanelView::Empty { .. }
        ));
        let error = PanelState::Error {
            message: "Unable to load HRV".to_string(),
            cause: crate::fetch::FetchError::Timeout,
        };
        assert!(matches!(
            PanelView::render(MetricKind::Hrv, &error, &formatter),
            PanelView::Error { retryable: true, .. }
        ));
    }

    #[test]
    fn test_formatter_offset() {
        let formatter = PatternFormatter::new("%Y-%m-%d %H:%M", 120);
        let ts = Utc.with_ymd_and_hms(2026, 1, 1, 23, 30, 0).unwrap();
        assert_eq!(formatter.format(&ts), "2026-01-02 01:30");
    }

    #[test]
    fn test_invalid_pattern_uses_default() {
        let formatter = PatternFormatter::new("%Q %Y", 0);
        let ts = Utc.with_ymd_and_hms(2026, 1, 1, 9, 0, 0).unwrap();

        assert_eq!(formatter.format(&ts), "Jan 01, 09:00");

        let state = PanelState::from_series(series(MetricKind::HeartRate, &[SampleValue::Scalar(70.0)]));
        let view = PanelView::render(MetricKind::HeartRate, &state, &PatternFormatter::new("%", 0));
        assert_eq!(view.card().unwrap().latest_at.as_deref(), Some("Jan 01, 08:00"));
    }

    #[test]
    fn test_out_of_range_offset_uses_utc() {
        let ts = Utc.with_ymd_and_hms(2026, 1, 1, 9, 0, 0).unwrap();
        for minutes in [i32::MAX, i32::MIN, 24 * 60] {
            let formatter = PatternFormatter::new("%H:%M", minutes);
            assert_eq!(formatter.format(&ts), "09:00");
        }
    }
}
