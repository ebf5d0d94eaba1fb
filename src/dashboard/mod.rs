//! Dashboard
//!
//! Owns one panel per enabled metric and the shared `(user, range)`
//! selection. Panels refresh concurrently and independently; the dashboard
//! only learns about data through the panels' update callbacks.

use chrono::Duration;
use futures_util::future::join_all;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use crate::cache::{Clock, SystemClock, DEFAULT_TTL_SECS};
use crate::fetch::PaginatedFetcher;
use crate::metrics::{MetricKind, MetricSeries, Status};
use crate::panel::{
    format_value, headline_value, DateFormatter, MetricPanel, PanelView, PatternFormatter,
    RefreshOutcome, Selection,
};

/// Shared settings applied to every panel
#[derive(Clone)]
pub struct DashboardOptions {
    pub cache_ttl: Duration,
    pub clock: Arc<dyn Clock>,
    pub formatter: Arc<dyn DateFormatter>,
}

impl Default for DashboardOptions {
    fn default() -> Self {
        Self {
            cache_ttl: Duration::seconds(DEFAULT_TTL_SECS),
            clock: Arc::new(SystemClock),
            formatter: Arc::new(PatternFormatter::default()),
        }
    }
}

type LatestSeries = Arc<RwLock<HashMap<MetricKind, Arc<MetricSeries>>>>;

/// Parent container for a set of metric panels
pub struct Dashboard {
    panels: Vec<MetricPanel>,
    selection: Mutex<Selection>,
    latest: LatestSeries,
}

impl Dashboard {
    /// Dashboard over every metric with default options
    pub fn new(fetcher: Arc<PaginatedFetcher>) -> Self {
        Self::with_metrics(fetcher, MetricKind::all(), DashboardOptions::default())
    }

    /// Dashboard over `metrics`, in that order; duplicates are ignored
    pub fn with_metrics(
        fetcher: Arc<PaginatedFetcher>,
        metrics: &[MetricKind],
        options: DashboardOptions,
    ) -> Self {
        let latest: LatestSeries = Arc::new(RwLock::new(HashMap::new()));
        let mut panels: Vec<MetricPanel> = Vec::with_capacity(metrics.len());

        for &kind in metrics {
            if panels.iter().any(|p| p.kind() == kind) {
                continue;
            }
            let sink = Arc::clone(&latest);
            let panel = MetricPanel::new(kind, Arc::clone(&fetcher))
                .cache(options.cache_ttl, Arc::clone(&options.clock))
                .formatter(Arc::clone(&options.formatter))
                .on_update(Arc::new(move |kind, series| {
                    sink.write()
                        .unwrap_or_else(PoisonError::into_inner)
                        .insert(kind, series);
                }));
            panels.push(panel);
        }

        Self {
            panels,
            selection: Mutex::new(Selection::default()),
            latest,
        }
    }

    pub fn panels(&self) -> &[MetricPanel] {
        &self.panels
    }

    pub fn panel(&self, kind: MetricKind) -> Option<&MetricPanel> {
        self.panels.iter().find(|p| p.kind() == kind)
    }

    pub fn selection(&self) -> Selection {
        self.selection
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Switch user and/or range and refresh every panel
    pub async fn set_selection(&self, selection: Selection) -> Vec<(MetricKind, RefreshOutcome)> {
        *self.selection.lock().unwrap_or_else(PoisonError::into_inner) = selection.clone();
        tracing::info!(
            user = selection.user_id.as_deref().unwrap_or("-"),
            range = %selection.range.clone().unwrap_or_default(),
            "selection changed"
        );
        self.refresh_with(&selection).await
    }

    /// Refresh every panel against the current selection
    pub async fn refresh_all(&self) -> Vec<(MetricKind, RefreshOutcome)> {
        let selection = self.selection();
        self.refresh_with(&selection).await
    }

    async fn refresh_with(&self, selection: &Selection) -> Vec<(MetricKind, RefreshOutcome)> {
        let refreshes = self.panels.iter().map(|panel| async move {
            (panel.kind(), panel.refresh(selection).await)
        });
        join_all(refreshes).await
    }

    /// Render every panel, in panel order
    pub fn views(&self) -> Vec<PanelView> {
        self.panels.iter().map(MetricPanel::view).collect()
    }

    /// Cross-metric overview built from the series the panels delivered
    pub fn summary(&self) -> DashboardSummary {
        let latest = self.latest.read().unwrap_or_else(PoisonError::into_inner);
        DashboardSummary::from_series(&latest)
    }

    /// Cancel every panel; later refreshes do nothing
    pub fn unmount(&self) {
        for panel in &self.panels {
            panel.unmount();
        }
        tracing::debug!(panels = self.panels.len(), "dashboard unmounted");
    }
}

/// Headline and status for one metric
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MetricSummary {
    pub headline: String,
    pub status: Status,
    pub samples: usize,
}

/// Overview across all metrics with data
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct DashboardSummary {
    pub metrics: BTreeMap<MetricKind, MetricSummary>,
    pub status_counts: BTreeMap<Status, usize>,
}

impl DashboardSummary {
    pub fn from_series(series: &HashMap<MetricKind, Arc<MetricSeries>>) -> Self {
        let mut summary = Self::default();
        for (&kind, series) in series {
            let Some(value) = headline_value(kind, series) else {
                continue;
            };
            let status = kind.classifier().classify(&value);
            *summary.status_counts.entry(status).or_insert(0) += 1;
            summary.metrics.insert(
                kind,
                MetricSummary {
                    headline: format_value(kind, &value),
                    status,
                    samples: series.len(),
                },
            );
        }
        summary
    }

    /// Metrics outside the normal band
    pub fn attention(&self) -> usize {
        self.status_counts
            .iter()
            .filter(|(status, _)| **status != Status::Normal)
            .map(|(_, n)| n)
            .sum()
    }
}

impl fmt::Display for DashboardSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} metrics with data, {} need attention",
            self.metrics.len(),
            self.attention()
        )?;
        let flagged: Vec<String> = self
            .status_counts
            .iter()
            .filter(|(status, _)| **status != Status::Normal)
            .map(|(status, n)| format!("{} {}", n, status))
            .collect();
        if !flagged.is_empty() {
            write!(f, " ({})", flagged.join(", "))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ManualClock;
    use crate::fetch::testing::ScriptedRequester;
    use crate::fetch::FetcherConfig;
    use crate::metrics::{MetricSample, SampleValue};
    use crate::range::{RangeToken, TimeRange};
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    fn body(field: &str, values: &[f64]) -> String {
        let results: Vec<_> = values
            .iter()
            .enumerate()
            .map(|(i, v)| json!({"date": format!("2026-01-01T0{}:00:00Z", i), field: v}))
            .collect();
        json!({"results": results, "next": null, "count": values.len()}).to_string()
    }

    fn dashboard(requester: Arc<ScriptedRequester>) -> (Dashboard, ManualClock) {
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap());
        let fetcher = Arc::new(PaginatedFetcher::new(requester, FetcherConfig::default()));
        let options = DashboardOptions {
            clock: Arc::new(clock.clone()),
            ..DashboardOptions::default()
        };
        let dashboard = Dashboard::with_metrics(
            fetcher,
            &[MetricKind::HeartRate, MetricKind::Spo2, MetricKind::Steps],
            options,
        );
        (dashboard, clock)
    }

    fn routes() -> ScriptedRequester {
        ScriptedRequester::new()
            .route(
                "/api/HeartRate_Data/?user_id=u1&range=24h",
                200,
                &body("once_heart_value", &[70.0, 112.0]),
            )
            .route(
                "/api/Spo2-data/?user_id=u1&range=24h",
                200,
                &body("Blood_oxygen", &[98.0]),
            )
            .route("/api/Steps/?user_id=u1&range=24h", 503, "down")
    }

    fn requester() -> Arc<ScriptedRequester> {
        Arc::new(routes())
    }

    #[tokio::test]
    async fn test_set_selection_refreshes_every_panel() {
        let requester = requester();
        let (dashboard, _clock) = dashboard(requester.clone());

        let outcomes = dashboard.set_selection(Selection::default().user("u1")).await;

        assert_eq!(outcomes.len(), 3);
        assert_eq!(outcomes[0], (MetricKind::HeartRate, RefreshOutcome::Fetched { samples: 2 }));
        assert_eq!(outcomes[1], (MetricKind::Spo2, RefreshOutcome::Fetched { samples: 1 }));
        assert!(matches!(outcomes[2], (MetricKind::Steps, RefreshOutcome::Failed(_))));
        assert_eq!(requester.call_count(), 3);

        let views = dashboard.views();
        assert!(matches!(views[2], PanelView::Error { .. }));
    }

    #[tokio::test]
    async fn test_summary_only_sees_successful_data() {
        let (dashboard, _clock) = dashboard(requester());
        dashboard.set_selection(Selection::default().user("u1")).await;

        let summary = dashboard.summary();
        assert_eq!(summary.metrics.len(), 2);
        assert_eq!(summary.metrics[&MetricKind::HeartRate].headline, "112 BPM");
        assert_eq!(summary.metrics[&MetricKind::HeartRate].status, Status::High);
        assert_eq!(summary.metrics[&MetricKind::Spo2].status, Status::Normal);
        assert!(!summary.metrics.contains_key(&MetricKind::Steps));
        assert_eq!(summary.attention(), 1);
        assert_eq!(summary.to_string(), "2 metrics with data, 1 need attention (1 High)");
    }

    #[tokio::test]
    async fn test_refresh_all_reuses_cache() {
        let requester = requester();
        let (dashboard, clock) = dashboard(requester.clone());
        dashboard.set_selection(Selection::default().user("u1")).await;

        clock.advance(Duration::minutes(1));
        let outcomes = dashboard.refresh_all().await;

        assert_eq!(outcomes[0].1, RefreshOutcome::CacheHit);
        assert_eq!(outcomes[1].1, RefreshOutcome::CacheHit);
        // Errors are not cached
        assert!(matches!(outcomes[2].1, RefreshOutcome::Failed(_)));
        assert_eq!(requester.call_count(), 4);
    }

    #[tokio::test]
    async fn test_summary_follows_cache_hits() {
        let requester = routes().route(
            "/api/HeartRate_Data/?user_id=u1&range=7d",
            200,
            &body("once_heart_value", &[150.0]),
        );
        let (dashboard, _clock) = dashboard(Arc::new(requester));

        let today = Selection::default().user("u1");
        let week = today.clone().range(TimeRange::Relative(RangeToken::Week));

        dashboard.set_selection(today.clone()).await;
        dashboard.set_selection(week).await;
        assert_eq!(dashboard.summary().metrics[&MetricKind::HeartRate].headline, "150 BPM");

        let outcomes = dashboard.set_selection(today).await;
        assert_eq!(outcomes[0].1, RefreshOutcome::CacheHit);

        let shown = dashboard.panel(MetricKind::HeartRate).unwrap().view();
        let summary = dashboard.summary();
        assert_eq!(shown.card().unwrap().headline, "112 BPM");
        assert_eq!(summary.metrics[&MetricKind::HeartRate].headline, "112 BPM");
        assert_eq!(summary.metrics[&MetricKind::HeartRate].status, Status::High);
    }

    #[tokio::test]
    async fn test_range_switch_hits_new_urls() {
        let requester = requester();
        let (dashboard, _clock) = dashboard(requester.clone());

        let week = Selection::default()
            .user("u1")
            .range(TimeRange::Relative(RangeToken::Week));
        let outcomes = dashboard.set_selection(week.clone()).await;

        // No routes for 7d, so every panel sees a 404
        assert!(outcomes
            .iter()
            .all(|(_, outcome)| matches!(outcome, RefreshOutcome::Failed(e) if e.status() == Some(404))));
        assert_eq!(dashboard.selection(), week);
    }

    #[tokio::test]
    async fn test_unmount_closes_every_panel() {
        let (dashboard, _clock) = dashboard(requester());
        dashboard.unmount();

        let outcomes = dashboard.refresh_all().await;
        assert!(outcomes.iter().all(|(_, o)| *o == RefreshOutcome::Closed));
        assert!(dashboard.summary().metrics.is_empty());
    }

    #[test]
    fn test_duplicate_metrics_ignored() {
        let fetcher = Arc::new(PaginatedFetcher::new(
            Arc::new(ScriptedRequester::new()),
            FetcherConfig::default(),
        ));
        let dashboard = Dashboard::with_metrics(
            fetcher,
            &[MetricKind::Hrv, MetricKind::Hrv, MetricKind::Sleep],
            DashboardOptions::default(),
        );
        assert_eq!(dashboard.panels().len(), 2);
        assert!(dashboard.panel(MetricKind::Sleep).is_some());
        assert!(dashboard.panel(MetricKind::Stress).is_none());
    }

    #[test]
    fn test_summary_uses_steps_total() {
        let at = |h| Utc.with_ymd_and_hms(2026, 1, 1, h, 0, 0).unwrap();
        let steps = MetricSeries::from_samples(
            MetricKind::Steps,
            vec![
                MetricSample::new(at(8), SampleValue::Scalar(1500.0)),
                MetricSample::new(at(9), SampleValue::Scalar(2000.0)),
            ],
        );
        let mut series = HashMap::new();
        series.insert(MetricKind::Steps, Arc::new(steps));

        let summary = DashboardSummary::from_series(&series);
        assert_eq!(summary.metrics[&MetricKind::Steps].headline, "3500 steps");
        assert_eq!(summary.metrics[&MetricKind::Steps].status, Status::Low);
        assert_eq!(summary.status_counts.get(&Status::Low), Some(&1));
    }
}
