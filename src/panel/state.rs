//! Panel state types

use std::sync::Arc;

use crate::fetch::FetchError;
use crate::metrics::MetricSeries;
use crate::range::TimeRange;

/// The `(user, range)` pair every panel refreshes against
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    pub user_id: Option<String>,
    /// None means the default `24h` window
    pub range: Option<TimeRange>,
}

impl Selection {
    pub fn new(user_id: Option<String>, range: Option<TimeRange>) -> Self {
        Self { user_id, range }
    }

    /// Builder method: set user
    pub fn user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    /// Builder method: set range
    pub fn range(mut self, range: TimeRange) -> Self {
        self.range = Some(range);
        self
    }
}

/// What a panel currently shows
#[derive(Debug, Clone, PartialEq)]
pub enum PanelState {
    Loading,
    Success(Arc<MetricSeries>),
    /// Fetch succeeded with no samples for the period
    Empty,
    /// Fetch failed; `retry` restarts the refresh
    Error { message: String, cause: FetchError },
}

impl PanelState {
    /// State for a resolved series
    pub fn from_series(series: Arc<MetricSeries>) -> Self {
        if series.is_empty() {
            PanelState::Empty
        } else {
            PanelState::Success(series)
        }
    }

    pub fn series(&self) -> Option<&Arc<MetricSeries>> {
        match self {
            PanelState::Success(series) => Some(series),
            _ => None,
        }
    }
}

/// How a single `refresh` call ended
#[derive(Debug, Clone, PartialEq)]
pub enum RefreshOutcome {
    /// Served from the panel cache without a request
    CacheHit,
    /// Network fetch applied to the panel
    Fetched { samples: usize },
    /// Network fetch failed and the panel shows an error
    Failed(FetchError),
    /// A newer refresh started first; nothing was applied
    Superseded,
    /// The panel is unmounted
    Closed,
}
