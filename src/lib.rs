//! # Vitalboard
//!
//! Vital-sign dashboard client - fetches per-metric time series from a
//! paginated health backend and renders them as summary cards.
//!
//! ## Features
//!
//! - **Complete fetches**: follows `next` links until every page is loaded
//! - **Per-panel caching**: fresh results are reused for five minutes
//! - **Last request wins**: superseded fetches are aborted and never applied
//! - **Derived statistics**: average, extremes, latest value and status bands
//!
//! ## Modules
//!
//! - [`range`]: Time range selection and query parameters
//! - [`fetch`]: Authenticated requester and paginated fetcher
//! - [`cache`]: Per-panel TTL cache
//! - [`request`]: Supersession and abort guard for in-flight fetches
//! - [`metrics`]: Metric descriptors, series parsing and statistics
//! - [`panel`]: One metric's fetch/cache/render unit
//! - [`dashboard`]: Panels sharing one selection
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use vitalboard::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let requester = AuthenticatedRequester::new(RequesterConfig {
//!         base_url: "https://health.example.com".to_string(),
//!         token: Some("token".to_string()),
//!         ..RequesterConfig::default()
//!     })?;
//!     let fetcher = Arc::new(PaginatedFetcher::new(Arc::new(requester), FetcherConfig::default()));
//!
//!     let dashboard = Dashboard::new(fetcher);
//!     dashboard
//!         .set_selection(Selection::default().user("u1").range(Period::Week.time_range()))
//!         .await;
//!
//!     for view in dashboard.views() {
//!         println!("{}", view);
//!     }
//!     println!("{}", dashboard.summary());
//!
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod config;
pub mod dashboard;
pub mod fetch;
pub mod metrics;
pub mod panel;
pub mod range;
pub mod request;

// Re-export top-level types for convenience
pub use range::{cache_key, parse_date, resolve, Period, QueryParams, RangeToken, TimeRange};

pub use fetch::{
    AuthenticatedRequester, FetchError, FetchResult, FetcherConfig, HttpResponse,
    PaginatedFetcher, Requester, RequesterConfig, Target,
};

pub use cache::{Clock, ManualClock, SystemClock, TtlCache};

pub use request::{RequestGuard, RequestState, RequestToken};

pub use metrics::{MetricKind, MetricSample, MetricSeries, SampleValue, SeriesStats, Status};

pub use panel::{
    CardView, DateFormatter, MetricPanel, PanelState, PanelView, PatternFormatter,
    RefreshOutcome, Selection,
};

pub use dashboard::{Dashboard, DashboardOptions, DashboardSummary, MetricSummary};

pub use config::{Config, ConfigError, LoggingConfig};
