//! Metric panel
//!
//! One self-contained fetch/cache/render unit for a single vital. A panel
//! owns its cache and request guard; both die with it.

use chrono::Duration;
use futures_util::future::Abortable;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::state::{PanelState, RefreshOutcome, Selection};
use super::view::{DateFormatter, PanelView, PatternFormatter};
use crate::cache::{Clock, SystemClock, TtlCache, DEFAULT_TTL_SECS};
use crate::fetch::{FetchError, PaginatedFetcher};
use crate::metrics::{MetricKind, MetricSeries};
use crate::range::{cache_key, resolve};
use crate::request::{RequestGuard, RequestState};

/// Invoked with the series a refresh applied, fetched or served from cache
pub type UpdateCallback = Arc<dyn Fn(MetricKind, Arc<MetricSeries>) + Send + Sync>;

struct PanelInner {
    state: PanelState,
    selection: Option<Selection>,
    cache: TtlCache<Arc<MetricSeries>>,
    guard: RequestGuard,
}

/// Fetches, caches and renders one metric
pub struct MetricPanel {
    kind: MetricKind,
    fetcher: Arc<PaginatedFetcher>,
    formatter: Arc<dyn DateFormatter>,
    on_update: Option<UpdateCallback>,
    inner: Mutex<PanelInner>,
}

impl MetricPanel {
    /// Create a panel with the default 5 minute cache window
    pub fn new(kind: MetricKind, fetcher: Arc<PaginatedFetcher>) -> Self {
        Self {
            kind,
            fetcher,
            formatter: Arc::new(PatternFormatter::default()),
            on_update: None,
            inner: Mutex::new(PanelInner {
                state: PanelState::Loading,
                selection: None,
                cache: TtlCache::with_clock(
                    Duration::seconds(DEFAULT_TTL_SECS),
                    Arc::new(SystemClock),
                ),
                guard: RequestGuard::new(),
            }),
        }
    }

    /// Builder: replace the cache with one using `ttl` and `clock`
    pub fn cache(self, ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        self.lock().cache = TtlCache::with_clock(ttl, clock);
        self
    }

    /// Builder: set the timestamp formatter used by `view`
    pub fn formatter(mut self, formatter: Arc<dyn DateFormatter>) -> Self {
        self.formatter = formatter;
        self
    }

    /// Builder: register the update callback
    pub fn on_update(mut self, callback: UpdateCallback) -> Self {
        self.on_update = Some(callback);
        self
    }

    pub fn kind(&self) -> MetricKind {
        self.kind
    }

    /// Current state snapshot
    pub fn state(&self) -> PanelState {
        self.lock().state.clone()
    }

    pub fn request_state(&self) -> RequestState {
        self.lock().guard.state()
    }

    /// Last selection this panel was asked to show
    pub fn selection(&self) -> Option<Selection> {
        self.lock().selection.clone()
    }

    /// Number of cached selections, stale ones included
    pub fn cached_entries(&self) -> usize {
        self.lock().cache.len()
    }

    /// Render the current state
    pub fn view(&self) -> PanelView {
        let state = self.state();
        PanelView::render(self.kind, &state, self.formatter.as_ref())
    }

    /// Bring the panel up to date for `selection`.
    ///
    /// Serves a fresh cache entry without touching the network. Otherwise
    /// starts a fetch that supersedes any in-flight one; only the most
    /// recently started fetch may change the panel.
    pub async fn refresh(&self, selection: &Selection) -> RefreshOutcome {
        let key = cache_key(selection.user_id.as_deref(), selection.range.as_ref());
        let path = resolve(selection.user_id.as_deref(), selection.range.as_ref())
            .apply_to(self.kind.path());

        let started = {
            let mut inner = self.lock();
            if inner.guard.is_closed() {
                return RefreshOutcome::Closed;
            }

            if inner.selection.as_ref() != Some(selection) {
                inner.selection = Some(selection.clone());
                inner.state = PanelState::Loading;
            }

            match inner.cache.get(&key) {
                Some(series) => {
                    // An older fetch must not overwrite what the cache just served
                    inner.guard.cancel();
                    tracing::debug!(metric = %self.kind, %key, "cache hit");
                    inner.state = PanelState::from_series(Arc::clone(&series));
                    Err(series)
                }
                None => Ok(inner.guard.begin()),
            }
        };

        let (token, registration) = match started {
            Ok(started) => started,
            Err(cached) => {
                self.notify(cached);
                return RefreshOutcome::CacheHit;
            }
        };

        tracing::debug!(
            metric = %self.kind,
            request_id = %token.id(),
            %path,
            "fetching"
        );

        let result = match Abortable::new(self.fetcher.fetch_all(&path), registration).await {
            Ok(result) => result,
            Err(aborted) => Err(FetchError::from(aborted)),
        };

        match result {
            Ok(records) => {
                let series = Arc::new(MetricSeries::from_records(self.kind, &records));
                {
                    let mut inner = self.lock();
                    if !inner.guard.finish(&token) {
                        return RefreshOutcome::Superseded;
                    }
                    inner.cache.put(key, Arc::clone(&series));
                    inner.state = PanelState::from_series(Arc::clone(&series));
                }

                tracing::info!(
                    metric = %self.kind,
                    request_id = %token.id(),
                    samples = series.len(),
                    "refresh applied"
                );
                let samples = series.len();
                self.notify(series);
                RefreshOutcome::Fetched { samples }
            }
            Err(err) if err.is_abort() => {
                tracing::debug!(metric = %self.kind, request_id = %token.id(), "request aborted");
                RefreshOutcome::Superseded
            }
            Err(err) => {
                let mut inner = self.lock();
                if !inner.guard.finish(&token) {
                    return RefreshOutcome::Superseded;
                }
                tracing::warn!(
                    metric = %self.kind,
                    request_id = %token.id(),
                    error = %err,
                    "refresh failed"
                );
                inner.state = PanelState::Error {
                    message: format!(
                        "Unable to load {} data. Please try again.",
                        self.kind.title().to_lowercase()
                    ),
                    cause: err.clone(),
                };
                RefreshOutcome::Failed(err)
            }
        }
    }

    /// Re-run the last refresh, showing the loading state meanwhile
    pub async fn retry(&self) -> RefreshOutcome {
        let selection = {
            let mut inner = self.lock();
            if inner.guard.is_closed() {
                return RefreshOutcome::Closed;
            }
            inner.state = PanelState::Loading;
            inner.selection.clone().unwrap_or_default()
        };
        self.refresh(&selection).await
    }

    /// Cancel any in-flight fetch and drop the cache; later refreshes are no-ops
    pub fn unmount(&self) {
        let mut inner = self.lock();
        inner.guard.cancel_all();
        inner.cache.clear();
        tracing::debug!(metric = %self.kind, "panel unmounted");
    }

    fn notify(&self, series: Arc<MetricSeries>) {
        if let Some(callback) = &self.on_update {
            callback(self.kind, series);
        }
    }

    fn lock(&self) -> MutexGuard<'_, PanelInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for MetricPanel {
    fn drop(&mut self) {
        let inner = self.inner.get_mut().unwrap_or_else(PoisonError::into_inner);
        inner.guard.cancel_all();
    }
}
