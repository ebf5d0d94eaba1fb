//! Paginated fetcher
//!
//! Follows `next` links until the chain ends and returns every record in
//! page order. Any failed page fails the whole fetch; partial results are
//! never returned.

use serde_json::Value;
use std::sync::Arc;

use super::envelope::Page;
use super::error::{FetchError, FetchResult};
use super::requester::{Requester, Target};

/// Default upper bound on pages followed in one fetch
pub const DEFAULT_MAX_PAGES: usize = 1000;

/// Fetch options
#[derive(Debug, Clone)]
pub struct FetcherConfig {
    /// Rewrite `http://` next links to `https://` before following them
    pub force_https_next: bool,
    /// Abort once this many pages have been requested
    pub max_pages: usize,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            force_https_next: true,
            max_pages: DEFAULT_MAX_PAGES,
        }
    }
}

/// Walks a paginated endpoint through a shared requester
pub struct PaginatedFetcher {
    requester: Arc<dyn Requester>,
    config: FetcherConfig,
}

impl PaginatedFetcher {
    pub fn new(requester: Arc<dyn Requester>, config: FetcherConfig) -> Self {
        Self { requester, config }
    }

    pub fn config(&self) -> &FetcherConfig {
        &self.config
    }

    /// Fetch every page reachable from `path` and concatenate the records.
    ///
    /// Restartable: each call begins again at `path`.
    pub async fn fetch_all(&self, path: &str) -> FetchResult<Vec<Value>> {
        let mut records = Vec::new();
        let mut target = Target::Path(path.to_string());
        let mut pages = 0usize;

        loop {
            if pages >= self.config.max_pages {
                tracing::warn!(path, pages, "pagination limit reached");
                return Err(FetchError::TooManyPages(self.config.max_pages));
            }
            pages += 1;

            let response = self.requester.get(&target).await?;
            if !response.is_success() {
                let url = self.requester.resolve_url(&target);
                tracing::debug!(%url, status = response.status, page = pages, "page failed");
                return Err(FetchError::Status {
                    status: response.status,
                    url,
                });
            }

            let page = Page::parse(&response.body)?;
            tracing::debug!(
                url = target.as_str(),
                page = pages,
                records = page.records.len(),
                count = ?page.count,
                "fetched page"
            );
            records.extend(page.records);

            match page.next {
                Some(next) => {
                    let next = if self.config.force_https_next {
                        upgrade_scheme(&next)
                    } else {
                        next
                    };
                    target = Target::Absolute(next);
                }
                None => break,
            }
        }

        Ok(records)
    }
}

/// Rewrite an insecure `http://` URL to `https://`
pub fn upgrade_scheme(url: &str) -> String {
    match url.get(..7) {
        Some(scheme) if scheme.eq_ignore_ascii_case("http://") => format!("https://{}", &url[7..]),
        _ => url.to_string(),
    }
}
