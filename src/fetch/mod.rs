//! Backend Fetching
//!
//! Everything between a metric endpoint path and a flat list of JSON
//! records.
//!
//! ## Architecture
//!
//! - **Requester**: authenticated HTTP GET seam (reqwest in production)
//! - **Envelope**: normalizes `{results, next, count}`, bare arrays and bare objects
//! - **PaginatedFetcher**: follows `next` links, fails the whole fetch on any bad page

mod envelope;
mod error;
mod paginator;
mod requester;

pub use envelope::Page;
pub use error::{FetchError, FetchResult};
pub use paginator::{upgrade_scheme, FetcherConfig, PaginatedFetcher, DEFAULT_MAX_PAGES};
pub use requester::{AuthenticatedRequester, HttpResponse, Requester, RequesterConfig, Target};

#[cfg(test)]
pub(crate) use paginator::testing;
