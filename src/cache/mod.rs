//! Panel Cache
//!
//! Short-lived in-memory cache of fetched series. Each panel owns its own
//! instance; nothing is shared across panels or persisted.

mod clock;
mod ttl;

pub use clock::{Clock, ManualClock, SystemClock};
pub use ttl::{CacheEntry, TtlCache, DEFAULT_TTL_SECS};
