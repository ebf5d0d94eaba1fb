//! Time-to-live cache
//!
//! A keyed map of payloads with a fixed freshness window. Entries are
//! never evicted on expiry; a stale entry simply stops being served and is
//! replaced by the next `put` for its key.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Arc;

use super::clock::{Clock, SystemClock};

/// Default freshness window: 5 minutes
pub const DEFAULT_TTL_SECS: i64 = 300;

/// A cached payload and when it was fetched
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    pub payload: V,
    pub fetched_at: DateTime<Utc>,
}

/// Keyed TTL cache owned by a single panel
pub struct TtlCache<V> {
    entries: HashMap<String, CacheEntry<V>>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl<V: Clone> TtlCache<V> {
    /// Create a cache with the default window and the system clock
    pub fn new() -> Self {
        Self::with_clock(Duration::seconds(DEFAULT_TTL_SECS), Arc::new(SystemClock))
    }

    pub fn with_clock(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: HashMap::new(),
            ttl,
            clock,
        }
    }

    /// Payload for `key` if it was stored less than one TTL ago
    pub fn get(&self, key: &str) -> Option<V> {
        let entry = self.entries.get(key)?;
        let age = self.clock.now() - entry.fetched_at;
        if age < self.ttl {
            Some(entry.payload.clone())
        } else {
            None
        }
    }

    /// Store `payload` under `key`, replacing any previous entry
    pub fn put(&mut self, key: impl Into<String>, payload: V) {
        let entry = CacheEntry {
            payload,
            fetched_at: self.clock.now(),
        };
        self.entries.insert(key.into(), entry);
    }

    /// Raw entry regardless of freshness
    pub fn entry(&self, key: &str) -> Option<&CacheEntry<V>> {
        self.entries.get(key)
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Number of stored entries, stale ones included
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl<V: Clone> Default for TtlCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::super::clock::ManualClock;
    use super::*;
    use chrono::TimeZone;

    fn cache() -> (TtlCache<Vec<u32>>, ManualClock) {
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2026, 1, 1, 8, 0, 0).unwrap());
        let cache = TtlCache::with_clock(
            Duration::seconds(DEFAULT_TTL_SECS),
            Arc::new(clock.clone()),
        );
        (cache, clock)
    }

    #[test]
    fn test_repeated_gets_within_window() {
        let (mut cache, clock) = cache();
        cache.put("u1|24h", vec![72, 75]);

        assert_eq!(cache.get("u1|24h"), Some(vec![72, 75]));
        clock.advance(Duration::seconds(299));
        assert_eq!(cache.get("u1|24h"), Some(vec![72, 75]));
    }

    #[test]
    fn test_stale_at_exactly_five_minutes() {
        let (mut cache, clock) = cache();
        cache.put("u1|24h", vec![72]);

        clock.advance(Duration::minutes(5));
        assert_eq!(cache.get("u1|24h"), None);

        clock.advance(Duration::hours(1));
        assert_eq!(cache.get("u1|24h"), None);
    }

    #[test]
    fn test_stale_entry_kept_until_overwritten() {
        let (mut cache, clock) = cache();
        cache.put("u1|24h", vec![1]);
        clock.advance(Duration::minutes(10));

        assert!(cache.get("u1|24h").is_none());
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.entry("u1|24h").map(|e| e.payload.clone()), Some(vec![1]));

        cache.put("u1|24h", vec![2]);
        assert_eq!(cache.get("u1|24h"), Some(vec![2]));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_keys_are_independent() {
        let (mut cache, _clock) = cache();
        cache.put("u1|24h", vec![1]);
        cache.put("u1|7d", vec![7]);
        cache.put("default|24h", vec![0]);

        assert_eq!(cache.get("u1|24h"), Some(vec![1]));
        assert_eq!(cache.get("u1|7d"), Some(vec![7]));
        assert_eq!(cache.get("default|24h"), Some(vec![0]));
        assert_eq!(cache.get("u2|24h"), None);
    }

    #[test]
    fn test_clear() {
        let (mut cache, _clock) = cache();
        cache.put("k", vec![1]);
        cache.clear();
        assert!(cache.is_empty());
    }
}
