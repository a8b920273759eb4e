//! Response cache — short-lived payloads for repeated GET requests.
//!
//! Freshness is decided per lookup: an entry is fresh for a caller when it is
//! younger than *that caller's* TTL. Entries are never evicted on expiry; a
//! stale entry is simply ignored and later overwritten by the next successful
//! store under the same fingerprint.

use dashmap::DashMap;
use serde_json::Value;
use tokio::time::{Duration, Instant};
use tracing::trace;

use crate::fingerprint::Fingerprint;

#[derive(Debug, Clone)]
struct CacheEntry {
    payload: Value,
    stored_at: Instant,
}

/// A process-wide map from fingerprint to the last successful payload.
///
/// Uses the tokio clock, so a paused test runtime controls expiry.
///
/// # Examples
///
/// ```
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// use std::time::Duration;
/// use fetchward::cache::ResponseCache;
/// use fetchward::fingerprint::Fingerprint;
/// use serde_json::json;
///
/// let cache = ResponseCache::new();
/// let key = Fingerprint::from("GET:/users:{}:{}");
/// cache.store(key.clone(), json!([1, 2]));
///
/// assert_eq!(cache.lookup(&key, Duration::from_secs(3)), Some(json!([1, 2])));
/// assert_eq!(cache.lookup(&key, Duration::ZERO), None);
/// # }
/// ```
#[derive(Debug, Default)]
pub struct ResponseCache {
    entries: DashMap<Fingerprint, CacheEntry>,
}

impl ResponseCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached payload if it is younger than `ttl`.
    pub fn lookup(&self, fingerprint: &Fingerprint, ttl: Duration) -> Option<Value> {
        let entry = self.entries.get(fingerprint)?;
        let age = entry.stored_at.elapsed();
        if age < ttl {
            trace!(key = %fingerprint, ?age, "cache hit");
            Some(entry.payload.clone())
        } else {
            trace!(key = %fingerprint, ?age, ?ttl, "cache entry stale");
            None
        }
    }

    /// Stores `payload`, replacing any previous entry and restarting its age.
    pub fn store(&self, fingerprint: Fingerprint, payload: Value) {
        trace!(key = %fingerprint, "cache store");
        self.entries.insert(
            fingerprint,
            CacheEntry {
                payload,
                stored_at: Instant::now(),
            },
        );
    }

    /// Number of entries, stale ones included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drops every entry.
    pub fn clear(&self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn key(s: &str) -> Fingerprint {
        Fingerprint::from(s)
    }

    #[tokio::test(start_paused = true)]
    async fn fresh_within_ttl_stale_at_ttl() {
        let cache = ResponseCache::new();
        cache.store(key("a"), json!({ "id": 1 }));

        tokio::time::advance(Duration::from_millis(1000)).await;
        assert_eq!(cache.lookup(&key("a"), Duration::from_millis(3000)), Some(json!({ "id": 1 })));

        tokio::time::advance(Duration::from_millis(2000)).await;
        assert_eq!(cache.lookup(&key("a"), Duration::from_millis(3000)), None);
    }

    #[tokio::test(start_paused = true)]
    async fn staleness_is_relative_to_each_ttl() {
        let cache = ResponseCache::new();
        cache.store(key("a"), json!("v"));
        tokio::time::advance(Duration::from_millis(2000)).await;

        assert_eq!(cache.lookup(&key("a"), Duration::from_millis(1000)), None);
        assert_eq!(cache.lookup(&key("a"), Duration::from_millis(5000)), Some(json!("v")));
        // stale reads do not evict
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn store_restarts_age() {
        let cache = ResponseCache::new();
        cache.store(key("a"), json!(1));
        tokio::time::advance(Duration::from_millis(4000)).await;
        cache.store(key("a"), json!(2));
        assert_eq!(cache.lookup(&key("a"), Duration::from_millis(3000)), Some(json!(2)));
    }

    #[tokio::test]
    async fn miss_and_clear() {
        let cache = ResponseCache::new();
        assert_eq!(cache.lookup(&key("missing"), Duration::from_secs(60)), None);
        cache.store(key("b"), json!(null));
        assert!(!cache.is_empty());
        cache.clear();
        assert!(cache.is_empty());
    }
}
