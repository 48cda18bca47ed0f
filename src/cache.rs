//! Time-boxed response cache keyed by a request fingerprint.
//!
//! The fingerprint is a SHA-256 digest of the endpoint and the parameter map
//! in canonical form (keys sorted), so two calls that build the same
//! parameter set in different orders share an entry. Expiry is lazy: an
//! expired entry is deleted the first time a `get` observes it, or in bulk
//! by `clear_expired`. There is no background sweeper — a composition root
//! that needs bounded memory calls `clear_expired` on its own schedule.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};
use tracing::debug;

/// A successfully fetched payload with its expiry bound.
#[derive(Debug, Clone)]
struct CacheEntry {
    payload: Value,
    created_at: Instant,
    expires_at: Instant,
}

/// Process-wide in-memory response cache.
///
/// Insertion is atomic per key: the whole map sits behind one mutex, held
/// only for the lookup or insert itself, never across a network call.
#[derive(Default)]
pub struct ResponseCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
}

/// Cache snapshot for the monitoring surface.
///
/// Lazily-expired entries not yet touched by a `get` still count toward
/// `total_entries` but show up as `expired_entries`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub total_entries: usize,
    pub valid_entries: usize,
    pub expired_entries: usize,
}

impl ResponseCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deterministic cache key for `(endpoint, params)`.
    ///
    /// Parameters are canonicalised into a JSON object with sorted keys, so
    /// insertion order never changes the key. The endpoint is
    /// length-prefixed to keep `("/ab", c=1)` distinct from `("/a", bc=1)`.
    pub fn fingerprint(endpoint: &str, params: &[(String, String)]) -> String {
        let canonical: serde_json::Map<String, Value> = params
            .iter()
            .map(|(key, value)| (key.clone(), Value::String(value.clone())))
            .collect();
        let canonical = Value::Object(canonical).to_string();

        let mut hasher = Sha256::new();
        hasher.update((endpoint.len() as u64).to_le_bytes());
        hasher.update(endpoint.as_bytes());
        hasher.update(canonical.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    /// Look up a payload. Expired entries are removed and reported as a miss.
    pub fn get(&self, endpoint: &str, params: &[(String, String)]) -> Option<Value> {
        let key = Self::fingerprint(endpoint, params);
        let mut entries = self.lock_entries();
        match entries.get(&key) {
            Some(entry) if Instant::now() < entry.expires_at => Some(entry.payload.clone()),
            Some(entry) => {
                let age_secs = entry.created_at.elapsed().as_secs();
                debug!(key = %&key[..8], age_secs, "cache entry expired, removing");
                entries.remove(&key);
                None
            }
            None => None,
        }
    }

    /// Insert or overwrite the payload for `(endpoint, params)`.
    ///
    /// `ttl` must be positive; the entry expires at `now + ttl`. Concurrent
    /// writers to the same fingerprint race benignly — last writer wins.
    pub fn set(&self, endpoint: &str, params: &[(String, String)], payload: Value, ttl: Duration) {
        let key = Self::fingerprint(endpoint, params);
        let now = Instant::now();
        self.lock_entries().insert(
            key,
            CacheEntry {
                payload,
                created_at: now,
                expires_at: now + ttl,
            },
        );
    }

    /// Remove every entry.
    pub fn clear(&self) {
        self.lock_entries().clear();
    }

    /// Bulk-remove entries whose expiry has passed. Housekeeping only — the
    /// request hot path relies on lazy expiry in `get`.
    pub fn clear_expired(&self) {
        let now = Instant::now();
        self.lock_entries().retain(|_, entry| now < entry.expires_at);
    }

    /// Counts without mutating state.
    pub fn stats(&self) -> CacheStats {
        let entries = self.lock_entries();
        let now = Instant::now();
        let valid_entries = entries
            .values()
            .filter(|entry| now < entry.expires_at)
            .count();
        CacheStats {
            total_entries: entries.len(),
            valid_entries,
            expired_entries: entries.len() - valid_entries,
        }
    }

    fn lock_entries(&self) -> MutexGuard<'_, HashMap<String, CacheEntry>> {
        self.entries.lock().expect("cache entries lock poisoned")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    /// Backdate an entry so it reads as expired without sleeping.
    fn expire_entry(cache: &ResponseCache, endpoint: &str, p: &[(String, String)]) {
        let key = ResponseCache::fingerprint(endpoint, p);
        let mut entries = cache.entries.lock().unwrap();
        let entry = entries.get_mut(&key).expect("entry should exist");
        entry.expires_at = Instant::now() - Duration::from_secs(1);
    }

    #[test]
    fn test_fingerprint_ignores_parameter_order() {
        let p1 = params(&[("league", "39"), ("season", "2024")]);
        let p2 = params(&[("season", "2024"), ("league", "39")]);
        assert_eq!(
            ResponseCache::fingerprint("/fixtures", &p1),
            ResponseCache::fingerprint("/fixtures", &p2)
        );
    }

    #[test]
    fn test_fingerprint_discriminates_values_and_endpoints() {
        let p1 = params(&[("league", "39")]);
        let p2 = params(&[("league", "40")]);
        assert_ne!(
            ResponseCache::fingerprint("/fixtures", &p1),
            ResponseCache::fingerprint("/fixtures", &p2)
        );
        assert_ne!(
            ResponseCache::fingerprint("/fixtures", &p1),
            ResponseCache::fingerprint("/standings", &p1)
        );
    }

    #[test]
    fn test_fingerprint_distinguishes_empty_params() {
        let with = params(&[("id", "1")]);
        assert_ne!(
            ResponseCache::fingerprint("/teams", &with),
            ResponseCache::fingerprint("/teams", &[])
        );
    }

    #[test]
    fn test_round_trip() {
        let cache = ResponseCache::new();
        let p = params(&[("id", "33")]);
        let payload = json!({"response": [{"team": {"id": 33}}]});
        cache.set("/teams", &p, payload.clone(), Duration::from_secs(60));
        assert_eq!(cache.get("/teams", &p), Some(payload));
    }

    #[test]
    fn test_expired_entry_removed_on_get() {
        let cache = ResponseCache::new();
        let p = params(&[("id", "33")]);
        cache.set("/teams", &p, json!({"a": 1}), Duration::from_secs(60));
        expire_entry(&cache, "/teams", &p);

        assert_eq!(cache.stats().total_entries, 1);
        assert!(cache.get("/teams", &p).is_none());
        assert_eq!(cache.stats().total_entries, 0, "lazy eviction on get");
    }

    #[test]
    fn test_stats_counts_expired_without_mutating() {
        let cache = ResponseCache::new();
        let fresh = params(&[("id", "1")]);
        let stale = params(&[("id", "2")]);
        cache.set("/teams", &fresh, json!(1), Duration::from_secs(60));
        cache.set("/teams", &stale, json!(2), Duration::from_secs(60));
        expire_entry(&cache, "/teams", &stale);

        let stats = cache.stats();
        assert_eq!(stats.total_entries, 2);
        assert_eq!(stats.valid_entries, 1);
        assert_eq!(stats.expired_entries, 1);
        // stats() itself must not evict
        assert_eq!(cache.stats().total_entries, 2);
    }

    #[test]
    fn test_clear_expired_sweeps_in_bulk() {
        let cache = ResponseCache::new();
        let fresh = params(&[("id", "1")]);
        let stale = params(&[("id", "2")]);
        cache.set("/teams", &fresh, json!(1), Duration::from_secs(60));
        cache.set("/teams", &stale, json!(2), Duration::from_secs(60));
        expire_entry(&cache, "/teams", &stale);

        cache.clear_expired();
        let stats = cache.stats();
        assert_eq!(stats.total_entries, 1);
        assert_eq!(stats.expired_entries, 0);
    }

    #[test]
    fn test_clear_removes_everything() {
        let cache = ResponseCache::new();
        cache.set("/teams", &params(&[("id", "1")]), json!(1), Duration::from_secs(60));
        cache.clear();
        assert_eq!(cache.stats().total_entries, 0);
    }

    #[test]
    fn test_set_overwrites_existing_entry() {
        let cache = ResponseCache::new();
        let p = params(&[("id", "1")]);
        cache.set("/teams", &p, json!("old"), Duration::from_secs(60));
        cache.set("/teams", &p, json!("new"), Duration::from_secs(60));
        assert_eq!(cache.get("/teams", &p), Some(json!("new")));
        assert_eq!(cache.stats().total_entries, 1);
    }
}
