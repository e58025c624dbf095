//! Cache Store Module
//!
//! TTL key/value storage with lazy expiry and substring-pattern invalidation.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use crate::cache::{CacheEntry, CacheStats, Clock};

// == Cache Store ==
/// Holds the most recent result of each distinct query until its TTL runs out.
///
/// Expiry is lazy: an expired entry is evicted when it is read, or by
/// [`CacheStore::cleanup_expired`] when a sweep task is running.
#[derive(Debug)]
pub struct CacheStore {
    entries: HashMap<String, CacheEntry>,
    stats: CacheStats,
    clock: Arc<dyn Clock>,
}

impl CacheStore {
    // == Constructor ==
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: HashMap::new(),
            stats: CacheStats::new(),
            clock,
        }
    }

    // == Get ==
    /// Returns the stored value if its entry is still live.
    ///
    /// An expired entry is removed and reported as absent.
    pub fn get(&mut self, key: &str) -> Option<Value> {
        let now = self.clock.now_ms();

        match self.entries.get(key) {
            Some(entry) if !entry.is_expired(now) => {
                let value = entry.value.clone();
                self.stats.record_hit();
                Some(value)
            }
            Some(_) => {
                self.entries.remove(key);
                self.stats.record_expirations(1);
                self.stats.record_miss();
                None
            }
            None => {
                self.stats.record_miss();
                None
            }
        }
    }

    // == Peek ==
    /// Reads a live value without touching counters or evicting.
    pub fn peek(&self, key: &str) -> Option<Value> {
        let now = self.clock.now_ms();
        self.entries
            .get(key)
            .filter(|entry| !entry.is_expired(now))
            .map(|entry| entry.value.clone())
    }

    // == Contains Live ==
    /// Checks for a live entry without touching hit/miss counters.
    pub fn contains_live(&self, key: &str) -> bool {
        let now = self.clock.now_ms();
        self.entries
            .get(key)
            .map(|entry| !entry.is_expired(now))
            .unwrap_or(false)
    }

    // == Set ==
    /// Stores `value` under `key` for `ttl_ms`, replacing any previous entry.
    pub fn set(&mut self, key: String, value: Value, ttl_ms: u64) {
        let entry = CacheEntry::new(value, self.clock.now_ms(), ttl_ms);
        self.entries.insert(key, entry);
    }

    // == Delete ==
    /// Removes a single key. Returns whether an entry was present.
    pub fn delete(&mut self, key: &str) -> bool {
        let removed = self.entries.remove(key).is_some();
        if removed {
            self.stats.record_invalidations(1);
        }
        removed
    }

    // == Clear By Pattern ==
    /// Evicts every key containing `pattern` as a substring.
    ///
    /// An empty pattern matches every key. Returns the number of entries removed.
    pub fn clear_by_pattern(&mut self, pattern: &str) -> usize {
        let before = self.entries.len();
        self.entries.retain(|key, _| !key.contains(pattern));
        let removed = before - self.entries.len();
        self.stats.record_invalidations(removed);
        removed
    }

    // == Clear All ==
    /// Evicts everything. Returns the number of entries removed.
    pub fn clear_all(&mut self) -> usize {
        let removed = self.entries.len();
        self.entries.clear();
        self.stats.record_invalidations(removed);
        removed
    }

    // == Cleanup Expired ==
    /// Removes all expired entries and returns how many were dropped.
    pub fn cleanup_expired(&mut self) -> usize {
        let now = self.clock.now_ms();
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired(now));
        let removed = before - self.entries.len();
        self.stats.record_expirations(removed);
        removed
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_total_entries(self.entries.len());
        stats
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ManualClock;
    use serde_json::json;

    fn store_with_clock() -> (CacheStore, ManualClock) {
        let clock = ManualClock::new(10_000);
        (CacheStore::new(Arc::new(clock.clone())), clock)
    }

    #[test]
    fn test_set_and_get() {
        let (mut store, _) = store_with_clock();

        store.set("k".to_string(), json!([1, 2, 3]), 1_000);

        assert_eq!(store.get("k"), Some(json!([1, 2, 3])));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_get_missing_is_absent() {
        let (mut store, _) = store_with_clock();
        assert_eq!(store.get("nope"), None);
        assert_eq!(store.stats().misses, 1);
    }

    #[test]
    fn test_ttl_expiry() {
        let (mut store, clock) = store_with_clock();
        store.set("k".to_string(), json!("v"), 1_000);

        clock.advance(999);
        assert_eq!(store.get("k"), Some(json!("v")));

        clock.advance(1);
        assert_eq!(store.get("k"), None);
        // Expired entry is evicted on read
        assert!(store.is_empty());
        assert_eq!(store.stats().expirations, 1);
    }

    #[test]
    fn test_overwrite_resets_ttl() {
        let (mut store, clock) = store_with_clock();
        store.set("k".to_string(), json!(1), 1_000);
        clock.advance(800);
        store.set("k".to_string(), json!(2), 1_000);
        clock.advance(800);

        assert_eq!(store.get("k"), Some(json!(2)));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_clear_by_pattern_substring() {
        let (mut store, _) = store_with_clock();
        store.set("inventory_getAllItems_{}".to_string(), json!([]), 60_000);
        store.set("inventory_getItem_{\"id\":\"a\"}".to_string(), json!({}), 60_000);
        store.set("logs_getAll_{}".to_string(), json!([]), 60_000);
        store.set("search_universal_\"inventory gauze\"".to_string(), json!({}), 60_000);

        let removed = store.clear_by_pattern("inventory");

        assert_eq!(removed, 3);
        assert_eq!(store.get("inventory_getAllItems_{}"), None);
        assert!(store.contains_live("logs_getAll_{}"));
    }

    #[test]
    fn test_clear_by_pattern_no_match_is_noop() {
        let (mut store, _) = store_with_clock();
        store.set("logs_getAll_{}".to_string(), json!([]), 60_000);

        assert_eq!(store.clear_by_pattern("inventory"), 0);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_clear_all() {
        let (mut store, _) = store_with_clock();
        store.set("a".to_string(), json!(1), 60_000);
        store.set("b".to_string(), json!(2), 60_000);

        assert_eq!(store.clear_all(), 2);
        assert!(store.is_empty());
        assert_eq!(store.stats().invalidations, 2);
    }

    #[test]
    fn test_delete() {
        let (mut store, _) = store_with_clock();
        store.set("a".to_string(), json!(1), 60_000);

        assert!(store.delete("a"));
        assert!(!store.delete("a"));
        assert_eq!(store.get("a"), None);
    }

    #[test]
    fn test_contains_live_does_not_count() {
        let (mut store, clock) = store_with_clock();
        store.set("a".to_string(), json!(1), 100);

        assert!(store.contains_live("a"));
        clock.advance(100);
        assert!(!store.contains_live("a"));

        let stats = store.stats();
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.misses, 0);
    }

    #[test]
    fn test_peek_skips_expired_without_evicting() {
        let (mut store, clock) = store_with_clock();
        store.set("a".to_string(), json!(1), 100);

        assert_eq!(store.peek("a"), Some(json!(1)));
        clock.advance(100);
        assert_eq!(store.peek("a"), None);
        assert_eq!(store.len(), 1);
        assert_eq!(store.stats().hits, 0);
    }

    #[test]
    fn test_cleanup_expired() {
        let (mut store, clock) = store_with_clock();
        store.set("short".to_string(), json!(1), 100);
        store.set("long".to_string(), json!(2), 10_000);

        clock.advance(500);

        assert_eq!(store.cleanup_expired(), 1);
        assert_eq!(store.len(), 1);
        assert!(store.contains_live("long"));
    }

    #[test]
    fn test_stats() {
        let (mut store, _) = store_with_clock();
        store.set("k".to_string(), json!(1), 1_000);
        store.get("k");
        store.get("missing");

        let stats = store.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.total_entries, 1);
    }
}
