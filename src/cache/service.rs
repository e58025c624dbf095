//! Cache Service Module
//!
//! Cloneable handle around a shared [`CacheStore`]. One service is created
//! at startup and passed to every consumer; clones see the same entries.

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::cache::{CacheStats, CacheStore, Clock, SystemClock};

// == Cache Service ==
#[derive(Debug, Clone)]
pub struct CacheService {
    store: Arc<RwLock<CacheStore>>,
    clock: Arc<dyn Clock>,
}

impl CacheService {
    /// Creates a service backed by the system clock.
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Creates a service backed by the given clock.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            store: Arc::new(RwLock::new(CacheStore::new(clock.clone()))),
            clock,
        }
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Shared store, for background tasks that sweep it directly.
    pub fn store(&self) -> Arc<RwLock<CacheStore>> {
        self.store.clone()
    }

    pub async fn get(&self, key: &str) -> Option<Value> {
        // Write lock: expired entries are evicted on read
        self.store.write().await.get(key)
    }

    /// Reads a live value without counting a hit or miss.
    pub async fn peek(&self, key: &str) -> Option<Value> {
        self.store.read().await.peek(key)
    }

    pub async fn contains_live(&self, key: &str) -> bool {
        self.store.read().await.contains_live(key)
    }

    pub async fn set(&self, key: impl Into<String>, value: Value, ttl_ms: u64) {
        let key = key.into();
        debug!(key = %key, ttl_ms, "cache set");
        self.store.write().await.set(key, value, ttl_ms);
    }

    pub async fn delete(&self, key: &str) -> bool {
        self.store.write().await.delete(key)
    }

    /// Evicts every key containing `pattern`. Returns the number removed.
    pub async fn clear_by_pattern(&self, pattern: &str) -> usize {
        let removed = self.store.write().await.clear_by_pattern(pattern);
        debug!(pattern, removed, "cache invalidated by pattern");
        removed
    }

    /// Evicts every entry, e.g. on logout.
    pub async fn clear_all(&self) -> usize {
        let removed = self.store.write().await.clear_all();
        info!(removed, "cache cleared");
        removed
    }

    pub async fn stats(&self) -> CacheStats {
        self.store.read().await.stats()
    }
}

impl Default for CacheService {
    fn default() -> Self {
        Self::new()
    }
}
