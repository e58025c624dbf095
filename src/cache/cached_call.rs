//! Cached-Call Wrapper
//!
//! Makes any async fetch cache-aware: derives the key, serves hits from the
//! [`CacheService`], and writes through on a successful miss. Failed fetches
//! are never cached and are not retried here.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};

use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

use crate::cache::{key::derive_key, CacheService};
use crate::error::{CacheError, Result};

type KeyLocks = Arc<Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>>;

// == Cached Call ==
/// Cache-aware executor for fetch functions.
///
/// With coalescing on, concurrent misses for one key wait for the first
/// caller's fetch and then read its result from the cache.
#[derive(Debug, Clone)]
pub struct CachedCall {
    cache: CacheService,
    coalesce: bool,
    key_locks: KeyLocks,
}

impl CachedCall {
    pub fn new(cache: CacheService) -> Self {
        Self {
            cache,
            coalesce: true,
            key_locks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Turns request coalescing on or off.
    pub fn with_coalescing(mut self, coalesce: bool) -> Self {
        self.coalesce = coalesce;
        self
    }

    pub fn cache(&self) -> &CacheService {
        &self.cache
    }

    // == Call ==
    /// Runs `fetch` unless `(namespace, operation, params)` has a live entry.
    pub async fn call<T, P, F, Fut>(
        &self,
        namespace: &str,
        operation: &str,
        fetch: F,
        params: Option<&P>,
        ttl_ms: u64,
    ) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        P: Serialize + ?Sized,
        F: FnOnce() -> Fut,
        Fut: Future<Output = anyhow::Result<T>>,
    {
        let key = derive_key(namespace, operation, params)?;
        self.call_with_key(&key, fetch, ttl_ms).await
    }

    // == Call With Key ==
    /// Same as [`CachedCall::call`] for a key the caller already derived.
    pub async fn call_with_key<T, F, Fut>(&self, key: &str, fetch: F, ttl_ms: u64) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = anyhow::Result<T>>,
    {
        if !self.coalesce {
            return self.lookup_or_fetch(key, fetch, ttl_ms).await;
        }

        // Locals drop in reverse order: the guard is released before the slot
        let slot = KeyLockSlot::acquire(&self.key_locks, key);
        let _guard = slot.lock.lock().await;
        // A waiter reads here what the leader stored, counting one hit
        self.lookup_or_fetch(key, fetch, ttl_ms).await
    }

    /// One counted lookup, then a fetch on miss.
    async fn lookup_or_fetch<T, F, Fut>(&self, key: &str, fetch: F, ttl_ms: u64) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = anyhow::Result<T>>,
    {
        if let Some(value) = self.cache.get(key).await {
            debug!(key, "cache hit");
            return Ok(serde_json::from_value(value)?);
        }
        debug!(key, "cache miss");
        self.fetch_and_store(key, fetch, ttl_ms).await
    }

    async fn fetch_and_store<T, F, Fut>(&self, key: &str, fetch: F, ttl_ms: u64) -> Result<T>
    where
        T: Serialize,
        F: FnOnce() -> Fut,
        Fut: Future<Output = anyhow::Result<T>>,
    {
        match fetch().await {
            Ok(value) => {
                let json = serde_json::to_value(&value)?;
                self.cache.set(key, json, ttl_ms).await;
                Ok(value)
            }
            Err(err) => {
                warn!(key, error = %err, "fetch failed, nothing cached");
                Err(CacheError::fetch(err))
            }
        }
    }
}

/// Per-key lock handle. Dropping it removes the map entry once no other
/// caller holds the lock, including when the owning future is cancelled.
struct KeyLockSlot {
    locks: KeyLocks,
    key: String,
    lock: Arc<tokio::sync::Mutex<()>>,
}

impl KeyLockSlot {
    fn acquire(locks: &KeyLocks, key: &str) -> Self {
        let lock = locks
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .entry(key.to_string())
            .or_default()
            .clone();
        Self {
            locks: locks.clone(),
            key: key.to_string(),
            lock,
        }
    }
}

impl Drop for KeyLockSlot {
    fn drop(&mut self) {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        // Map entry plus ours: nobody else is queued on this key
        let idle = locks
            .get(&self.key)
            .is_some_and(|current| Arc::ptr_eq(current, &self.lock) && Arc::strong_count(current) <= 2);
        if idle {
            locks.remove(&self.key);
        }
    }
}
