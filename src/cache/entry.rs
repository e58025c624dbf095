//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with TTL support.

use serde_json::Value;

// == Cache Entry ==
/// A cached query result with its expiry window.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// The stored value
    pub value: Value,
    /// Creation timestamp (Unix milliseconds)
    pub created_at: u64,
    /// Expiration timestamp (Unix milliseconds)
    pub expires_at: u64,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates a new entry that lives for `ttl_ms` from `now_ms`.
    pub fn new(value: Value, now_ms: u64, ttl_ms: u64) -> Self {
        Self {
            value,
            created_at: now_ms,
            expires_at: now_ms.saturating_add(ttl_ms),
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired at `now_ms`.
    ///
    /// An entry is expired once `now_ms >= expires_at`, so a zero TTL
    /// entry is never served.
    pub fn is_expired(&self, now_ms: u64) -> bool {
        now_ms >= self.expires_at
    }

    // == Time To Live ==
    /// Returns remaining TTL in milliseconds, zero once expired.
    pub fn ttl_remaining_ms(&self, now_ms: u64) -> u64 {
        self.expires_at.saturating_sub(now_ms)
    }

    /// Age of the entry in milliseconds.
    pub fn age_ms(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.created_at)
    }
}
