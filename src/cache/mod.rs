//! Cache Module
//!
//! In-memory TTL cache with pattern invalidation, canonical key derivation
//! and a cache-aware wrapper for async fetch functions.

pub mod cached_call;
mod clock;
mod entry;
pub mod key;
mod service;
mod stats;
mod store;

#[cfg(test)]
mod property_tests;

// Re-export public types
pub use cached_call::CachedCall;
pub use clock::{Clock, ManualClock, SystemClock};
pub use entry::CacheEntry;
pub use key::derive_key;
pub use service::CacheService;
pub use stats::CacheStats;
pub use store::CacheStore;
