//! Clinic Cache - query cache and universal search for clinic administration data
//!
//! Keyed TTL cache with pattern invalidation, cache-aware fetch wrappers
//! with retry and staleness tracking, and a search aggregator that ranks
//! inventory, archive, activity log and navigation hits.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod query;
pub mod search;
pub mod tasks;

pub use api::AppState;
pub use config::Config;
pub use error::{CacheError, Result};
pub use tasks::spawn_cleanup_task;
