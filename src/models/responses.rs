//! Response DTOs for the HTTP API

use serde::{Deserialize, Serialize};

use crate::cache::CacheStats;

/// Response body for `GET /cache/stats`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsResponse {
    pub hits: u64,
    pub misses: u64,
    pub invalidations: u64,
    pub expirations: u64,
    /// Entries currently held, expired ones included until swept
    pub total_entries: usize,
    /// hits / (hits + misses)
    pub hit_rate: f64,
}

impl From<CacheStats> for StatsResponse {
    fn from(stats: CacheStats) -> Self {
        Self {
            hit_rate: stats.hit_rate(),
            hits: stats.hits,
            misses: stats.misses,
            invalidations: stats.invalidations,
            expirations: stats.expirations,
            total_entries: stats.total_entries,
        }
    }
}

/// Response body for `DELETE /cache` and `DELETE /cache/pattern/:pattern`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvalidateResponse {
    pub message: String,
    /// Number of entries removed
    pub removed: usize,
}

impl InvalidateResponse {
    pub fn all(removed: usize) -> Self {
        Self {
            message: "Cache cleared".to_string(),
            removed,
        }
    }

    pub fn pattern(pattern: &str, removed: usize) -> Self {
        Self {
            message: format!("Invalidated keys matching '{}'", pattern),
            removed,
        }
    }
}

/// Response body for `PUT /inventory`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpsertResponse {
    pub message: String,
    pub id: String,
    /// True when the item did not exist before
    pub created: bool,
    /// Cache entries evicted by the write
    pub invalidated: usize,
}

impl UpsertResponse {
    pub fn new(id: impl Into<String>, created: bool, invalidated: usize) -> Self {
        let id = id.into();
        let verb = if created { "created" } else { "updated" };
        Self {
            message: format!("Item '{}' {}", id, verb),
            id,
            created,
            invalidated,
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}
