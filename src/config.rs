//! Configuration Module
//!
//! Loads service settings from environment variables.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

/// Service configuration. Every value has a default and an environment
/// variable override.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    /// TTL for cached query results, in milliseconds
    pub default_ttl_ms: u64,
    /// TTL for cached search responses, in milliseconds
    pub search_ttl_ms: u64,
    /// Expired-entry sweep interval in seconds
    pub cleanup_interval: u64,
    pub min_query_length: usize,
    pub max_results_per_category: usize,
    /// Retries after the first failed fetch
    pub retry_count: u32,
    /// Base retry delay in milliseconds, multiplied by the attempt number
    pub retry_delay_ms: u64,
    /// Staleness poll interval in seconds
    pub stale_check_interval: u64,
    /// Share one in-flight fetch between concurrent misses of a key
    pub coalesce_misses: bool,
    /// Optional JSON dataset loaded at startup
    pub seed_file: Option<PathBuf>,
}

impl Config {
    /// Creates a Config from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` (default: 3000)
    /// - `DEFAULT_TTL_MS` (default: 300000)
    /// - `SEARCH_TTL_MS` (default: 300000)
    /// - `CLEANUP_INTERVAL` seconds (default: 30)
    /// - `MIN_QUERY_LENGTH` (default: 2)
    /// - `MAX_RESULTS_PER_CATEGORY` (default: 5)
    /// - `RETRY_COUNT` (default: 3)
    /// - `RETRY_DELAY_MS` (default: 1000)
    /// - `STALE_CHECK_INTERVAL` seconds (default: 30)
    /// - `COALESCE_MISSES` (default: true)
    /// - `SEED_FILE` (default: unset)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            server_port: env_or("SERVER_PORT", defaults.server_port),
            default_ttl_ms: env_or("DEFAULT_TTL_MS", defaults.default_ttl_ms),
            search_ttl_ms: env_or("SEARCH_TTL_MS", defaults.search_ttl_ms),
            cleanup_interval: env_or("CLEANUP_INTERVAL", defaults.cleanup_interval),
            min_query_length: env_or("MIN_QUERY_LENGTH", defaults.min_query_length),
            max_results_per_category: env_or(
                "MAX_RESULTS_PER_CATEGORY",
                defaults.max_results_per_category,
            ),
            retry_count: env_or("RETRY_COUNT", defaults.retry_count),
            retry_delay_ms: env_or("RETRY_DELAY_MS", defaults.retry_delay_ms),
            stale_check_interval: env_or("STALE_CHECK_INTERVAL", defaults.stale_check_interval),
            coalesce_misses: env_or("COALESCE_MISSES", defaults.coalesce_misses),
            seed_file: env::var("SEED_FILE")
                .ok()
                .filter(|v| !v.is_empty())
                .map(PathBuf::from),
        }
    }
}

/// Parsed value of `name`, or `default` when unset or unparsable.
fn env_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 3000,
            default_ttl_ms: 5 * 60 * 1000,
            search_ttl_ms: 5 * 60 * 1000,
            cleanup_interval: 30,
            min_query_length: 2,
            max_results_per_category: 5,
            retry_count: 3,
            retry_delay_ms: 1000,
            stale_check_interval: 30,
            coalesce_misses: true,
            seed_file: None,
        }
    }
}
