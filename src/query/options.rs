//! Query options and fetch-function types.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;

/// Boxed future returned by query fetch functions.
pub type BoxFetch<T> = Pin<Box<dyn Future<Output = anyhow::Result<T>> + Send>>;

/// Re-runnable fetch function for a single query.
pub type QueryFn<T> = Arc<dyn Fn() -> BoxFetch<T> + Send + Sync>;

/// Re-runnable fetch function for one page: `(page, page_size)`, pages start at 1.
pub type PageFn<T> = Arc<dyn Fn(usize, usize) -> BoxFetch<Page<T>> + Send + Sync>;

/// Wraps a closure returning a future into a [`QueryFn`].
pub fn query_fn<T, F, Fut>(f: F) -> QueryFn<T>
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<T>> + Send + 'static,
{
    Arc::new(move || Box::pin(f()))
}

/// Wraps a closure returning a future into a [`PageFn`].
pub fn page_fn<T, F, Fut>(f: F) -> PageFn<T>
where
    F: Fn(usize, usize) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<Page<T>>> + Send + 'static,
{
    Arc::new(move |page, page_size| Box::pin(f(page, page_size)))
}

// == Page ==
/// One page of a listing plus the size of the whole listing.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: usize,
}

// == Query Options ==
#[derive(Debug, Clone)]
pub struct QueryOptions {
    /// Disabled queries stay idle until enabled
    pub enabled: bool,
    /// How long a fetched result stays in the cache
    pub ttl: Duration,
    /// Extra attempts after the first failure
    pub retry_count: u32,
    /// Base delay; attempt `n` waits `retry_delay * n`
    pub retry_delay: Duration,
    /// Period of the staleness check while mounted
    pub stale_check_interval: Duration,
}

impl QueryOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            enabled: true,
            ttl: Duration::from_millis(config.default_ttl_ms),
            retry_count: config.retry_count,
            retry_delay: Duration::from_millis(config.retry_delay_ms),
            stale_check_interval: Duration::from_secs(config.stale_check_interval),
        }
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn retry(mut self, count: u32, delay: Duration) -> Self {
        self.retry_count = count;
        self.retry_delay = delay;
        self
    }

    pub fn stale_check_interval(mut self, interval: Duration) -> Self {
        self.stale_check_interval = interval;
        self
    }

    pub(crate) fn ttl_ms(&self) -> u64 {
        self.ttl.as_millis().min(u64::MAX as u128) as u64
    }
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_follow_config() {
        let options = QueryOptions::default();
        assert!(options.enabled);
        assert_eq!(options.ttl, Duration::from_secs(300));
        assert_eq!(options.retry_count, 3);
        assert_eq!(options.retry_delay, Duration::from_secs(1));
        assert_eq!(options.stale_check_interval, Duration::from_secs(30));
    }

    #[test]
    fn test_builders() {
        let options = QueryOptions::default()
            .enabled(false)
            .ttl(Duration::from_millis(250))
            .retry(1, Duration::from_millis(10));

        assert!(!options.enabled);
        assert_eq!(options.ttl_ms(), 250);
        assert_eq!(options.retry_count, 1);
    }
}
