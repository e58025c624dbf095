//! Staleness Watch Task
//!
//! Periodically checks whether a query's cache entry is still live and
//! reports when it is not. Never refetches on its own.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::debug;

use crate::cache::CacheService;

/// Shortest poll period; a zero interval is raised to this.
const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Spawns a task that calls `on_stale` every `interval` while `key` has no
/// live entry. The task ends once `mounted` is cleared.
pub fn spawn_staleness_watch<F>(
    cache: CacheService,
    key: String,
    interval: Duration,
    mounted: Arc<AtomicBool>,
    on_stale: F,
) -> JoinHandle<()>
where
    F: Fn() + Send + 'static,
{
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval.max(MIN_INTERVAL));
        // First tick completes immediately
        ticker.tick().await;

        loop {
            ticker.tick().await;

            if !mounted.load(Ordering::SeqCst) {
                debug!(key = %key, "staleness watch stopped");
                break;
            }

            if !cache.contains_live(&key).await {
                on_stale();
            }
        }
    })
}
