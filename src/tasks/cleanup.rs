//! Expiry Sweep Task
//!
//! Expired entries are already invisible to readers; this task reclaims
//! the memory of entries nobody reads again.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::CacheService;

/// Spawns a background task that removes expired entries every
/// `cleanup_interval_secs` seconds.
///
/// The returned handle is aborted during graceful shutdown.
pub fn spawn_cleanup_task(cache: CacheService, cleanup_interval_secs: u64) -> JoinHandle<()> {
    let interval = Duration::from_secs(cleanup_interval_secs.max(1));
    let store = cache.store();

    tokio::spawn(async move {
        info!(
            "Starting expiry sweep with interval of {} seconds",
            interval.as_secs()
        );

        loop {
            tokio::time::sleep(interval).await;

            let removed = {
                let mut store_guard = store.write().await;
                store_guard.cleanup_expired()
            };

            if removed > 0 {
                info!("Expiry sweep: removed {} expired entries", removed);
            } else {
                debug!("Expiry sweep: no expired entries found");
            }
        }
    })
}
