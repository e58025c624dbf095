//! Retry with linear backoff.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tracing::warn;

/// Runs `fetch` up to `retry_count + 1` times, sleeping `retry_delay * n`
/// after the n-th failure.
///
/// Stops early once `active` is cleared; the last error is returned then.
pub async fn fetch_with_retry<T, F, Fut>(
    key: &str,
    mut fetch: F,
    retry_count: u32,
    retry_delay: Duration,
    active: &AtomicBool,
) -> anyhow::Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = anyhow::Result<T>>,
{
    let mut attempt: u32 = 1;
    loop {
        match fetch().await {
            Ok(value) => return Ok(value),
            Err(err) if attempt > retry_count || !active.load(Ordering::SeqCst) => return Err(err),
            Err(err) => {
                let delay = retry_delay.saturating_mul(attempt);
                warn!(key, attempt, ?delay, error = %err, "fetch failed, retrying");
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}
