//! Cached query bound to a consumer's lifecycle.
//!
//! A [`Query`] walks `Idle -> Loading -> Success | Error` and publishes each
//! state through a watch channel. Results that arrive after
//! [`Query::unmount`] are dropped instead of applied.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use serde::{de::DeserializeOwned, Serialize};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::cache::CacheService;
use crate::error::CacheError;
use crate::query::options::{QueryFn, QueryOptions};
use crate::query::retry::fetch_with_retry;
use crate::tasks::spawn_staleness_watch;

// == Query Status ==
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryStatus {
    Idle,
    Loading,
    Success,
    Error,
}

// == Query State ==
/// Snapshot handed to consumers.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryState<T> {
    pub status: QueryStatus,
    pub data: Option<T>,
    pub error: Option<CacheError>,
    /// The cache no longer holds a live entry for the displayed data
    pub is_stale: bool,
}

impl<T> QueryState<T> {
    pub fn loading(&self) -> bool {
        self.status == QueryStatus::Loading
    }
}

impl<T> Default for QueryState<T> {
    fn default() -> Self {
        Self {
            status: QueryStatus::Idle,
            data: None,
            error: None,
            is_stale: false,
        }
    }
}

// == Query ==
pub struct Query<T> {
    key: String,
    fetch: QueryFn<T>,
    options: QueryOptions,
    cache: CacheService,
    state: Arc<watch::Sender<QueryState<T>>>,
    mounted: Arc<AtomicBool>,
    stale_watch: Mutex<Option<JoinHandle<()>>>,
}

impl<T> Query<T>
where
    T: Clone + Serialize + DeserializeOwned + Send + Sync + 'static,
{
    pub fn new(
        cache: CacheService,
        key: impl Into<String>,
        fetch: QueryFn<T>,
        options: QueryOptions,
    ) -> Self {
        let (state, _) = watch::channel(QueryState::default());
        Self {
            key: key.into(),
            fetch,
            options,
            cache,
            state: Arc::new(state),
            mounted: Arc::new(AtomicBool::new(false)),
            stale_watch: Mutex::new(None),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn state(&self) -> QueryState<T> {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<QueryState<T>> {
        self.state.subscribe()
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted.load(Ordering::SeqCst)
    }

    // == Mount ==
    /// Starts the staleness watch and, when enabled, loads the query.
    pub async fn mount(&self) -> QueryState<T> {
        self.mounted.store(true, Ordering::SeqCst);
        self.start_stale_watch();

        if self.options.enabled {
            self.load().await;
        }
        self.state()
    }

    /// Enables or disables the query. Enabling a mounted idle query loads it.
    pub async fn set_enabled(&mut self, enabled: bool) -> QueryState<T> {
        let was_enabled = self.options.enabled;
        self.options.enabled = enabled;

        if enabled && !was_enabled && self.is_mounted() {
            self.load().await;
        }
        self.state()
    }

    // == Unmount ==
    /// Stops the staleness watch; later results are discarded.
    pub fn unmount(&self) {
        self.mounted.store(false, Ordering::SeqCst);
        if let Some(handle) = self.take_stale_watch() {
            handle.abort();
        }
    }

    // == Refetch ==
    /// Evicts this query's entry and fetches again, ignoring the cache.
    pub async fn refetch(&self) -> QueryState<T> {
        self.cache.delete(&self.key).await;
        self.fetch_and_apply().await;
        self.state()
    }

    async fn load(&self) {
        if let Some(value) = self.cache.get(&self.key).await {
            match serde_json::from_value::<T>(value) {
                Ok(data) => {
                    debug!(key = %self.key, "query served from cache");
                    self.apply(|state| {
                        state.status = QueryStatus::Success;
                        state.data = Some(data);
                        state.error = None;
                        state.is_stale = false;
                    });
                    return;
                }
                Err(err) => {
                    warn!(key = %self.key, error = %err, "cached value has wrong shape, refetching");
                }
            }
        }

        self.fetch_and_apply().await;
    }

    async fn fetch_and_apply(&self) {
        self.apply(|state| {
            state.status = QueryStatus::Loading;
            state.error = None;
        });

        let fetch = self.fetch.clone();
        let outcome = fetch_with_retry(
            &self.key,
            || fetch(),
            self.options.retry_count,
            self.options.retry_delay,
            &self.mounted,
        )
        .await
        .map_err(CacheError::fetch);

        let outcome = match outcome {
            Ok(data) => match serde_json::to_value(&data) {
                Ok(json) => {
                    self.cache.set(self.key.clone(), json, self.options.ttl_ms()).await;
                    Ok(data)
                }
                Err(err) => Err(CacheError::from(err)),
            },
            Err(err) => Err(err),
        };

        match outcome {
            Ok(data) => self.apply(|state| {
                state.status = QueryStatus::Success;
                state.data = Some(data);
                state.error = None;
                state.is_stale = false;
            }),
            Err(err) => {
                warn!(key = %self.key, error = %err, "query failed");
                self.apply(|state| {
                    state.status = QueryStatus::Error;
                    state.error = Some(err);
                })
            }
        }
    }

    /// Applies a state change unless the query was unmounted.
    fn apply(&self, change: impl FnOnce(&mut QueryState<T>)) {
        if !self.is_mounted() {
            debug!(key = %self.key, "discarding update after unmount");
            return;
        }
        self.state.send_modify(change);
    }

    fn start_stale_watch(&self) {
        let state = self.state.clone();
        let handle = spawn_staleness_watch(
            self.cache.clone(),
            self.key.clone(),
            self.options.stale_check_interval,
            self.mounted.clone(),
            move || {
                state.send_if_modified(|s| {
                    let mark = s.data.is_some() && !s.is_stale;
                    if mark {
                        s.is_stale = true;
                    }
                    mark
                });
            },
        );

        if let Some(previous) = self.replace_stale_watch(handle) {
            previous.abort();
        }
    }

    fn take_stale_watch(&self) -> Option<JoinHandle<()>> {
        self.stale_watch
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take()
    }

    fn replace_stale_watch(&self, handle: JoinHandle<()>) -> Option<JoinHandle<()>> {
        self.stale_watch
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .replace(handle)
    }
}

impl<T> Drop for Query<T> {
    fn drop(&mut self) {
        self.mounted.store(false, Ordering::SeqCst);
        if let Some(handle) = self
            .stale_watch
            .get_mut()
            .unwrap_or_else(|e| e.into_inner())
            .take()
        {
            handle.abort();
        }
    }
}
