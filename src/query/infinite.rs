//! Infinite-scroll query: pages accumulate into one growing list.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{de::DeserializeOwned, Serialize};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::cache::CacheService;
use crate::error::CacheError;
use crate::query::hook::QueryStatus;
use crate::query::options::{Page, PageFn, QueryOptions};
use crate::query::paginated::page_key;
use crate::query::retry::fetch_with_retry;
use crate::tasks::spawn_staleness_watch;

#[derive(Debug, Clone, PartialEq)]
pub struct InfiniteState<T> {
    pub status: QueryStatus,
    pub items: Vec<T>,
    pub total: Option<usize>,
    pub pages_loaded: usize,
    pub has_next_page: bool,
    pub error: Option<CacheError>,
    /// A loaded page no longer has a live cache entry
    pub is_stale: bool,
}

pub struct InfiniteQuery<T> {
    cache: CacheService,
    base_key: String,
    fetch: PageFn<T>,
    options: QueryOptions,
    page_size: usize,
    status: QueryStatus,
    items: Vec<T>,
    total: Option<usize>,
    pages_loaded: usize,
    error: Option<CacheError>,
    mounted: Arc<AtomicBool>,
    stale: Arc<AtomicBool>,
    /// One staleness watch per loaded page
    stale_watches: Vec<JoinHandle<()>>,
}

impl<T> InfiniteQuery<T>
where
    T: Clone + Serialize + DeserializeOwned + Send + Sync + 'static,
{
    pub fn new(
        cache: CacheService,
        base_key: impl Into<String>,
        fetch: PageFn<T>,
        page_size: usize,
        options: QueryOptions,
    ) -> Self {
        Self {
            cache,
            base_key: base_key.into(),
            fetch,
            options,
            page_size: page_size.max(1),
            status: QueryStatus::Idle,
            items: Vec::new(),
            total: None,
            pages_loaded: 0,
            error: None,
            mounted: Arc::new(AtomicBool::new(false)),
            stale: Arc::new(AtomicBool::new(false)),
            stale_watches: Vec::new(),
        }
    }

    /// Watches every page already loaded and loads the first page if none is.
    pub async fn mount(&mut self) -> InfiniteState<T> {
        self.mounted.store(true, Ordering::SeqCst);
        self.stop_stale_watches();
        for page in 1..=self.pages_loaded {
            self.watch_page(page);
        }

        if self.options.enabled && self.pages_loaded == 0 {
            self.fetch_next_page().await;
        }
        self.state()
    }

    /// Stops the staleness watches; later results are discarded.
    pub fn unmount(&mut self) {
        self.mounted.store(false, Ordering::SeqCst);
        self.stop_stale_watches();
    }

    pub fn has_next_page(&self) -> bool {
        match self.total {
            Some(total) => self.items.len() < total,
            None => true,
        }
    }

    // == Fetch Next Page ==
    /// Appends the next page. A no-op once every item is loaded.
    pub async fn fetch_next_page(&mut self) -> InfiniteState<T> {
        if !self.has_next_page() || !self.mounted.load(Ordering::SeqCst) {
            return self.state();
        }

        let page = self.pages_loaded + 1;
        let previous = self.status;
        self.status = QueryStatus::Loading;

        let outcome = self.load_page(page).await;
        if !self.mounted.load(Ordering::SeqCst) {
            debug!(key = %self.base_key, page, "discarding page after unmount");
            self.status = previous;
            return self.state();
        }

        match outcome {
            Ok(loaded) => {
                self.total = Some(loaded.total);
                // An empty page means the listing shrank under us
                if loaded.items.is_empty() {
                    self.total = Some(self.items.len());
                }
                self.items.extend(loaded.items);
                self.pages_loaded = page;
                self.status = QueryStatus::Success;
                self.error = None;
                self.watch_page(page);
            }
            Err(err) => {
                self.status = QueryStatus::Error;
                self.error = Some(err);
            }
        }
        self.state()
    }

    /// Drops every loaded page and starts over from page one.
    pub async fn refetch(&mut self) -> InfiniteState<T> {
        for page in 1..=self.pages_loaded {
            self.cache
                .delete(&page_key(&self.base_key, page, self.page_size))
                .await;
        }
        self.stop_stale_watches();
        self.stale.store(false, Ordering::SeqCst);
        self.items.clear();
        self.total = None;
        self.pages_loaded = 0;
        self.fetch_next_page().await
    }

    fn watch_page(&mut self, page: usize) {
        let stale = self.stale.clone();
        let handle = spawn_staleness_watch(
            self.cache.clone(),
            page_key(&self.base_key, page, self.page_size),
            self.options.stale_check_interval,
            self.mounted.clone(),
            move || stale.store(true, Ordering::SeqCst),
        );
        self.stale_watches.push(handle);
    }

    fn stop_stale_watches(&mut self) {
        for handle in self.stale_watches.drain(..) {
            handle.abort();
        }
    }

    async fn load_page(&self, page: usize) -> Result<Page<T>, CacheError> {
        let key = page_key(&self.base_key, page, self.page_size);

        if let Some(value) = self.cache.get(&key).await {
            match serde_json::from_value(value) {
                Ok(cached) => return Ok(cached),
                Err(err) => warn!(key = %key, error = %err, "cached page has wrong shape, refetching"),
            }
        }

        let fetch = self.fetch.clone();
        let page_size = self.page_size;
        let loaded = fetch_with_retry(
            &key,
            || fetch(page, page_size),
            self.options.retry_count,
            self.options.retry_delay,
            &self.mounted,
        )
        .await
        .map_err(CacheError::fetch)?;

        self.cache
            .set(key, serde_json::to_value(&loaded)?, self.options.ttl_ms())
            .await;
        Ok(loaded)
    }

    pub fn state(&self) -> InfiniteState<T> {
        InfiniteState {
            status: self.status,
            items: self.items.clone(),
            total: self.total,
            pages_loaded: self.pages_loaded,
            has_next_page: self.has_next_page(),
            error: self.error.clone(),
            is_stale: self.stale.load(Ordering::SeqCst),
        }
    }
}

impl<T> Drop for InfiniteQuery<T> {
    fn drop(&mut self) {
        self.mounted.store(false, Ordering::SeqCst);
        for handle in self.stale_watches.drain(..) {
            handle.abort();
        }
    }
}
