//! Paginated query: one cached [`Query`] per `(page, page_size)`.

use serde::{de::DeserializeOwned, Serialize};

use crate::cache::CacheService;
use crate::error::CacheError;
use crate::query::hook::{Query, QueryState, QueryStatus};
use crate::query::options::{query_fn, Page, PageFn, QueryOptions};

/// Cache key of one page of a listing.
pub fn page_key(base_key: &str, page: usize, page_size: usize) -> String {
    format!("{base_key}_page{page}_size{page_size}")
}

// == Paginated State ==
#[derive(Debug, Clone, PartialEq)]
pub struct PaginatedState<T> {
    pub status: QueryStatus,
    pub items: Vec<T>,
    pub total: usize,
    pub page: usize,
    pub page_size: usize,
    pub total_pages: usize,
    pub has_next_page: bool,
    pub has_previous_page: bool,
    pub error: Option<CacheError>,
    pub is_stale: bool,
}

// == Paginated Query ==
pub struct PaginatedQuery<T> {
    cache: CacheService,
    base_key: String,
    fetch: PageFn<T>,
    options: QueryOptions,
    page: usize,
    page_size: usize,
    current: Query<Page<T>>,
}

impl<T> PaginatedQuery<T>
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
        let base_key = base_key.into();
        let page_size = page_size.max(1);
        let current = Self::page_query(&cache, &base_key, &fetch, &options, 1, page_size);
        Self {
            cache,
            base_key,
            fetch,
            options,
            page: 1,
            page_size,
            current,
        }
    }

    fn page_query(
        cache: &CacheService,
        base_key: &str,
        fetch: &PageFn<T>,
        options: &QueryOptions,
        page: usize,
        page_size: usize,
    ) -> Query<Page<T>> {
        let fetch = fetch.clone();
        Query::new(
            cache.clone(),
            page_key(base_key, page, page_size),
            query_fn(move || fetch(page, page_size)),
            options.clone(),
        )
    }

    pub async fn mount(&self) -> PaginatedState<T> {
        self.current.mount().await;
        self.state()
    }

    pub fn unmount(&self) {
        self.current.unmount();
    }

    /// Moves to `page` and loads it. The page is clamped to at least 1 and,
    /// once a total is known, to the last page.
    pub async fn set_page(&mut self, page: usize) -> PaginatedState<T> {
        let last_page = self.state().total_pages;
        let page = if last_page > 0 {
            page.clamp(1, last_page)
        } else {
            page.max(1)
        };
        self.switch_to(page, self.page_size).await
    }

    /// Changes the page size and returns to the first page.
    pub async fn set_page_size(&mut self, page_size: usize) -> PaginatedState<T> {
        self.switch_to(1, page_size.max(1)).await
    }

    /// Advances one page when there is one.
    pub async fn next_page(&mut self) -> PaginatedState<T> {
        if self.state().has_next_page {
            self.switch_to(self.page + 1, self.page_size).await
        } else {
            self.state()
        }
    }

    pub async fn previous_page(&mut self) -> PaginatedState<T> {
        if self.page > 1 {
            self.switch_to(self.page - 1, self.page_size).await
        } else {
            self.state()
        }
    }

    pub async fn refetch(&self) -> PaginatedState<T> {
        self.current.refetch().await;
        self.state()
    }

    async fn switch_to(&mut self, page: usize, page_size: usize) -> PaginatedState<T> {
        let mounted = self.current.is_mounted();
        self.current.unmount();

        self.page = page;
        self.page_size = page_size;
        self.current = Self::page_query(
            &self.cache,
            &self.base_key,
            &self.fetch,
            &self.options,
            page,
            page_size,
        );

        if mounted {
            self.current.mount().await;
        }
        self.state()
    }

    pub fn state(&self) -> PaginatedState<T> {
        let QueryState {
            status,
            data,
            error,
            is_stale,
        } = self.current.state();
        let (items, total) = data.map(|p| (p.items, p.total)).unwrap_or_default();
        let total_pages = total.div_ceil(self.page_size);

        PaginatedState {
            status,
            items,
            total,
            page: self.page,
            page_size: self.page_size,
            total_pages,
            has_next_page: self.page < total_pages,
            has_previous_page: self.page > 1,
            error,
            is_stale,
        }
    }
}
