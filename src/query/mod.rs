//! Query Module
//!
//! Lifecycle-aware bindings over the cache: a single [`Query`] with retry
//! and staleness signaling, plus paginated and infinite-scroll variants.

mod hook;
mod infinite;
mod options;
mod paginated;
mod retry;

pub use hook::{Query, QueryState, QueryStatus};
pub use infinite::{InfiniteQuery, InfiniteState};
pub use options::{page_fn, query_fn, BoxFetch, Page, PageFn, QueryFn, QueryOptions};
pub use paginated::{page_key, PaginatedQuery, PaginatedState};
pub use retry::fetch_with_retry;
