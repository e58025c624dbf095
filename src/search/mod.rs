//! Universal search over clinic records.

mod actions;
mod aggregator;
mod location;
mod records;
mod results;
mod source;

pub use actions::{matching_actions, suggestions, QuickAction, QUICK_ACTIONS, SEARCH_SHORTCUTS};
pub use aggregator::{
    search_cache_key, SearchSettings, UniversalSearch, CATEGORY_ACTIONS, CATEGORY_ARCHIVES,
    CATEGORY_INVENTORY, CATEGORY_LOGS, NS_ARCHIVES, NS_INVENTORY, NS_LOGS, NS_SEARCH,
};
pub use location::{
    calculate_archive_page, calculate_item_page, calculate_log_page, page_location,
    DEFAULT_ITEMS_PER_PAGE, PAGE_SIZE_OPTIONS,
};
pub use records::{ActivityLog, ArchivedItem, InventoryItem};
pub use results::{
    PageLocation, SearchCategory, SearchItemData, SearchResponse, SearchResult, SearchResultType,
};
pub use source::{ClinicDataSource, InMemoryDataSource, SeedData};
