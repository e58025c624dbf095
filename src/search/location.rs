//! Page-location reconstruction.
//!
//! Rebuilds the ordering and filter each listing view uses, finds a record's
//! index in it, and converts that index to a page number per page size.

use std::cmp::Ordering;

use crate::search::records::{ActivityLog, ArchivedItem, InventoryItem};
use crate::search::results::PageLocation;

/// Page sizes offered by the listing views.
pub const PAGE_SIZE_OPTIONS: [usize; 4] = [10, 25, 50, 100];

/// Page size a listing opens with.
pub const DEFAULT_ITEMS_PER_PAGE: usize = 25;

/// Converts a 0-based index into its page for every page size option.
pub fn page_location(index: usize) -> PageLocation {
    let pages_by_items_per_page = PAGE_SIZE_OPTIONS
        .iter()
        .map(|&size| (size, index / size + 1))
        .collect();

    PageLocation {
        default_page: index / DEFAULT_ITEMS_PER_PAGE + 1,
        default_items_per_page: DEFAULT_ITEMS_PER_PAGE,
        pages_by_items_per_page,
    }
}

/// Position of `target` in `rows` after filtering and sorting.
fn locate<T, F, C, M>(rows: &[T], keep: F, order: C, is_target: M) -> Option<usize>
where
    F: Fn(&T) -> bool,
    C: Fn(&T, &T) -> Ordering,
    M: Fn(&T) -> bool,
{
    let mut view: Vec<&T> = rows.iter().filter(|row| keep(row)).collect();
    view.sort_by(|a, b| order(a, b));
    view.iter().position(|row| is_target(row))
}

// == Inventory ==
/// Inventory view: same department and classification, archived items
/// hidden, name ascending (case-insensitive, id breaks ties).
pub fn calculate_item_page(item: &InventoryItem, items: &[InventoryItem]) -> Option<PageLocation> {
    locate(
        items,
        |row| {
            !row.is_archived
                && row.department == item.department
                && row.classification == item.classification
        },
        |a, b| {
            a.name
                .to_lowercase()
                .cmp(&b.name.to_lowercase())
                .then_with(|| a.id.cmp(&b.id))
        },
        |row| row.id == item.id,
    )
    .map(page_location)
}

// == Archives ==
/// Archive view: most recently archived first.
pub fn calculate_archive_page(item: &ArchivedItem, archives: &[ArchivedItem]) -> Option<PageLocation> {
    locate(
        archives,
        |_| true,
        |a, b| b.archived_at.cmp(&a.archived_at).then_with(|| a.id.cmp(&b.id)),
        |row| row.id == item.id,
    )
    .map(page_location)
}

// == Logs ==
/// Activity log view: newest first.
pub fn calculate_log_page(log: &ActivityLog, logs: &[ActivityLog]) -> Option<PageLocation> {
    locate(
        logs,
        |_| true,
        |a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)),
        |row| row.id == log.id,
    )
    .map(page_location)
}
