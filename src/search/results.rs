//! Search result types.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::search::records::{ActivityLog, ArchivedItem, InventoryItem};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchResultType {
    Inventory,
    User,
    Action,
    Archive,
    Log,
}

/// Record behind a hit, tagged by domain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "record", rename_all = "lowercase")]
pub enum SearchItemData {
    Inventory(InventoryItem),
    Archive(ArchivedItem),
    Log(ActivityLog),
}

/// Page a hit lands on in its origin listing, per page size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageLocation {
    pub default_page: usize,
    pub default_items_per_page: usize,
    pub pages_by_items_per_page: BTreeMap<usize, usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub id: String,
    #[serde(rename = "type")]
    pub result_type: SearchResultType,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, String>,
    pub icon: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub priority: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_data: Option<SearchItemData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_location: Option<PageLocation>,
}

/// One group of hits. `total` counts every match, `results` only the shown ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchCategory {
    pub name: String,
    pub results: Vec<SearchResult>,
    pub total: usize,
}

impl SearchCategory {
    /// Builds a category from hits already sorted by priority, keeping at
    /// most `max_results`.
    pub fn truncated(name: &str, mut results: Vec<SearchResult>, max_results: usize) -> Self {
        let total = results.len();
        results.truncate(max_results);
        Self {
            name: name.to_string(),
            results,
            total,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub query: String,
    pub total_results: usize,
    pub categories: Vec<SearchCategory>,
    pub suggestions: Vec<String>,
}
