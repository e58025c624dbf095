//! Universal search across inventory, archives, activity logs and quick
//! actions.
//!
//! Each category reads its records through the shared [`CachedCall`], so a
//! search reuses whatever listing data is already cached. A failing category
//! is dropped from the response instead of failing the whole search.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};
use url::form_urlencoded;

use crate::cache::key::derive_key;
use crate::cache::{CacheService, CachedCall};
use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::search::actions::{matching_actions, suggestions};
use crate::search::location::{calculate_archive_page, calculate_item_page, calculate_log_page};
use crate::search::records::{ActivityLog, ArchivedItem, InventoryItem};
use crate::search::results::{
    PageLocation, SearchCategory, SearchItemData, SearchResponse, SearchResult, SearchResultType,
};
use crate::search::source::ClinicDataSource;

pub const CATEGORY_ACTIONS: &str = "Quick Actions";
pub const CATEGORY_INVENTORY: &str = "Inventory";
pub const CATEGORY_ARCHIVES: &str = "Archives";
pub const CATEGORY_LOGS: &str = "Activity Logs";

pub const PRIORITY_ACTION: u32 = 100;
pub const PRIORITY_INVENTORY: u32 = 80;
pub const PRIORITY_ARCHIVE: u32 = 60;
pub const PRIORITY_LOG: u32 = 40;

const EXACT_MATCH_BONUS: u32 = 20;
const PREFIX_MATCH_BONUS: u32 = 10;

pub const NS_INVENTORY: &str = "inventory";
pub const NS_ARCHIVES: &str = "archives";
pub const NS_LOGS: &str = "logs";
pub const NS_SEARCH: &str = "search";

// == Search Settings ==
#[derive(Debug, Clone)]
pub struct SearchSettings {
    /// Shorter queries only see quick actions
    pub min_query_length: usize,
    pub max_results_per_category: usize,
    pub max_suggestions: usize,
    /// TTL of cached search responses
    pub search_ttl_ms: u64,
    /// TTL of cached domain listings
    pub data_ttl_ms: u64,
}

impl SearchSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            min_query_length: config.min_query_length,
            max_results_per_category: config.max_results_per_category,
            max_suggestions: 5,
            search_ttl_ms: config.search_ttl_ms,
            data_ttl_ms: config.default_ttl_ms,
        }
    }
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

// == Universal Search ==
#[derive(Clone)]
pub struct UniversalSearch {
    source: Arc<dyn ClinicDataSource>,
    caller: CachedCall,
    settings: SearchSettings,
}

impl UniversalSearch {
    pub fn new(source: Arc<dyn ClinicDataSource>, caller: CachedCall, settings: SearchSettings) -> Self {
        Self {
            source,
            caller,
            settings,
        }
    }

    pub fn cache(&self) -> &CacheService {
        self.caller.cache()
    }

    pub fn settings(&self) -> &SearchSettings {
        &self.settings
    }

    // == Search ==
    pub async fn search(&self, query: &str) -> Result<SearchResponse> {
        let normalized = query.trim().to_lowercase();

        if normalized.chars().count() < self.settings.min_query_length {
            return Ok(self.quick_action_response(normalized));
        }

        let key = search_cache_key(&normalized)?;
        if let Some(cached) = self.cache().get(&key).await {
            debug!(query = %normalized, "search served from cache");
            return Ok(serde_json::from_value(cached)?);
        }

        let (response, complete) = self.aggregate(normalized).await;

        // Partial responses are not cached so a recovered category shows up
        // on the next keystroke.
        if complete {
            self.cache()
                .set(key, serde_json::to_value(&response)?, self.settings.search_ttl_ms)
                .await;
        }
        Ok(response)
    }

    async fn aggregate(&self, query: String) -> (SearchResponse, bool) {
        let (actions, inventory, archives, logs) = tokio::join!(
            self.action_category(&query),
            self.inventory_category(&query),
            self.archive_category(&query),
            self.log_category(&query),
        );

        let mut complete = true;
        let categories: Vec<SearchCategory> = [actions, inventory, archives, logs]
            .into_iter()
            .filter_map(|outcome| match outcome {
                Ok(category) => Some(category),
                Err((name, err)) => {
                    warn!(category = name, error = %err, "category search failed");
                    complete = false;
                    None
                }
            })
            .filter(|category| category.total > 0)
            .collect();

        let response = SearchResponse {
            total_results: categories.iter().map(|c| c.total).sum(),
            suggestions: suggestions(&query, self.settings.max_suggestions),
            query,
            categories,
        };
        (response, complete)
    }

    fn quick_action_response(&self, query: String) -> SearchResponse {
        let category = action_results(&query, self.settings.max_results_per_category);
        let categories: Vec<SearchCategory> = Some(category).into_iter().filter(|c| c.total > 0).collect();

        SearchResponse {
            total_results: categories.iter().map(|c| c.total).sum(),
            query,
            categories,
            suggestions: Vec::new(),
        }
    }

    // == Domain Fetches ==
    pub async fn inventory_items(&self) -> Result<Vec<InventoryItem>> {
        let source = self.source.clone();
        self.caller
            .call(
                NS_INVENTORY,
                "getAllItems",
                || async move { source.inventory_items().await },
                None::<&()>,
                self.settings.data_ttl_ms,
            )
            .await
    }

    pub async fn archived_items(&self) -> Result<Vec<ArchivedItem>> {
        let source = self.source.clone();
        self.caller
            .call(
                NS_ARCHIVES,
                "getAllItems",
                || async move { source.archived_items().await },
                None::<&()>,
                self.settings.data_ttl_ms,
            )
            .await
    }

    pub async fn activity_logs(&self) -> Result<Vec<ActivityLog>> {
        let source = self.source.clone();
        self.caller
            .call(
                NS_LOGS,
                "getAll",
                || async move { source.activity_logs().await },
                None::<&()>,
                self.settings.data_ttl_ms,
            )
            .await
    }

    /// Evicts cached reads of `namespace` and every cached search response.
    pub async fn invalidate_after_mutation(&self, namespace: &str) -> usize {
        let removed = self.cache().clear_by_pattern(&format!("{namespace}_")).await
            + self.cache().clear_by_pattern(&format!("{NS_SEARCH}_")).await;
        debug!(namespace, removed, "invalidated after mutation");
        removed
    }

    /// Where an inventory item appears in its department listing.
    pub async fn locate_inventory_item(&self, id: &str) -> Result<PageLocation> {
        let items = self.inventory_items().await?;
        let item = items
            .iter()
            .find(|item| item.id == id)
            .ok_or_else(|| CacheError::NotFound(format!("inventory item {id}")))?;

        calculate_item_page(item, &items)
            .ok_or_else(|| CacheError::NotFound(format!("inventory item {id} is archived")))
    }

    // == Categories ==
    async fn action_category(&self, query: &str) -> CategoryOutcome {
        Ok(action_results(query, self.settings.max_results_per_category))
    }

    async fn inventory_category(&self, query: &str) -> CategoryOutcome {
        let items = self
            .inventory_items()
            .await
            .map_err(|e| (CATEGORY_INVENTORY, e))?;

        let mut hits: Vec<(u32, &InventoryItem)> = items
            .iter()
            .filter(|item| !item.is_archived && item.matches(query))
            .map(|item| {
                let bonus = relevance_bonus(query, &item.name, Some(&item.code));
                (PRIORITY_INVENTORY + bonus, item)
            })
            .collect();
        hits.sort_by(|a, b| {
            b.0.cmp(&a.0)
                .then_with(|| a.1.name.to_lowercase().cmp(&b.1.name.to_lowercase()))
        });

        Ok(ranked_category(CATEGORY_INVENTORY, hits, self.settings.max_results_per_category, |item, priority| {
            inventory_result(item, priority, calculate_item_page(item, &items))
        }))
    }

    async fn archive_category(&self, query: &str) -> CategoryOutcome {
        let archives = self
            .archived_items()
            .await
            .map_err(|e| (CATEGORY_ARCHIVES, e))?;

        let mut hits: Vec<(u32, &ArchivedItem)> = archives
            .iter()
            .filter(|item| item.matches(query))
            .map(|item| {
                let bonus = relevance_bonus(query, &item.name, Some(&item.code));
                (PRIORITY_ARCHIVE + bonus, item)
            })
            .collect();
        hits.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| b.1.archived_at.cmp(&a.1.archived_at)));

        Ok(ranked_category(CATEGORY_ARCHIVES, hits, self.settings.max_results_per_category, |item, priority| {
            archive_result(item, priority, calculate_archive_page(item, &archives))
        }))
    }

    async fn log_category(&self, query: &str) -> CategoryOutcome {
        let logs = self.activity_logs().await.map_err(|e| (CATEGORY_LOGS, e))?;

        let mut hits: Vec<(u32, &ActivityLog)> = logs
            .iter()
            .filter(|log| log.matches(query))
            .map(|log| (PRIORITY_LOG + relevance_bonus(query, &log.action, None), log))
            .collect();
        hits.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| b.1.created_at.cmp(&a.1.created_at)));

        Ok(ranked_category(CATEGORY_LOGS, hits, self.settings.max_results_per_category, |log, priority| {
            log_result(log, priority, calculate_log_page(log, &logs))
        }))
    }
}

type CategoryOutcome = std::result::Result<SearchCategory, (&'static str, CacheError)>;

/// Keeps the top `max_results` ranked hits, building results only for those.
fn ranked_category<T, F>(name: &str, hits: Vec<(u32, &T)>, max_results: usize, build: F) -> SearchCategory
where
    F: Fn(&T, u32) -> SearchResult,
{
    SearchCategory {
        name: name.to_string(),
        total: hits.len(),
        results: hits
            .into_iter()
            .take(max_results)
            .map(|(priority, record)| build(record, priority))
            .collect(),
    }
}

fn action_results(query: &str, max_results: usize) -> SearchCategory {
    let mut hits: Vec<SearchResult> = matching_actions(query)
        .into_iter()
        .map(|action| action.to_result(PRIORITY_ACTION + relevance_bonus(query, action.title, None)))
        .collect();
    // Stable: equal priorities keep table order
    hits.sort_by(|a, b| b.priority.cmp(&a.priority));
    SearchCategory::truncated(CATEGORY_ACTIONS, hits, max_results)
}

fn relevance_bonus(query: &str, title: &str, code: Option<&str>) -> u32 {
    let title = title.to_lowercase();
    let exact_code = code.is_some_and(|c| c.to_lowercase() == query);

    if title == query || exact_code {
        EXACT_MATCH_BONUS
    } else if title.starts_with(query) {
        PREFIX_MATCH_BONUS
    } else {
        0
    }
}

/// Deep link into a listing view on the page where `id` appears.
fn listing_url(path: &str, filters: &[(&str, &str)], location: Option<&PageLocation>, id: &str) -> String {
    let mut query = form_urlencoded::Serializer::new(String::new());
    for (name, value) in filters {
        query.append_pair(name, value);
    }
    if let Some(location) = location {
        query.append_pair("page", &location.default_page.to_string());
        query.append_pair("itemsPerPage", &location.default_items_per_page.to_string());
    }
    query.append_pair("highlight", id);
    format!("{path}?{}", query.finish())
}

fn inventory_result(item: &InventoryItem, priority: u32, location: Option<PageLocation>) -> SearchResult {
    let mut metadata = BTreeMap::new();
    metadata.insert("department".to_string(), item.department.clone());
    metadata.insert("classification".to_string(), item.classification.clone());
    metadata.insert(
        "quantity".to_string(),
        match &item.unit {
            Some(unit) => format!("{} {}", item.quantity, unit),
            None => item.quantity.to_string(),
        },
    );

    SearchResult {
        id: format!("inventory-{}", item.id),
        result_type: SearchResultType::Inventory,
        title: item.name.clone(),
        subtitle: Some(format!("{} - {} / {}", item.code, item.department, item.classification)),
        description: Some(item.category.clone()),
        metadata,
        icon: "package".to_string(),
        url: Some(listing_url(
            "/inventory",
            &[
                ("department", item.department.as_str()),
                ("classification", item.classification.as_str()),
            ],
            location.as_ref(),
            &item.id,
        )),
        priority,
        item_data: Some(SearchItemData::Inventory(item.clone())),
        page_location: location,
    }
}

fn archive_result(item: &ArchivedItem, priority: u32, location: Option<PageLocation>) -> SearchResult {
    let mut metadata = BTreeMap::new();
    metadata.insert("archivedAt".to_string(), item.archived_at.to_rfc3339());
    metadata.insert("department".to_string(), item.department.clone());

    SearchResult {
        id: format!("archive-{}", item.id),
        result_type: SearchResultType::Archive,
        title: item.name.clone(),
        subtitle: Some(format!("{} - archived by {}", item.code, item.archived_by)),
        description: item.reason.clone(),
        metadata,
        icon: "archive".to_string(),
        url: Some(listing_url("/archives", &[], location.as_ref(), &item.id)),
        priority,
        item_data: Some(SearchItemData::Archive(item.clone())),
        page_location: location,
    }
}

fn log_result(log: &ActivityLog, priority: u32, location: Option<PageLocation>) -> SearchResult {
    let mut metadata = BTreeMap::new();
    metadata.insert("timestamp".to_string(), log.created_at.to_rfc3339());
    if let Some(entity) = &log.entity_type {
        metadata.insert("entityType".to_string(), entity.clone());
    }

    SearchResult {
        id: format!("log-{}", log.id),
        result_type: SearchResultType::Log,
        title: log.action.clone(),
        subtitle: Some(log.username.clone()),
        description: Some(log.description.clone()),
        metadata,
        icon: "clock".to_string(),
        url: Some(listing_url("/logs", &[], location.as_ref(), &log.id)),
        priority,
        item_data: Some(SearchItemData::Log(log.clone())),
        page_location: location,
    }
}

/// Cache key of the response for an already normalized query.
pub fn search_cache_key<Q: Serialize + ?Sized>(normalized_query: &Q) -> Result<String> {
    derive_key(NS_SEARCH, "universal", Some(normalized_query))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::location::DEFAULT_ITEMS_PER_PAGE;
    use crate::search::source::{InMemoryDataSource, SeedData};
    use async_trait::async_trait;
    use chrono::{Duration, TimeZone, Utc};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn stock(id: &str, name: &str, department: &str, classification: &str) -> InventoryItem {
        InventoryItem {
            id: id.to_string(),
            name: name.to_string(),
            code: id.to_uppercase(),
            category: "Consumables".to_string(),
            department: department.to_string(),
            classification: classification.to_string(),
            quantity: 12,
            unit: Some("box".to_string()),
            is_archived: false,
        }
    }

    fn log(id: &str, action: &str, minutes: i64) -> ActivityLog {
        ActivityLog {
            id: id.to_string(),
            action: action.to_string(),
            description: format!("{action} on gauze stock"),
            username: "nurse.ana".to_string(),
            entity_type: Some("inventory".to_string()),
            created_at: Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap() + Duration::minutes(minutes),
        }
    }

    fn archived(id: &str, name: &str) -> ArchivedItem {
        ArchivedItem {
            id: id.to_string(),
            name: name.to_string(),
            code: id.to_uppercase(),
            category: "Consumables".to_string(),
            department: "Nursing".to_string(),
            classification: "Supplies".to_string(),
            reason: Some("expired".to_string()),
            archived_by: "admin".to_string(),
            archived_at: Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap(),
        }
    }

    fn seed() -> SeedData {
        SeedData {
            inventory: vec![
                stock("gz1", "Gauze Pads", "Nursing", "Supplies"),
                stock("gz2", "Sterile Gauze Roll", "Nursing", "Supplies"),
                stock("sal", "Saline 0.9%", "ER", "Medications"),
            ],
            archives: vec![archived("old-gz", "Gauze Pads (old lot)")],
            logs: vec![log("l1", "UPDATE", 0), log("l2", "CREATE", 5)],
        }
    }

    /// Source that counts calls and can fail the log listing.
    struct FlakySource {
        inner: InMemoryDataSource,
        fail_logs: bool,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ClinicDataSource for FlakySource {
        async fn inventory_items(&self) -> anyhow::Result<Vec<InventoryItem>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.inventory_items().await
        }

        async fn archived_items(&self) -> anyhow::Result<Vec<ArchivedItem>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.archived_items().await
        }

        async fn activity_logs(&self) -> anyhow::Result<Vec<ActivityLog>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_logs {
                anyhow::bail!("logs table unavailable");
            }
            self.inner.activity_logs().await
        }
    }

    fn search_over(data: SeedData, fail_logs: bool) -> (UniversalSearch, Arc<FlakySource>) {
        let source = Arc::new(FlakySource {
            inner: InMemoryDataSource::new(data),
            fail_logs,
            calls: AtomicUsize::new(0),
        });
        let search = UniversalSearch::new(
            source.clone(),
            CachedCall::new(CacheService::new()),
            SearchSettings::default(),
        );
        (search, source)
    }

    fn category<'a>(response: &'a SearchResponse, name: &str) -> Option<&'a SearchCategory> {
        response.categories.iter().find(|c| c.name == name)
    }

    #[tokio::test]
    async fn test_categories_in_fixed_order() {
        let (search, _) = search_over(seed(), false);

        let response = search.search("gauze").await.unwrap();
        let names: Vec<&str> = response.categories.iter().map(|c| c.name.as_str()).collect();

        assert_eq!(names, vec![CATEGORY_INVENTORY, CATEGORY_ARCHIVES, CATEGORY_LOGS]);
        assert_eq!(response.total_results, 2 + 1 + 2);
    }

    #[tokio::test]
    async fn test_failed_category_is_isolated() {
        let mut data = seed();
        data.inventory.push(stock("inv", "Inventory Binder", "Admin", "Stationery"));
        data.archives.push(archived("inv-old", "Inventory Binder 2019"));
        let (search, _) = search_over(data, true);

        let response = search.search("inventory").await.unwrap();

        assert!(category(&response, CATEGORY_LOGS).is_none());
        assert!(category(&response, CATEGORY_INVENTORY).is_some());
        assert!(category(&response, CATEGORY_ARCHIVES).is_some());
        assert!(category(&response, CATEGORY_ACTIONS).is_some());
        let expected: usize = response.categories.iter().map(|c| c.total).sum();
        assert_eq!(response.total_results, expected);

        // Partial responses are not cached
        let key = search_cache_key("inventory").unwrap();
        assert!(!search.cache().contains_live(&key).await);
    }

    #[tokio::test]
    async fn test_only_quick_actions_gives_one_category() {
        let (search, _) = search_over(seed(), false);

        let response = search.search("glasgow").await.unwrap();

        assert_eq!(response.categories.len(), 1);
        assert_eq!(response.categories[0].name, CATEGORY_ACTIONS);
    }

    #[tokio::test]
    async fn test_truncation_keeps_total() {
        let mut data = seed();
        data.inventory = (0..8)
            .map(|i| stock(&format!("sy{i}"), &format!("Syringe {i}ml"), "Nursing", "Supplies"))
            .collect();
        let (search, _) = search_over(data, false);

        let response = search.search("syringe").await.unwrap();
        let inventory = category(&response, CATEGORY_INVENTORY).unwrap();

        assert_eq!(inventory.results.len(), 5);
        assert_eq!(inventory.total, 8);
        assert_eq!(response.total_results, 8);
    }

    #[tokio::test]
    async fn test_supp_scenario() {
        let (search, _) = search_over(seed(), false);

        let response = search.search("supp").await.unwrap();

        assert!(response.suggestions.contains(&"supplies".to_string()));
        let actions = category(&response, CATEGORY_ACTIONS).unwrap();
        assert!(actions.results.iter().any(|r| r.title.contains("Inventory")));
    }

    #[tokio::test]
    async fn test_short_query_skips_data_sources() {
        let (search, source) = search_over(seed(), false);

        let response = search.search(" g ").await.unwrap();

        assert_eq!(source.calls.load(Ordering::SeqCst), 0);
        assert!(response
            .categories
            .iter()
            .all(|c| c.name == CATEGORY_ACTIONS));
        assert!(response.suggestions.is_empty());
    }

    #[tokio::test]
    async fn test_repeat_search_served_from_response_cache() {
        let (search, source) = search_over(seed(), false);

        let first = search.search("Gauze").await.unwrap();
        // Dropping listings proves the second answer comes from the response cache
        search.cache().clear_by_pattern("getAll").await;
        let second = search.search("  gauze ").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(source.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_priorities_non_increasing_with_recency_ties() {
        let (search, _) = search_over(seed(), false);

        let response = search.search("gauze").await.unwrap();

        for category in &response.categories {
            assert!(category
                .results
                .windows(2)
                .all(|w| w[0].priority >= w[1].priority));
        }
        let logs = category(&response, CATEGORY_LOGS).unwrap();
        assert_eq!(logs.results[0].id, "log-l2");
        assert_eq!(logs.results[1].id, "log-l1");
    }

    #[tokio::test]
    async fn test_prefix_match_ranks_first() {
        let (search, _) = search_over(seed(), false);

        let response = search.search("gauze").await.unwrap();
        let inventory = category(&response, CATEGORY_INVENTORY).unwrap();

        assert_eq!(inventory.results[0].title, "Gauze Pads");
        assert_eq!(inventory.results[0].priority, PRIORITY_INVENTORY + PREFIX_MATCH_BONUS);
        assert_eq!(inventory.results[1].priority, PRIORITY_INVENTORY);
    }

    #[tokio::test]
    async fn test_inventory_hit_carries_location_and_link() {
        let (search, _) = search_over(seed(), false);

        let response = search.search("sterile").await.unwrap();
        let hit = &category(&response, CATEGORY_INVENTORY).unwrap().results[0];

        let location = hit.page_location.as_ref().unwrap();
        assert_eq!(location.pages_by_items_per_page[&10], 1);
        assert_eq!(location.default_items_per_page, DEFAULT_ITEMS_PER_PAGE);
        assert_eq!(
            hit.url.as_deref(),
            Some("/inventory?department=Nursing&classification=Supplies&page=1&itemsPerPage=25&highlight=gz2")
        );
        assert!(matches!(hit.item_data, Some(SearchItemData::Inventory(ref i)) if i.id == "gz2"));
    }

    #[tokio::test]
    async fn test_mutation_invalidation_refreshes_results() {
        let source = Arc::new(InMemoryDataSource::new(seed()));
        let search = UniversalSearch::new(
            source.clone(),
            CachedCall::new(CacheService::new()),
            SearchSettings::default(),
        );

        let before = search.search("tourniquet").await.unwrap();
        assert!(category(&before, CATEGORY_INVENTORY).is_none());

        source
            .upsert_inventory_item(stock("tq", "Tourniquet", "ER", "Equipment"))
            .await;
        search.invalidate_after_mutation(NS_INVENTORY).await;

        let after = search.search("tourniquet").await.unwrap();
        assert_eq!(category(&after, CATEGORY_INVENTORY).unwrap().total, 1);
    }

    #[tokio::test]
    async fn test_locate_inventory_item() {
        let (search, _) = search_over(seed(), false);

        let location = search.locate_inventory_item("gz2").await.unwrap();
        assert_eq!(location.default_page, 1);

        assert!(matches!(
            search.locate_inventory_item("missing").await,
            Err(CacheError::NotFound(_))
        ));
    }
}
