//! API Handlers
//!
//! HTTP request handlers for each endpoint.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use tracing::info;

use crate::cache::{CacheService, CachedCall};
use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::models::{
    HealthResponse, InvalidateResponse, SearchParams, StatsResponse, UpsertInventoryRequest,
    UpsertResponse,
};
use crate::search::{
    InMemoryDataSource, PageLocation, SearchResponse, SearchSettings, UniversalSearch,
    NS_INVENTORY,
};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Shared query cache
    pub cache: CacheService,
    pub search: Arc<UniversalSearch>,
    /// Backing records, written by `PUT /inventory`
    pub source: Arc<InMemoryDataSource>,
}

impl AppState {
    /// Wires a fresh cache, the cached-call layer and the search service
    /// over `source`.
    pub fn new(config: &Config, source: Arc<InMemoryDataSource>) -> Self {
        Self::with_cache(config, source, CacheService::new())
    }

    pub fn with_cache(config: &Config, source: Arc<InMemoryDataSource>, cache: CacheService) -> Self {
        let caller = CachedCall::new(cache.clone()).with_coalescing(config.coalesce_misses);
        let search = UniversalSearch::new(source.clone(), caller, SearchSettings::from_config(config));

        Self {
            cache,
            search: Arc::new(search),
            source,
        }
    }
}

/// Handler for GET /search?q=
pub async fn search_handler(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>> {
    let response = state.search.search(&params.q).await?;
    Ok(Json(response))
}

/// Handler for GET /inventory/:id/location
pub async fn item_location_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<PageLocation>> {
    let location = state.search.locate_inventory_item(&id).await?;
    Ok(Json(location))
}

/// Handler for PUT /inventory
///
/// Writes the item, then evicts cached inventory reads and search responses.
pub async fn upsert_inventory_handler(
    State(state): State<AppState>,
    Json(req): Json<UpsertInventoryRequest>,
) -> Result<Json<UpsertResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let item = req.into_item();
    let id = item.id.clone();
    let created = state.source.upsert_inventory_item(item).await;
    let invalidated = state.search.invalidate_after_mutation(NS_INVENTORY).await;

    info!(id = %id, created, invalidated, "inventory item written");
    Ok(Json(UpsertResponse::new(id, created, invalidated)))
}

/// Handler for GET /cache/stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse::from(state.cache.stats().await))
}

/// Handler for DELETE /cache
///
/// Used on logout so no cached data outlives the session.
pub async fn clear_cache_handler(State(state): State<AppState>) -> Json<InvalidateResponse> {
    let removed = state.cache.clear_all().await;
    Json(InvalidateResponse::all(removed))
}

/// Handler for DELETE /cache/pattern/:pattern
pub async fn clear_pattern_handler(
    State(state): State<AppState>,
    Path(pattern): Path<String>,
) -> Result<Json<InvalidateResponse>> {
    if pattern.trim().is_empty() {
        return Err(CacheError::InvalidRequest(
            "Pattern cannot be empty".to_string(),
        ));
    }

    let removed = state.cache.clear_by_pattern(&pattern).await;
    Ok(Json(InvalidateResponse::pattern(&pattern, removed)))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
