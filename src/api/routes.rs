//! API Routes
//!
//! Configures the Axum router with every endpoint.

use axum::{
    routing::{delete, get, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    clear_cache_handler, clear_pattern_handler, health_handler, item_location_handler,
    search_handler, stats_handler, upsert_inventory_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Middleware
/// - CORS: Allows any origin
/// - Tracing: Logs all requests
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/search", get(search_handler))
        .route("/inventory", put(upsert_inventory_handler))
        .route("/inventory/:id/location", get(item_location_handler))
        .route("/cache", delete(clear_cache_handler))
        .route("/cache/stats", get(stats_handler))
        .route("/cache/pattern/:pattern", delete(clear_pattern_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
