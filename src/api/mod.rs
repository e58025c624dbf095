//! API Module
//!
//! HTTP handlers and routing for the clinic cache service.
//!
//! # Endpoints
//! - `GET /search?q=` - Universal search
//! - `GET /inventory/:id/location` - Listing page of an inventory item
//! - `PUT /inventory` - Create or update an inventory item
//! - `GET /cache/stats` - Cache statistics
//! - `DELETE /cache` - Clear every cache entry
//! - `DELETE /cache/pattern/:pattern` - Clear entries whose key contains a pattern
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
