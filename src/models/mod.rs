//! Request and response models for the HTTP API
//!
//! DTOs used for (de)serializing HTTP request and response bodies.

pub mod requests;
pub mod responses;

pub use requests::{SearchParams, UpsertInventoryRequest};
pub use responses::{HealthResponse, InvalidateResponse, StatsResponse, UpsertResponse};
