//! Error types for the clinic cache
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the cache, query and search layers.
///
/// Low-level store operations never produce one of these; they report
/// absence through `Option`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CacheError {
    /// Requested record does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The underlying data call rejected
    #[error("Fetch failed: {0}")]
    Fetch(String),

    /// Params or values could not be converted to or from their cached form
    #[error("Serialization failed: {0}")]
    Serialization(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CacheError {
    /// Wraps a fetch function's error, keeping the whole context chain.
    pub fn fetch(err: anyhow::Error) -> Self {
        CacheError::Fetch(format!("{:#}", err))
    }
}

impl From<serde_json::Error> for CacheError {
    fn from(err: serde_json::Error) -> Self {
        CacheError::Serialization(err.to_string())
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = match &self {
            CacheError::NotFound(_) => StatusCode::NOT_FOUND,
            CacheError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            CacheError::Fetch(_) => StatusCode::BAD_GATEWAY,
            CacheError::Serialization(_) => StatusCode::UNPROCESSABLE_ENTITY,
            CacheError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the crate.
pub type Result<T> = std::result::Result<T, CacheError>;
