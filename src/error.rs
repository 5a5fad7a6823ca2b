//! Error types for the cache
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

// == Cache Error Enum ==
/// Unified error type for the cache and its HTTP front end.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Capacity is not a supported nonnegative integer
    #[error("Invalid capacity: {0}")]
    InvalidCapacity(String),

    /// TTL is not a nonnegative whole number of milliseconds
    #[error("Invalid TTL: {0}")]
    InvalidTtl(String),

    /// Key not found in cache
    #[error("Key not found: {0}")]
    NotFound(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = match &self {
            CacheError::NotFound(_) => StatusCode::NOT_FOUND,
            CacheError::InvalidCapacity(_)
            | CacheError::InvalidTtl(_)
            | CacheError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        };

        (status, Json(ErrorResponse::new(self.to_string()))).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache.
pub type Result<T> = std::result::Result<T, CacheError>;
