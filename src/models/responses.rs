//! Response DTOs for the cache server API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;

use crate::cache::{CacheStats, RemainingTtl};

/// Response body for GET /get/:key and GET /peek/:key
#[derive(Debug, Clone, Serialize)]
pub struct GetResponse {
    /// The requested key
    pub key: String,
    /// The stored value
    pub value: String,
}

impl GetResponse {
    /// Creates a new GetResponse
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Response body for the SET operation (PUT /set)
#[derive(Debug, Clone, Serialize)]
pub struct SetResponse {
    /// Success message
    pub message: String,
    /// The key that was set
    pub key: String,
}

impl SetResponse {
    /// Creates a new SetResponse
    pub fn new(key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            message: format!("Key '{}' set successfully", key),
            key,
        }
    }
}

/// Response body for the DELETE operation (DELETE /del/:key)
#[derive(Debug, Clone, Serialize)]
pub struct DeleteResponse {
    /// Success message
    pub message: String,
    /// The key that was deleted
    pub key: String,
}

impl DeleteResponse {
    /// Creates a new DeleteResponse
    pub fn new(key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            message: format!("Key '{}' deleted successfully", key),
            key,
        }
    }
}

/// Response body for GET /has/:key
#[derive(Debug, Clone, Serialize)]
pub struct HasResponse {
    pub key: String,
    /// True if the key is present and not stale
    pub present: bool,
}

/// Response body for POST /pop
#[derive(Debug, Clone, Serialize)]
pub struct PopResponse {
    /// Value of the removed least recently used entry, null if the cache was empty
    pub value: Option<String>,
}

/// Response body for GET /ttl/:key
#[derive(Debug, Clone, Serialize)]
pub struct TtlResponse {
    pub key: String,
    /// True if the entry never expires
    pub unlimited: bool,
    /// Milliseconds left, absent when unlimited; 0 for missing keys
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining_ms: Option<u64>,
}

impl TtlResponse {
    pub fn new(key: impl Into<String>, remaining: RemainingTtl) -> Self {
        Self {
            key: key.into(),
            unlimited: remaining.is_unlimited(),
            remaining_ms: remaining.as_duration().map(|d| d.as_millis() as u64),
        }
    }
}

/// Response body for POST /load and POST /clear
#[derive(Debug, Clone, Serialize)]
pub struct SizeResponse {
    /// Success message
    pub message: String,
    /// Number of entries in the cache afterwards
    pub size: usize,
}

impl SizeResponse {
    pub fn new(message: impl Into<String>, size: usize) -> Self {
        Self {
            message: message.into(),
            size,
        }
    }
}

/// Response body for the stats endpoint (GET /stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    /// Number of cache hits
    pub hits: u64,
    /// Number of cache misses
    pub misses: u64,
    /// Number of evictions
    pub evictions: u64,
    /// Current number of entries in cache
    pub total_entries: usize,
    /// Configured capacity, 0 = unbounded
    pub capacity: usize,
    /// Hit rate (hits / (hits + misses))
    pub hit_rate: f64,
}

impl StatsResponse {
    /// Creates a new StatsResponse from cache statistics
    pub fn new(stats: &CacheStats, capacity: usize) -> Self {
        Self {
            hits: stats.hits,
            misses: stats.misses,
            evictions: stats.evictions,
            total_entries: stats.total_entries,
            capacity,
            hit_rate: stats.hit_rate(),
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub error: String,
}

impl ErrorResponse {
    /// Creates a new ErrorResponse
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
