//! API Handlers
//!
//! HTTP request handlers for each cache server endpoint.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use tracing::info;

use crate::cache::{LruCache, SetOptions, Snapshot};
use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::models::{
    validate_key, DeleteResponse, GetParams, GetResponse, HasResponse, HealthResponse,
    LoadRequest, PeekParams, PopResponse, SetRequest, SetResponse, SizeResponse, StatsResponse,
    TtlResponse,
};

/// Cache type served over HTTP.
pub type SharedCache = LruCache<String, String>;

/// Application state shared across all handlers.
///
/// Contains the cache wrapped in Arc<RwLock<>> for thread-safe access.
#[derive(Clone)]
pub struct AppState {
    /// Thread-safe cache
    pub cache: Arc<RwLock<SharedCache>>,
}

impl AppState {
    /// Creates a new AppState with the given cache.
    pub fn new(cache: SharedCache) -> Self {
        Self {
            cache: Arc::new(RwLock::new(cache)),
        }
    }

    /// Creates a new AppState from configuration.
    ///
    /// Fails if the configured capacity or TTL is rejected by the cache.
    pub fn from_config(config: &Config) -> Result<Self> {
        let cache = LruCache::with_options(config.cache_options())?;
        Ok(Self::new(cache))
    }
}

/// Handler for PUT /set
///
/// Stores a key-value pair in the cache with optional TTL in milliseconds.
pub async fn set_handler(
    State(state): State<AppState>,
    Json(req): Json<SetRequest>,
) -> Result<Json<SetResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let options = SetOptions {
        ttl: req.ttl.map(Duration::from_millis),
    };

    let mut cache = state.cache.write().await;
    cache.set_with(req.key.clone(), req.value, options)?;

    Ok(Json(SetResponse::new(req.key)))
}

/// Handler for GET /get/:key
///
/// Retrieves a value and marks it most recently used. Stale entries are
/// removed; whether their value is returned depends on `allow_stale`.
pub async fn get_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Query(params): Query<GetParams>,
) -> Result<Json<GetResponse>> {
    // Write lock: reads reorder recency and update stats
    let mut cache = state.cache.write().await;
    let value = cache
        .get_with(&key, params.into())
        .ok_or_else(|| CacheError::NotFound(key.clone()))?;

    Ok(Json(GetResponse::new(key, value)))
}

/// Handler for GET /peek/:key
///
/// Reads a value without touching recency or removing stale entries.
pub async fn peek_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Query(params): Query<PeekParams>,
) -> Result<Json<GetResponse>> {
    let cache = state.cache.read().await;
    let value = cache
        .peek_with(&key, params.into())
        .cloned()
        .ok_or_else(|| CacheError::NotFound(key.clone()))?;

    Ok(Json(GetResponse::new(key, value)))
}

/// Handler for GET /has/:key
pub async fn has_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Json<HasResponse> {
    let cache = state.cache.read().await;
    let present = cache.has(&key);

    Json(HasResponse { key, present })
}

/// Handler for DELETE /del/:key
///
/// Deletes a key from the cache.
pub async fn delete_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<DeleteResponse>> {
    let mut cache = state.cache.write().await;
    if !cache.delete(&key) {
        return Err(CacheError::NotFound(key));
    }

    Ok(Json(DeleteResponse::new(key)))
}

/// Handler for POST /pop
///
/// Removes the least recently used entry.
pub async fn pop_handler(State(state): State<AppState>) -> Json<PopResponse> {
    let mut cache = state.cache.write().await;
    Json(PopResponse { value: cache.pop() })
}

/// Handler for POST /clear
pub async fn clear_handler(State(state): State<AppState>) -> Json<SizeResponse> {
    let mut cache = state.cache.write().await;
    cache.clear();

    Json(SizeResponse::new("Cache cleared", cache.len()))
}

/// Handler for GET /ttl/:key
///
/// Reports the time left before a key goes stale.
pub async fn ttl_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Json<TtlResponse> {
    let cache = state.cache.read().await;
    let remaining = cache.remaining_ttl(&key);

    Json(TtlResponse::new(key, remaining))
}

/// Handler for GET /dump
///
/// Returns the cache contents from least to most recently used.
pub async fn dump_handler(State(state): State<AppState>) -> Json<Snapshot<String, String>> {
    let cache = state.cache.read().await;
    Json(cache.dump())
}

/// Handler for POST /load
///
/// Replaces the cache contents with a snapshot in the shape GET /dump returns.
pub async fn load_handler(
    State(state): State<AppState>,
    Json(entries): Json<LoadRequest>,
) -> Result<Json<SizeResponse>> {
    if let Some(error_msg) = entries.iter().find_map(|(key, _)| validate_key(key)) {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let received = entries.len();
    let mut cache = state.cache.write().await;
    cache.load(entries);
    info!(received, size = cache.len(), "Snapshot loaded over HTTP");

    Ok(Json(SizeResponse::new(
        format!("Loaded {} entries", received),
        cache.len(),
    )))
}

/// Handler for GET /stats
///
/// Returns current cache statistics.
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let cache = state.cache.read().await;
    let stats = cache.stats();

    Json(StatsResponse::new(&stats, cache.capacity()))
}

/// Handler for GET /health
///
/// Returns health status of the server.
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::SnapshotEntry;
    use crate::models::MAX_KEY_LENGTH;

    fn test_state(capacity: usize) -> AppState {
        AppState::new(LruCache::new(capacity).unwrap())
    }

    fn set_request(key: &str, value: &str, ttl: Option<u64>) -> Json<SetRequest> {
        Json(SetRequest {
            key: key.to_string(),
            value: value.to_string(),
            ttl,
        })
    }

    async fn put(state: &AppState, key: &str, value: &str, ttl: Option<u64>) {
        let result = set_handler(State(state.clone()), set_request(key, value, ttl)).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_set_and_get_handler() {
        let state = test_state(100);

        let result = set_handler(
            State(state.clone()),
            set_request("test_key", "test_value", None),
        )
        .await;
        assert!(result.is_ok());

        let result = get_handler(
            State(state.clone()),
            Path("test_key".to_string()),
            Query(GetParams::default()),
        )
        .await;
        let response = result.unwrap();
        assert_eq!(response.value, "test_value");
    }

    #[tokio::test]
    async fn test_get_nonexistent_key() {
        let state = test_state(100);

        let result = get_handler(
            State(state),
            Path("nonexistent".to_string()),
            Query(GetParams::default()),
        )
        .await;
        assert!(matches!(result, Err(CacheError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_handler() {
        let state = test_state(100);
        put(&state, "to_delete", "value", None).await;

        let result = delete_handler(State(state.clone()), Path("to_delete".to_string())).await;
        assert!(result.is_ok());

        // Second delete finds nothing
        let result = delete_handler(State(state), Path("to_delete".to_string())).await;
        assert!(matches!(result, Err(CacheError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_pop_handler_evicts_oldest() {
        let state = test_state(10);
        for key in ["a", "b", "c"] {
            put(&state, key, key, None).await;
        }

        let response = pop_handler(State(state.clone())).await;
        assert_eq!(response.value.as_deref(), Some("a"));
        assert_eq!(state.cache.read().await.len(), 2);
    }

    #[tokio::test]
    async fn test_pop_handler_empty() {
        let response = pop_handler(State(test_state(10))).await;
        assert!(response.value.is_none());
    }

    #[tokio::test]
    async fn test_peek_and_has_handlers() {
        let state = test_state(10);
        put(&state, "k", "v", None).await;

        let response = peek_handler(
            State(state.clone()),
            Path("k".to_string()),
            Query(PeekParams::default()),
        )
        .await
        .unwrap();
        assert_eq!(response.value, "v");

        let response = has_handler(State(state.clone()), Path("k".to_string())).await;
        assert!(response.present);

        let response = has_handler(State(state), Path("missing".to_string())).await;
        assert!(!response.present);
    }

    #[tokio::test]
    async fn test_ttl_handler() {
        let state = test_state(10);
        put(&state, "forever", "v", None).await;
        put(&state, "short", "v", Some(60_000)).await;

        let response = ttl_handler(State(state.clone()), Path("forever".to_string())).await;
        assert!(response.unlimited);

        let response = ttl_handler(State(state.clone()), Path("short".to_string())).await;
        assert!(!response.unlimited);
        let remaining = response.remaining_ms.unwrap();
        assert!(remaining > 0 && remaining <= 60_000);

        let response = ttl_handler(State(state), Path("missing".to_string())).await;
        assert_eq!(response.remaining_ms, Some(0));
    }

    #[tokio::test]
    async fn test_dump_and_load_handlers() {
        let source = test_state(10);
        for key in ["a", "b", "c"] {
            put(&source, key, key, None).await;
        }

        let Json(snapshot) = dump_handler(State(source)).await;
        let keys: Vec<_> = snapshot.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, ["a", "b", "c"]);

        // Smaller target keeps the most recent entries
        let target = test_state(2);
        let response = load_handler(State(target.clone()), Json(snapshot))
            .await
            .unwrap();
        assert_eq!(response.size, 2);

        let cache = target.cache.read().await;
        let keys: Vec<_> = cache.keys().cloned().collect();
        assert_eq!(keys, ["c", "b"]);
    }

    #[tokio::test]
    async fn test_load_rejects_empty_key() {
        let state = test_state(10);
        let entries = vec![(String::new(), SnapshotEntry::new("v".to_string()))];

        let result = load_handler(State(state), Json(entries)).await;
        assert!(matches!(result, Err(CacheError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn test_load_rejects_oversized_key() {
        let state = test_state(10);
        put(&state, "kept", "v", None).await;
        let entries = vec![
            ("ok".to_string(), SnapshotEntry::new("v".to_string())),
            ("x".repeat(MAX_KEY_LENGTH + 1), SnapshotEntry::new("v".to_string())),
        ];

        let result = load_handler(State(state.clone()), Json(entries)).await;
        assert!(matches!(result, Err(CacheError::InvalidRequest(_))));

        // A rejected snapshot leaves the cache untouched
        let cache = state.cache.read().await;
        assert!(cache.has("kept"));
        assert!(!cache.has("ok"));
    }

    #[tokio::test]
    async fn test_clear_handler() {
        let state = test_state(10);
        put(&state, "k", "v", None).await;

        let response = clear_handler(State(state)).await;
        assert_eq!(response.size, 0);
    }

    #[tokio::test]
    async fn test_stats_handler() {
        let state = test_state(100);

        let response = stats_handler(State(state)).await;
        assert_eq!(response.hits, 0);
        assert_eq!(response.misses, 0);
        assert_eq!(response.capacity, 100);
    }

    #[tokio::test]
    async fn test_health_handler() {
        let response = health_handler().await;
        assert_eq!(response.status, "healthy");
    }

    #[tokio::test]
    async fn test_set_invalid_request() {
        let state = test_state(100);

        let result = set_handler(State(state), set_request("", "value", None)).await;
        assert!(result.is_err());
    }

    #[cfg(target_pointer_width = "64")]
    #[test]
    fn test_from_config_rejects_oversized_capacity() {
        let config = Config {
            max_entries: usize::MAX,
            ..Config::default()
        };
        assert!(matches!(
            AppState::from_config(&config),
            Err(CacheError::InvalidCapacity(_))
        ));
    }
}
