//! API Module
//!
//! HTTP handlers and routing for the cache server REST API.
//!
//! # Endpoints
//! - `PUT /set` - Store a key-value pair, optionally with a TTL
//! - `GET /get/:key` - Retrieve a value and mark it most recently used
//! - `GET /peek/:key` - Retrieve a value without touching recency
//! - `GET /has/:key` - Check whether a fresh entry exists
//! - `DELETE /del/:key` - Delete a key
//! - `POST /pop` - Remove the least recently used entry
//! - `POST /clear` - Remove every entry
//! - `GET /ttl/:key` - Time left before a key goes stale
//! - `GET /dump` - Snapshot the cache
//! - `POST /load` - Replace the cache contents with a snapshot
//! - `GET /stats` - Get cache statistics
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
