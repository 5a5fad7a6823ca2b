//! Arena LRU - A fixed-capacity LRU cache with lazy TTL expiry
//!
//! Entries live in preallocated slots ordered by recency. Expiry is checked
//! on access against a debounced clock, and the whole cache can be dumped to
//! and loaded from a serializable snapshot. An optional HTTP front end serves
//! a shared `LruCache<String, String>`.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;

pub use api::AppState;
pub use cache::{CacheOptions, LruCache, Snapshot, SnapshotEntry};
pub use config::Config;
pub use error::{CacheError, Result};
