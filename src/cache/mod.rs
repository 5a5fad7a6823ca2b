//! Cache Module
//!
//! Arena-indexed LRU cache with lazy TTL expiry and snapshot support.

mod alloc;
mod clock;
mod entry;
mod index;
mod list;
mod options;
mod staleness;
mod stats;
mod store;


// Re-export public types
pub use clock::{Clock, ManualClock, SystemClock};
pub use entry::{Snapshot, SnapshotEntry};
pub use options::{
    ttl_millis, CacheOptions, GetOptions, PeekOptions, SetOptions, DEFAULT_TTL_RESOLUTION,
    MAX_CAPACITY,
};
pub use staleness::RemainingTtl;
pub use stats::CacheStats;
pub use store::LruCache;
