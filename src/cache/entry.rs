//! Snapshot Entry Module
//!
//! Defines the record format produced by `dump` and consumed by `load`.

use serde::{Deserialize, Serialize};

// == Snapshot Entry ==
/// A single entry in a cache snapshot, paired with its key.
///
/// Snapshots are ordered from least to most recently used.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotEntry<V> {
    /// The stored value
    pub value: V,
    /// TTL in milliseconds, 0 = never expires
    #[serde(default)]
    pub ttl: u64,
    /// Clock reading (ms) at which the entry's age started, 0 = no timer.
    /// Only meaningful against the clock of the cache that produced it.
    #[serde(default)]
    pub start: u64,
}

impl<V> SnapshotEntry<V> {
    // == Constructor ==
    /// Creates an entry with no TTL.
    pub fn new(value: V) -> Self {
        Self {
            value,
            ttl: 0,
            start: 0,
        }
    }

    /// Creates an entry that expires `ttl_ms` after being loaded.
    pub fn with_ttl(value: V, ttl_ms: u64) -> Self {
        Self {
            value,
            ttl: ttl_ms,
            start: 0,
        }
    }

    // == Has TTL ==
    pub fn has_ttl(&self) -> bool {
        self.ttl != 0
    }
}

/// An ordered cache snapshot.
pub type Snapshot<K, V> = Vec<(K, SnapshotEntry<V>)>;
