//! Cache Options Module
//!
//! Construction options and per-call overrides.

use std::time::Duration;

use crate::error::{CacheError, Result};

/// Largest supported bounded capacity; slot links are at most 32 bits wide.
pub const MAX_CAPACITY: u64 = 1 << 32;

/// Default debounce window for staleness checks.
pub const DEFAULT_TTL_RESOLUTION: Duration = Duration::from_millis(1);

// == Cache Options ==
/// Options for building an [`LruCache`](crate::cache::LruCache).
///
/// ```
/// use std::time::Duration;
/// use arena_lru::cache::{CacheOptions, LruCache};
///
/// let options = CacheOptions::new(100)
///     .with_ttl(Duration::from_secs(60))
///     .with_allow_stale(true);
/// let cache: LruCache<String, u32> = LruCache::with_options(options).unwrap();
/// assert_eq!(cache.capacity(), 100);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheOptions {
    /// Maximum number of entries, 0 = unbounded
    pub capacity: usize,
    /// Default TTL for new entries, zero = never expire
    pub ttl: Duration,
    /// How long a clock reading is reused for staleness checks
    pub ttl_resolution: Duration,
    /// Return stale values (once) instead of treating them as absent
    pub allow_stale: bool,
    /// Restart an entry's age whenever `get` returns it
    pub update_age_on_get: bool,
}

impl CacheOptions {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            ..Self::default()
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_ttl_resolution(mut self, resolution: Duration) -> Self {
        self.ttl_resolution = resolution;
        self
    }

    pub fn with_allow_stale(mut self, allow_stale: bool) -> Self {
        self.allow_stale = allow_stale;
        self
    }

    pub fn with_update_age_on_get(mut self, update_age_on_get: bool) -> Self {
        self.update_age_on_get = update_age_on_get;
        self
    }

    // == Validate ==
    /// Checks the options and converts durations to clock milliseconds.
    pub(crate) fn validate(&self) -> Result<ValidOptions> {
        if self.capacity as u64 > MAX_CAPACITY {
            return Err(CacheError::InvalidCapacity(format!(
                "capacity {} exceeds maximum of {}",
                self.capacity, MAX_CAPACITY
            )));
        }

        Ok(ValidOptions {
            ttl: ttl_millis(self.ttl)?,
            ttl_resolution: ttl_millis(self.ttl_resolution)?,
        })
    }
}

impl Default for CacheOptions {
    fn default() -> Self {
        Self {
            capacity: 0,
            ttl: Duration::ZERO,
            ttl_resolution: DEFAULT_TTL_RESOLUTION,
            allow_stale: false,
            update_age_on_get: false,
        }
    }
}

/// Durations from validated options, in milliseconds.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ValidOptions {
    pub(crate) ttl: u64,
    pub(crate) ttl_resolution: u64,
}

// == TTL Conversion ==
/// Converts a duration into whole milliseconds.
///
/// Fails with `InvalidTtl` on sub-millisecond remainders or overflow.
pub fn ttl_millis(ttl: Duration) -> Result<u64> {
    if ttl.subsec_nanos() % 1_000_000 != 0 {
        return Err(CacheError::InvalidTtl(format!(
            "{:?} is not a whole number of milliseconds",
            ttl
        )));
    }
    u64::try_from(ttl.as_millis())
        .map_err(|_| CacheError::InvalidTtl(format!("{:?} is too large", ttl)))
}

// == Per-Call Options ==
/// Overrides for a single `set`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SetOptions {
    /// TTL for this entry instead of the cache default
    pub ttl: Option<Duration>,
}

impl SetOptions {
    pub fn ttl(ttl: Duration) -> Self {
        Self { ttl: Some(ttl) }
    }
}

/// Overrides for a single `get`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GetOptions {
    pub allow_stale: Option<bool>,
    pub update_age_on_get: Option<bool>,
}

/// Overrides for a single `peek`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PeekOptions {
    pub allow_stale: Option<bool>,
}
