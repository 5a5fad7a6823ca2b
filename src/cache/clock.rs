//! Clock Module
//!
//! Time sources used for TTL tracking. All readings are milliseconds.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

// == Clock Trait ==
/// A monotonically non-decreasing millisecond clock.
///
/// A reading of 0 is reserved to mean "no active timer", so implementations
/// must never return it.
pub trait Clock {
    fn now(&self) -> u64;
}

// == System Clock ==
/// Monotonic clock measuring milliseconds since its creation, starting at 1.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> u64 {
        self.origin.elapsed().as_millis() as u64 + 1
    }
}

// == Manual Clock ==
/// A clock that only moves when told to.
///
/// Clones share the same reading, so a test can keep a handle and advance
/// the clock owned by a cache.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<AtomicU64>,
}

impl ManualClock {
    /// Creates a clock reading `start` (clamped to at least 1).
    pub fn new(start: u64) -> Self {
        Self {
            now: Arc::new(AtomicU64::new(start.max(1))),
        }
    }

    /// Moves the clock forward by `ms` milliseconds.
    pub fn advance(&self, ms: u64) {
        self.now.fetch_add(ms, Ordering::Relaxed);
    }

    /// Sets the clock to `ms`; readings never go backwards.
    pub fn set(&self, ms: u64) {
        self.now.fetch_max(ms, Ordering::Relaxed);
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(1)
    }
}

impl Clock for ManualClock {
    fn now(&self) -> u64 {
        self.now.load(Ordering::Relaxed)
    }
}
