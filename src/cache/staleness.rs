//! Staleness Tracker Module
//!
//! Per-slot TTL bookkeeping with a debounced clock.
//!
//! The tracker is created lazily by the cache the first time an entry asks
//! for a nonzero TTL. Before that, no TTL arrays exist and nothing is stale.

use std::io;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};
use std::thread::{self, Thread};
use std::time::Duration;

use tracing::{debug, warn};

use crate::cache::Clock;

// == Remaining TTL ==
/// Time left before an entry goes stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemainingTtl {
    /// The entry never expires
    Unlimited,
    /// The entry expires after this duration (zero if absent or already stale)
    Expires(Duration),
}

impl RemainingTtl {
    /// Returns the remaining duration, or `None` if the entry never expires.
    pub fn as_duration(&self) -> Option<Duration> {
        match self {
            RemainingTtl::Unlimited => None,
            RemainingTtl::Expires(remaining) => Some(*remaining),
        }
    }

    pub fn is_unlimited(&self) -> bool {
        matches!(self, RemainingTtl::Unlimited)
    }
}

// == Staleness Tracker ==
/// Records a TTL and an age start per slot.
///
/// A slot is stale when `ttl != 0 && start != 0 && now - start > ttl`.
#[derive(Debug)]
pub(crate) struct StalenessTracker {
    ttls: Vec<u64>,
    starts: Vec<u64>,
    now: DebouncedNow,
}

impl StalenessTracker {
    /// Creates a tracker for `capacity` slots (0 = growable).
    ///
    /// `resolution` is the debounce window in milliseconds; 0 reads the
    /// clock on every staleness check.
    pub(crate) fn new(capacity: usize, resolution: u64) -> Self {
        debug!(capacity, resolution, "Initializing TTL tracking");
        Self {
            ttls: vec![0; capacity],
            starts: vec![0; capacity],
            now: DebouncedNow::new(resolution),
        }
    }

    fn ensure_slot(&mut self, slot: usize) {
        if slot >= self.ttls.len() {
            self.ttls.resize(slot + 1, 0);
            self.starts.resize(slot + 1, 0);
        }
    }

    // == Set Item TTL ==
    /// Stores `ttl` for a slot and restarts its age (no timer when ttl is 0).
    pub(crate) fn set_item_ttl<C: Clock>(&mut self, slot: usize, ttl: u64, clock: &C) {
        self.ensure_slot(slot);
        self.starts[slot] = if ttl != 0 { clock.now() } else { 0 };
        self.ttls[slot] = ttl;
    }

    // == Update Item Age ==
    /// Restarts a slot's age without touching its TTL.
    pub(crate) fn update_item_age<C: Clock>(&mut self, slot: usize, clock: &C) {
        self.ensure_slot(slot);
        self.starts[slot] = if self.ttls[slot] != 0 { clock.now() } else { 0 };
    }

    // == Is Stale ==
    pub(crate) fn is_stale<C: Clock>(&self, slot: usize, clock: &C) -> bool {
        let (ttl, start) = self.entry(slot);
        ttl != 0 && start != 0 && self.now.read(clock).saturating_sub(start) > ttl
    }

    // == Remaining ==
    pub(crate) fn remaining<C: Clock>(&self, slot: usize, clock: &C) -> RemainingTtl {
        let (ttl, start) = self.entry(slot);
        if ttl == 0 || start == 0 {
            return RemainingTtl::Unlimited;
        }
        let age = self.now.read(clock).saturating_sub(start);
        RemainingTtl::Expires(Duration::from_millis(ttl.saturating_sub(age)))
    }

    /// Returns `(ttl, start)` for a slot.
    pub(crate) fn entry(&self, slot: usize) -> (u64, u64) {
        (
            self.ttls.get(slot).copied().unwrap_or(0),
            self.starts.get(slot).copied().unwrap_or(0),
        )
    }

    // == Clear ==
    pub(crate) fn clear_slot(&mut self, slot: usize) {
        if slot < self.ttls.len() {
            self.ttls[slot] = 0;
            self.starts[slot] = 0;
        }
    }

    /// Resets the first `used` slots; later slots were never written.
    pub(crate) fn clear(&mut self, used: usize) {
        let used = used.min(self.ttls.len());
        self.ttls[..used].fill(0);
        self.starts[..used].fill(0);
    }
}

// == Debounced Clock ==
/// Caches the last clock reading for one resolution window.
///
/// Filling the cache schedules a reset on the tracker's [`ResetTimer`], which
/// clears the cached reading once the window has elapsed. The timer thread
/// is started by the first debounced read, not when the tracker is built.
#[derive(Debug)]
struct DebouncedNow {
    cached: Arc<AtomicU64>,
    /// 0 = no caching
    resolution: u64,
    /// `None` inside means the thread could not be started
    timer: OnceLock<Option<ResetTimer>>,
}

impl DebouncedNow {
    fn new(resolution: u64) -> Self {
        Self {
            cached: Arc::new(AtomicU64::new(0)),
            resolution,
            timer: OnceLock::new(),
        }
    }

    fn read<C: Clock>(&self, clock: &C) -> u64 {
        if self.resolution == 0 {
            return clock.now();
        }
        let Some(timer) = self.timer.get_or_init(|| self.start_timer()) else {
            return clock.now();
        };
        let cached = self.cached.load(Ordering::Relaxed);
        if cached != 0 {
            return cached;
        }
        let now = clock.now();
        self.cached.store(now, Ordering::Relaxed);
        timer.schedule();
        now
    }

    fn start_timer(&self) -> Option<ResetTimer> {
        let window = Duration::from_millis(self.resolution);
        match ResetTimer::spawn(window, Arc::clone(&self.cached)) {
            Ok(timer) => Some(timer),
            Err(err) => {
                warn!(%err, "Failed to start TTL clock timer, reading the clock on every check");
                None
            }
        }
    }

    #[cfg(test)]
    fn timer_started(&self) -> bool {
        self.timer.get().is_some()
    }
}

// == Reset Timer ==
/// A parked thread that clears the cached reading one window after each fill.
///
/// Stops when dropped.
#[derive(Debug)]
struct ResetTimer {
    thread: Thread,
    shutdown: Arc<AtomicBool>,
}

impl ResetTimer {
    fn spawn(window: Duration, cached: Arc<AtomicU64>) -> io::Result<Self> {
        let shutdown = Arc::new(AtomicBool::new(false));
        let stop = Arc::clone(&shutdown);

        let handle = thread::Builder::new()
            .name("arena-lru-clock".to_string())
            .spawn(move || loop {
                thread::park();
                if stop.load(Ordering::Acquire) {
                    break;
                }
                thread::sleep(window);
                cached.store(0, Ordering::Relaxed);
            })?;

        Ok(Self {
            thread: handle.thread().clone(),
            shutdown,
        })
    }

    fn schedule(&self) {
        self.thread.unpark();
    }
}

impl Drop for ResetTimer {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::Release);
        self.thread.unpark();
    }
}
