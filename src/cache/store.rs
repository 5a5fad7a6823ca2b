//! Cache Store Module
//!
//! Main cache engine combining arena storage, recency tracking and lazy TTL
//! expiry.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;
use std::iter;
use std::time::Duration;

use tracing::{debug, trace};

use crate::cache::alloc::SlotAllocator;
use crate::cache::list::RecencyList;
use crate::cache::options::{ttl_millis, GetOptions, PeekOptions, SetOptions};
use crate::cache::staleness::StalenessTracker;
use crate::cache::{
    CacheOptions, CacheStats, Clock, RemainingTtl, Snapshot, SnapshotEntry, SystemClock,
};
use crate::error::Result;

// == LRU Cache ==
/// Fixed-capacity LRU cache with optional per-entry TTL.
///
/// Entries live in arena slots; recency is a doubly-linked list of slot
/// indices, and freed slots are recycled through a stack. Expiry is checked
/// lazily on access.
///
/// The cache has a single owner: mutating operations take `&mut self` and
/// no locking happens inside. Wrap it in a lock to share it.
///
/// Each cache that checks TTLs with a nonzero `ttl_resolution` owns one
/// background OS thread, started on its first staleness check and stopped
/// when the cache is dropped. It only clears the debounced clock reading.
/// A resolution of zero avoids the thread at the cost of reading the clock
/// on every check.
#[derive(Debug)]
pub struct LruCache<K, V, C = SystemClock> {
    /// Key to slot lookup
    key_map: HashMap<K, usize>,
    keys: Vec<Option<K>>,
    values: Vec<Option<V>>,
    /// Recency order over occupied slots
    list: RecencyList,
    slots: SlotAllocator,
    /// Created on first use of a nonzero TTL
    staleness: Option<StalenessTracker>,
    clock: C,
    /// 0 = unbounded
    capacity: usize,
    /// Default TTL in milliseconds
    ttl: u64,
    /// Debounce window in milliseconds
    ttl_resolution: u64,
    allow_stale: bool,
    update_age_on_get: bool,
    stats: CacheStats,
}

impl<K, V> LruCache<K, V, SystemClock>
where
    K: Hash + Eq + Clone,
{
    // == Constructors ==
    /// Creates a cache holding at most `capacity` entries (0 = unbounded).
    pub fn new(capacity: usize) -> Result<Self> {
        Self::with_options(CacheOptions::new(capacity))
    }

    /// Creates a cache from options, using the system clock.
    pub fn with_options(options: CacheOptions) -> Result<Self> {
        Self::with_clock(options, SystemClock::new())
    }
}

impl<K, V, C> LruCache<K, V, C>
where
    K: Hash + Eq + Clone,
    C: Clock,
{
    /// Creates a cache from options and an explicit clock.
    ///
    /// Fails with `InvalidCapacity` or `InvalidTtl` before allocating anything.
    pub fn with_clock(options: CacheOptions, clock: C) -> Result<Self> {
        let valid = options.validate()?;
        let capacity = options.capacity;

        let staleness =
            (valid.ttl != 0).then(|| StalenessTracker::new(capacity, valid.ttl_resolution));

        Ok(Self {
            key_map: HashMap::with_capacity(capacity),
            keys: iter::repeat_with(|| None).take(capacity).collect(),
            values: iter::repeat_with(|| None).take(capacity).collect(),
            list: RecencyList::new(capacity),
            slots: SlotAllocator::new(capacity),
            staleness,
            clock,
            capacity,
            ttl: valid.ttl,
            ttl_resolution: valid.ttl_resolution,
            allow_stale: options.allow_stale,
            update_age_on_get: options.update_age_on_get,
            stats: CacheStats::new(),
        })
    }

    // == Set ==
    /// Stores a value under `key` with the cache's default TTL.
    ///
    /// A new key is added as the most recently used entry, evicting the least
    /// recently used one if the cache is full. An existing key has its value
    /// replaced and is moved to most recently used. Either way the entry's
    /// age restarts.
    pub fn set(&mut self, key: K, value: V) -> &mut Self {
        self.insert(key, value, self.ttl);
        self
    }

    /// Like [`set`](Self::set), with per-call overrides.
    ///
    /// Fails with `InvalidTtl` if the TTL override is not a whole number of
    /// milliseconds; the cache is left untouched in that case.
    pub fn set_with(&mut self, key: K, value: V, options: SetOptions) -> Result<&mut Self> {
        let ttl = match options.ttl {
            Some(ttl) => ttl_millis(ttl)?,
            None => self.ttl,
        };
        self.insert(key, value, ttl);
        Ok(self)
    }

    fn insert(&mut self, key: K, value: V, ttl: u64) {
        let existing = self.key_map.get(&key).copied();
        let slot = match existing {
            Some(slot) => {
                self.values[slot] = Some(value);
                self.list.move_to_tail(slot);
                slot
            }
            None => {
                let slot = self.acquire_slot();
                self.keys[slot] = Some(key.clone());
                self.values[slot] = Some(value);
                self.key_map.insert(key, slot);
                self.list.link_at_tail(slot);
                slot
            }
        };

        if ttl != 0 && self.staleness.is_none() {
            self.staleness = Some(StalenessTracker::new(self.capacity, self.ttl_resolution));
        }
        if let Some(tracker) = &mut self.staleness {
            tracker.set_item_ttl(slot, ttl, &self.clock);
        }
    }

    /// Finds a slot for a new entry, evicting the least recently used one if
    /// every slot is taken.
    fn acquire_slot(&mut self) -> usize {
        let slot = match self.list.head() {
            // a full allocator means every slot is linked, so a head exists
            Some(head) if self.slots.is_full() => {
                self.evict(head);
                head
            }
            _ => self.slots.allocate(),
        };

        if slot >= self.keys.len() {
            self.keys.resize_with(slot + 1, || None);
            self.values.resize_with(slot + 1, || None);
            self.list.grow_to(slot + 1);
        }
        slot
    }

    /// Drops the entry in `slot` so the slot can be reused in place.
    fn evict(&mut self, slot: usize) {
        self.list.unlink(slot);
        if let Some(key) = self.keys[slot].take() {
            self.key_map.remove(&key);
        }
        self.values[slot] = None;
        if let Some(tracker) = &mut self.staleness {
            tracker.clear_slot(slot);
        }
        self.stats.record_eviction();
        trace!(slot, "Evicted least recently used entry");
    }

    // == Get ==
    /// Returns the value for `key` and marks it most recently used.
    ///
    /// A stale entry is removed and reported as absent (or returned one last
    /// time when `allow_stale` is configured).
    pub fn get<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
        V: Clone,
    {
        self.get_with(key, GetOptions::default())
    }

    /// Like [`get`](Self::get), with per-call overrides.
    pub fn get_with<Q>(&mut self, key: &Q, options: GetOptions) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
        V: Clone,
    {
        let allow_stale = options.allow_stale.unwrap_or(self.allow_stale);
        let update_age = options.update_age_on_get.unwrap_or(self.update_age_on_get);

        let Some(slot) = self.key_map.get(key).copied() else {
            self.stats.record_miss();
            return None;
        };

        if self.is_stale(slot) {
            self.stats.record_miss();
            let value = self.remove_slot(slot);
            return if allow_stale { value } else { None };
        }

        self.list.move_to_tail(slot);
        if update_age {
            if let Some(tracker) = &mut self.staleness {
                tracker.update_item_age(slot, &self.clock);
            }
        }
        self.stats.record_hit();
        self.values[slot].clone()
    }

    // == Peek ==
    /// Returns the value for `key` without touching recency or removing
    /// stale entries.
    pub fn peek<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.peek_with(key, PeekOptions::default())
    }

    /// Like [`peek`](Self::peek), with per-call overrides.
    pub fn peek_with<Q>(&self, key: &Q, options: PeekOptions) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let allow_stale = options.allow_stale.unwrap_or(self.allow_stale);
        let slot = *self.key_map.get(key)?;
        if !allow_stale && self.is_stale(slot) {
            return None;
        }
        self.values[slot].as_ref()
    }

    // == Has ==
    /// True if `key` is present and not stale. Never mutates the cache.
    pub fn has<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.key_map
            .get(key)
            .is_some_and(|&slot| !self.is_stale(slot))
    }

    // == Delete ==
    /// Removes `key`. Returns whether anything was removed.
    pub fn delete<Q>(&mut self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        match self.key_map.get(key).copied() {
            Some(slot) => {
                self.remove_slot(slot);
                true
            }
            None => false,
        }
    }

    // == Pop ==
    /// Removes the least recently used entry and returns its value.
    pub fn pop(&mut self) -> Option<V> {
        let head = self.list.head()?;
        self.remove_slot(head)
    }

    /// Unlinks a slot and returns it to the free stack.
    fn remove_slot(&mut self, slot: usize) -> Option<V> {
        if self.list.len() == 1 {
            let value = self.values[slot].take();
            self.reset();
            return value;
        }

        self.list.unlink(slot);
        if let Some(key) = self.keys[slot].take() {
            self.key_map.remove(&key);
        }
        if let Some(tracker) = &mut self.staleness {
            tracker.clear_slot(slot);
        }
        self.slots.free(slot);
        self.values[slot].take()
    }

    // == Clear ==
    /// Removes every entry and resets the arena.
    pub fn clear(&mut self) {
        let removed = self.len();
        self.reset();
        debug!(removed, "Cache cleared");
    }

    fn reset(&mut self) {
        // slots past the high-water mark were never written
        let used = self.slots.high_water();
        self.key_map.clear();
        if self.capacity == 0 {
            self.keys.clear();
            self.values.clear();
        } else {
            self.keys[..used].fill_with(|| None);
            self.values[..used].fill_with(|| None);
        }
        if let Some(tracker) = &mut self.staleness {
            tracker.clear(used);
        }
        self.list.clear();
        self.slots.reset();
    }

    // == Remaining TTL ==
    /// Time left before `key` goes stale.
    ///
    /// `Unlimited` for entries without a TTL, zero for absent keys.
    pub fn remaining_ttl<Q>(&self, key: &Q) -> RemainingTtl
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let Some(&slot) = self.key_map.get(key) else {
            return RemainingTtl::Expires(Duration::ZERO);
        };
        match &self.staleness {
            Some(tracker) => tracker.remaining(slot, &self.clock),
            None => RemainingTtl::Unlimited,
        }
    }

    fn is_stale(&self, slot: usize) -> bool {
        self.staleness
            .as_ref()
            .is_some_and(|tracker| tracker.is_stale(slot, &self.clock))
    }

    // == Dump ==
    /// Snapshots the cache from least to most recently used.
    ///
    /// Stale entries are left out unless the cache allows stale reads.
    pub fn dump(&self) -> Snapshot<K, V>
    where
        V: Clone,
    {
        self.list
            .iter()
            .filter(|&slot| self.allow_stale || !self.is_stale(slot))
            .filter_map(|slot| {
                let key = self.keys[slot].clone()?;
                let value = self.values[slot].clone()?;
                let (ttl, start) = self
                    .staleness
                    .as_ref()
                    .map_or((0, 0), |tracker| tracker.entry(slot));
                Some((key, SnapshotEntry { value, ttl, start }))
            })
            .collect()
    }

    // == Load ==
    /// Replaces the cache contents with a snapshot.
    ///
    /// Entries are inserted in order, so recency is preserved and, if the
    /// snapshot is larger than this cache, the oldest entries are evicted.
    /// Each entry keeps its own TTL, but its age restarts at load time; the
    /// snapshot's `start` readings are ignored.
    ///
    /// Snapshot entries dropped to fit the capacity never lived in this cache
    /// and are not counted as evictions.
    pub fn load<I>(&mut self, entries: I)
    where
        I: IntoIterator<Item = (K, SnapshotEntry<V>)>,
    {
        self.reset();
        let evictions = self.stats.evictions;
        let mut count = 0usize;
        for (key, entry) in entries {
            self.insert(key, entry.value, entry.ttl);
            count += 1;
        }
        self.stats.evictions = evictions;
        debug!(entries = count, size = self.len(), "Loaded snapshot");
    }

    // == Iteration ==
    /// Iterates fresh entries from most to least recently used, without
    /// touching recency.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> + '_ {
        self.list
            .iter()
            .rev()
            .filter(move |&slot| !self.is_stale(slot))
            .filter_map(move |slot| Some((self.keys[slot].as_ref()?, self.values[slot].as_ref()?)))
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> + '_ {
        self.iter().map(|(key, _)| key)
    }

    pub fn values(&self) -> impl Iterator<Item = &V> + '_ {
        self.iter().map(|(_, value)| value)
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.total_entries = self.len();
        stats
    }

    // == Accessors ==
    /// Number of entries, including stale ones not yet removed.
    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    /// Maximum number of entries, 0 = unbounded.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn default_ttl(&self) -> Duration {
        Duration::from_millis(self.ttl)
    }

    pub fn ttl_resolution(&self) -> Duration {
        Duration::from_millis(self.ttl_resolution)
    }

    pub fn allow_stale(&self) -> bool {
        self.allow_stale
    }

    pub fn update_age_on_get(&self) -> bool {
        self.update_age_on_get
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }
}
