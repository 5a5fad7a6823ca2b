//! Slot Allocator Module
//!
//! Hands out arena slots and recycles freed ones.

use crate::cache::index::IndexVec;

// == Slot Allocator ==
/// Manages the pool of slot ids `0..capacity` and a stack of recycled slots.
///
/// A bounded allocator hands out never-used slots sequentially until the
/// arena has been filled once, then recycles from the free stack. When both
/// are exhausted the allocator [is full](Self::is_full) and the caller must
/// evict and reuse an occupied slot instead of allocating.
/// An unbounded allocator (capacity 0) recycles first and otherwise grows.
#[derive(Debug)]
pub(crate) struct SlotAllocator {
    capacity: usize,
    /// Next never-used slot
    fill: usize,
    free: IndexVec,
}

impl SlotAllocator {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            capacity,
            fill: 0,
            free: IndexVec::stack(capacity),
        }
    }

    // == Allocate ==
    /// Returns a slot to store a new entry in.
    ///
    /// Must not be called while [`is_full`](Self::is_full) holds.
    pub(crate) fn allocate(&mut self) -> usize {
        if self.capacity != 0 && self.fill < self.capacity {
            return self.take_fresh();
        }
        self.free.pop().unwrap_or_else(|| self.take_fresh())
    }

    fn take_fresh(&mut self) -> usize {
        let slot = self.fill;
        self.fill += 1;
        slot
    }

    // == Free ==
    /// Returns a slot to the free stack.
    pub(crate) fn free(&mut self, slot: usize) {
        self.free.push(slot);
    }

    // == Is Full ==
    /// True when the next allocation would require an eviction.
    pub(crate) fn is_full(&self) -> bool {
        self.capacity != 0 && self.fill == self.capacity && self.free.is_empty()
    }

    /// Number of slots handed out at least once since the last reset.
    pub(crate) fn high_water(&self) -> usize {
        self.fill
    }

    // == Reset ==
    pub(crate) fn reset(&mut self) {
        self.fill = 0;
        self.free.clear();
    }
}
