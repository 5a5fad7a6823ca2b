//! Recency List Module
//!
//! Doubly-linked list over arena slots, stored as parallel index arrays.

use crate::cache::index::IndexVec;

// == Recency List ==
/// Tracks access order for LRU eviction.
///
/// - Head = least recently used
/// - Tail = most recently used
///
/// Links of slots outside the list are garbage and never followed; walking
/// is bounded by `len`.
#[derive(Debug)]
pub(crate) struct RecencyList {
    next: IndexVec,
    prev: IndexVec,
    head: usize,
    tail: usize,
    len: usize,
}

impl RecencyList {
    // == Constructor ==
    /// Creates an empty list over `capacity` slots (0 = growable).
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            next: IndexVec::zeroed(capacity),
            prev: IndexVec::zeroed(capacity),
            head: 0,
            tail: 0,
            len: 0,
        }
    }

    /// Makes room for slots `0..slots` in a growable list.
    pub(crate) fn grow_to(&mut self, slots: usize) {
        if self.next.len() < slots {
            self.next.resize(slots);
            self.prev.resize(slots);
        }
    }

    fn connect(&mut self, prev: usize, next: usize) {
        self.prev.set(next, prev);
        self.next.set(prev, next);
    }

    // == Link At Tail ==
    /// Appends a slot that is not currently in the list.
    pub(crate) fn link_at_tail(&mut self, slot: usize) {
        if self.len == 0 {
            self.head = slot;
        } else {
            self.connect(self.tail, slot);
        }
        self.tail = slot;
        self.len += 1;
    }

    // == Move To Tail ==
    /// Marks a linked slot as most recently used.
    pub(crate) fn move_to_tail(&mut self, slot: usize) {
        if slot == self.tail {
            return;
        }
        if slot == self.head {
            self.head = self.next.get(slot);
        } else {
            self.connect(self.prev.get(slot), self.next.get(slot));
        }
        self.connect(self.tail, slot);
        self.tail = slot;
    }

    // == Unlink ==
    /// Removes a linked slot from the list.
    pub(crate) fn unlink(&mut self, slot: usize) {
        match self.len {
            0 => return,
            1 => {
                self.head = 0;
                self.tail = 0;
            }
            _ if slot == self.tail => self.tail = self.prev.get(slot),
            _ if slot == self.head => self.head = self.next.get(slot),
            _ => self.connect(self.prev.get(slot), self.next.get(slot)),
        }
        self.len -= 1;
    }

    // == Accessors ==
    /// The least recently used slot, if any.
    pub(crate) fn head(&self) -> Option<usize> {
        (self.len > 0).then_some(self.head)
    }

    /// The most recently used slot, if any.
    #[cfg(test)]
    pub(crate) fn tail(&self) -> Option<usize> {
        (self.len > 0).then_some(self.tail)
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Walks slots from head (LRU) to tail (MRU); reverse with `.rev()`.
    pub(crate) fn iter(&self) -> Iter<'_> {
        Iter {
            list: self,
            front: self.head,
            back: self.tail,
            remaining: self.len,
        }
    }

    // == Clear ==
    pub(crate) fn clear(&mut self) {
        self.head = 0;
        self.tail = 0;
        self.len = 0;
        if let IndexVec::Wide(_) = self.next {
            self.next.clear();
            self.prev.clear();
        }
    }
}

// == Iterator ==
pub(crate) struct Iter<'a> {
    list: &'a RecencyList,
    front: usize,
    back: usize,
    remaining: usize,
}

impl Iterator for Iter<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        if self.remaining == 0 {
            return None;
        }
        let slot = self.front;
        self.remaining -= 1;
        if self.remaining > 0 {
            self.front = self.list.next.get(slot);
        }
        Some(slot)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl DoubleEndedIterator for Iter<'_> {
    fn next_back(&mut self) -> Option<usize> {
        if self.remaining == 0 {
            return None;
        }
        let slot = self.back;
        self.remaining -= 1;
        if self.remaining > 0 {
            self.back = self.list.prev.get(slot);
        }
        Some(slot)
    }
}

impl ExactSizeIterator for Iter<'_> {}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    fn order(list: &RecencyList) -> Vec<usize> {
        list.iter().collect()
    }

    fn filled(slots: &[usize]) -> RecencyList {
        let mut list = RecencyList::new(8);
        for &slot in slots {
            list.link_at_tail(slot);
        }
        list
    }

    #[test]
    fn test_list_new() {
        let list = RecencyList::new(4);
        assert!(list.is_empty());
        assert_eq!(list.head(), None);
        assert_eq!(list.tail(), None);
    }

    #[test]
    fn test_link_at_tail() {
        let list = filled(&[0, 1, 2]);

        assert_eq!(list.len(), 3);
        assert_eq!(list.head(), Some(0));
        assert_eq!(list.tail(), Some(2));
        assert_eq!(order(&list), vec![0, 1, 2]);
    }

    #[test]
    fn test_move_tail_is_noop() {
        let mut list = filled(&[0, 1, 2]);
        list.move_to_tail(2);
        assert_eq!(order(&list), vec![0, 1, 2]);
    }

    #[test]
    fn test_move_head_to_tail() {
        let mut list = filled(&[0, 1, 2]);
        list.move_to_tail(0);

        assert_eq!(list.head(), Some(1));
        assert_eq!(order(&list), vec![1, 2, 0]);
    }

    #[test]
    fn test_move_middle_to_tail() {
        let mut list = filled(&[0, 1, 2, 3]);
        list.move_to_tail(1);
        list.move_to_tail(2);

        assert_eq!(order(&list), vec![0, 3, 1, 2]);
        assert_eq!(list.iter().rev().collect::<Vec<_>>(), vec![2, 1, 3, 0]);
    }

    #[test]
    fn test_unlink_tail() {
        let mut list = filled(&[0, 1, 2]);
        list.unlink(2);

        assert_eq!(list.tail(), Some(1));
        assert_eq!(order(&list), vec![0, 1]);

        // the new tail must accept appends
        list.link_at_tail(5);
        assert_eq!(order(&list), vec![0, 1, 5]);
    }

    #[test]
    fn test_unlink_head() {
        let mut list = filled(&[0, 1, 2]);
        list.unlink(0);

        assert_eq!(list.head(), Some(1));
        assert_eq!(order(&list), vec![1, 2]);
    }

    #[test]
    fn test_unlink_middle() {
        let mut list = filled(&[0, 1, 2]);
        list.unlink(1);

        assert_eq!(order(&list), vec![0, 2]);
        assert_eq!(list.iter().rev().collect::<Vec<_>>(), vec![2, 0]);
    }

    #[test]
    fn test_unlink_single() {
        let mut list = filled(&[4]);
        list.unlink(4);

        assert!(list.is_empty());
        assert_eq!(order(&list), Vec::<usize>::new());

        list.link_at_tail(3);
        assert_eq!(list.head(), Some(3));
        assert_eq!(list.tail(), Some(3));
    }

    #[test]
    fn test_unlink_all_then_reuse() {
        let mut list = filled(&[0, 1, 2]);
        list.unlink(1);
        list.unlink(0);
        list.unlink(2);
        assert!(list.is_empty());

        list.link_at_tail(2);
        list.link_at_tail(0);
        assert_eq!(order(&list), vec![2, 0]);
    }

    #[test]
    fn test_growable_list() {
        let mut list = RecencyList::new(0);
        for slot in 0..3 {
            list.grow_to(slot + 1);
            list.link_at_tail(slot);
        }
        list.move_to_tail(0);
        assert_eq!(order(&list), vec![1, 2, 0]);

        list.clear();
        assert!(list.is_empty());
        list.grow_to(1);
        list.link_at_tail(0);
        assert_eq!(order(&list), vec![0]);
    }
}
