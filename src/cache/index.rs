//! Index Storage Module
//!
//! Integer arrays whose element width is picked from the cache capacity.

// == Index Vec ==
/// A vector of slot indices stored in the narrowest width able to hold them.
///
/// Bounded caches use u8/u16/u32 storage depending on capacity; unbounded
/// caches (capacity 0) fall back to a plain growable `usize` array.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum IndexVec {
    U8(Vec<u8>),
    U16(Vec<u16>),
    U32(Vec<u32>),
    Wide(Vec<usize>),
}

impl IndexVec {
    // == Constructors ==
    /// Creates a zero-filled array with one element per slot.
    pub(crate) fn zeroed(capacity: usize) -> Self {
        match Self::width_for(capacity) {
            Width::U8 => Self::U8(vec![0; capacity]),
            Width::U16 => Self::U16(vec![0; capacity]),
            Width::U32 => Self::U32(vec![0; capacity]),
            Width::Wide => Self::Wide(vec![0; capacity]),
        }
    }

    /// Creates an empty stack able to hold `capacity` indices without growing.
    pub(crate) fn stack(capacity: usize) -> Self {
        match Self::width_for(capacity) {
            Width::U8 => Self::U8(Vec::with_capacity(capacity)),
            Width::U16 => Self::U16(Vec::with_capacity(capacity)),
            Width::U32 => Self::U32(Vec::with_capacity(capacity)),
            Width::Wide => Self::Wide(Vec::new()),
        }
    }

    fn width_for(capacity: usize) -> Width {
        let capacity = capacity as u64;
        if capacity == 0 {
            Width::Wide
        } else if capacity <= 1 << 8 {
            Width::U8
        } else if capacity <= 1 << 16 {
            Width::U16
        } else if capacity <= 1 << 32 {
            Width::U32
        } else {
            Width::Wide
        }
    }

    // == Access ==
    pub(crate) fn get(&self, i: usize) -> usize {
        match self {
            Self::U8(v) => v[i] as usize,
            Self::U16(v) => v[i] as usize,
            Self::U32(v) => v[i] as usize,
            Self::Wide(v) => v[i],
        }
    }

    pub(crate) fn set(&mut self, i: usize, value: usize) {
        match self {
            Self::U8(v) => v[i] = value as u8,
            Self::U16(v) => v[i] = value as u16,
            Self::U32(v) => v[i] = value as u32,
            Self::Wide(v) => v[i] = value,
        }
    }

    // == Stack Operations ==
    pub(crate) fn push(&mut self, value: usize) {
        match self {
            Self::U8(v) => v.push(value as u8),
            Self::U16(v) => v.push(value as u16),
            Self::U32(v) => v.push(value as u32),
            Self::Wide(v) => v.push(value),
        }
    }

    pub(crate) fn pop(&mut self) -> Option<usize> {
        match self {
            Self::U8(v) => v.pop().map(usize::from),
            Self::U16(v) => v.pop().map(usize::from),
            Self::U32(v) => v.pop().map(|i| i as usize),
            Self::Wide(v) => v.pop(),
        }
    }

    // == Length ==
    pub(crate) fn len(&self) -> usize {
        match self {
            Self::U8(v) => v.len(),
            Self::U16(v) => v.len(),
            Self::U32(v) => v.len(),
            Self::Wide(v) => v.len(),
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Zero-extends or shrinks the array to `len` elements.
    pub(crate) fn resize(&mut self, len: usize) {
        match self {
            Self::U8(v) => v.resize(len, 0),
            Self::U16(v) => v.resize(len, 0),
            Self::U32(v) => v.resize(len, 0),
            Self::Wide(v) => v.resize(len, 0),
        }
    }

    pub(crate) fn clear(&mut self) {
        self.resize(0);
    }
}

#[derive(Debug, Clone, Copy)]
enum Width {
    U8,
    U16,
    U32,
    Wide,
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_width_selection() {
        assert!(matches!(IndexVec::zeroed(1), IndexVec::U8(_)));
        assert!(matches!(IndexVec::zeroed(256), IndexVec::U8(_)));
        assert!(matches!(IndexVec::zeroed(257), IndexVec::U16(_)));
        assert!(matches!(IndexVec::zeroed(65_536), IndexVec::U16(_)));
        assert!(matches!(IndexVec::zeroed(65_537), IndexVec::U32(_)));
        assert!(matches!(IndexVec::zeroed(0), IndexVec::Wide(_)));
    }

    #[test]
    fn test_largest_index_fits_each_width() {
        for capacity in [256usize, 65_536, 65_537] {
            let mut v = IndexVec::zeroed(capacity);
            v.set(0, capacity - 1);
            assert_eq!(v.get(0), capacity - 1);
        }
    }

    #[test]
    fn test_stack_push_pop() {
        let mut stack = IndexVec::stack(10);
        assert!(stack.is_empty());

        stack.push(3);
        stack.push(7);
        assert_eq!(stack.len(), 2);
        assert_eq!(stack.pop(), Some(7));
        assert_eq!(stack.pop(), Some(3));
        assert_eq!(stack.pop(), None);
    }

    #[test]
    fn test_wide_resize() {
        let mut v = IndexVec::zeroed(0);
        v.resize(4);
        v.set(3, 1_000_000);
        assert_eq!(v.len(), 4);
        assert_eq!(v.get(3), 1_000_000);

        v.clear();
        assert!(v.is_empty());
    }
}
