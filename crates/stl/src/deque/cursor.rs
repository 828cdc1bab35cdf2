//! Random-access cursor over deque positions

use core::fmt;
use core::marker::PhantomData;

use super::buffer::{self, Map, Position, buffer_len};
use crate::iter::{
    BidirectionalCursor, Cursor, ForwardCursor, InputCursor, RandomAccessCursor,
    RandomAccessIteratorTag,
};

/// Cursor into a [`Deque`](super::Deque)
///
/// Stepping crosses buffer boundaries; jumps and differences go through the
/// linear form of the position, so both are constant time.
pub struct DequeCursor<'a, T> {
    map: Map<T>,
    pos: Position,
    _marker: PhantomData<&'a T>,
}

// SAFETY: a cursor only reads through the map, like `&T`.
unsafe impl<T: Sync> Send for DequeCursor<'_, T> {}
// SAFETY: as above.
unsafe impl<T: Sync> Sync for DequeCursor<'_, T> {}

impl<'a, T> DequeCursor<'a, T> {
    const BUF: usize = buffer_len::<T>();

    pub(super) fn new(map: Map<T>, pos: Position) -> Self {
        Self {
            map,
            pos,
            _marker: PhantomData,
        }
    }

    /// Map slot of the buffer this cursor points into
    pub fn node(&self) -> usize {
        self.pos.node
    }

    /// Offset inside the current buffer
    pub fn offset(&self) -> usize {
        self.pos.offset
    }

    #[inline]
    fn linear(&self) -> usize {
        self.pos.linear(Self::BUF)
    }
}

impl<T> Clone for DequeCursor<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for DequeCursor<'_, T> {}

impl<T> PartialEq for DequeCursor<'_, T> {
    fn eq(&self, other: &Self) -> bool {
        self.pos == other.pos && self.map == other.map
    }
}

impl<T> fmt::Debug for DequeCursor<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DequeCursor")
            .field("node", &self.pos.node)
            .field("offset", &self.pos.offset)
            .finish()
    }
}

impl<T> Cursor for DequeCursor<'_, T> {
    type Category = RandomAccessIteratorTag;
    type Value = T;
}

impl<'a, T> InputCursor for DequeCursor<'a, T> {
    #[inline]
    unsafe fn get(&self) -> &T {
        // SAFETY: caller guarantees the cursor is on a live element, which
        // lives in an allocated buffer for `'a`.
        unsafe { buffer::slot(self.map, self.pos).as_ref() }
    }

    #[inline]
    fn step(&mut self) {
        self.pos.offset += 1;
        if self.pos.offset == Self::BUF {
            self.pos = Position::new(self.pos.node + 1, 0);
        }
    }
}

impl<T> ForwardCursor for DequeCursor<'_, T> {}

impl<T> BidirectionalCursor for DequeCursor<'_, T> {
    #[inline]
    fn step_back(&mut self) {
        if self.pos.offset == 0 {
            self.pos = Position::new(self.pos.node.wrapping_sub(1), Self::BUF - 1);
        } else {
            self.pos.offset -= 1;
        }
    }
}

impl<T> RandomAccessCursor for DequeCursor<'_, T> {
    #[inline]
    fn jump(&mut self, n: isize) {
        self.pos = Position::from_linear(self.linear().wrapping_add_signed(n), Self::BUF);
    }

    #[inline]
    fn distance_from(&self, origin: &Self) -> isize {
        self.linear().wrapping_sub(origin.linear()) as isize
    }
}

#[cfg(test)]
mod tests {
    use crate::deque::Deque;
    use crate::iter::{self, CategoryKind, InputCursor, RandomAccessCursor, category_of};

    #[test]
    fn test_cursor_pair_is_sendable() {
        let deque: Deque<u64> = (0..300).collect();
        let (first, last) = (deque.begin(), deque.end());
        let len = std::thread::scope(|s| s.spawn(move || iter::distance(&first, &last)).join().unwrap());
        assert_eq!(len, 300);
    }

    #[test]
    fn test_cursor_walks_across_buffers() {
        let deque: Deque<[u8; 200]> = (0..7u8).map(|i| [i; 200]).collect();
        assert_eq!(deque.buffer_len(), 2);

        let mut at = deque.begin();
        let end = deque.end();
        let mut seen = Vec::new();
        while at != end {
            seen.push(unsafe { at.get()[0] });
            iter::advance(&mut at, 1);
        }
        assert_eq!(seen, [0, 1, 2, 3, 4, 5, 6]);
        assert_eq!(iter::distance(&deque.begin(), &end), 7);
    }

    #[test]
    fn test_jump_and_step_back() {
        let mut deque: Deque<u32> = Deque::new();
        for i in 0..300 {
            deque.push_front(i);
        }

        let mut at = deque.cursor_at(250);
        assert_eq!(unsafe { *at.get() }, 49);
        at.jump(-200);
        assert_eq!(unsafe { *at.get() }, 249);
        let back = iter::prev(&at, 3);
        assert_eq!(unsafe { *back.get() }, 252);
        assert_eq!(at.distance_from(&back), 3);
    }

    #[test]
    fn test_cursor_feeds_binary_search() {
        let deque: Deque<i64> = (0..1000).map(|i| i * 2).collect();
        let first = deque.begin();
        let last = deque.end();

        let hit = unsafe { iter::lower_bound(first, last, &777) };
        assert_eq!(iter::distance(&first, &hit), 389);
        assert!(unsafe { iter::binary_search(first, last, &1998) });
        assert!(!unsafe { iter::binary_search(first, last, &7) });
        assert_eq!(category_of::<crate::deque::DequeCursor<'_, i64>>(), CategoryKind::RandomAccess);
    }
}
