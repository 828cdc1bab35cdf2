//! Buffer geometry and positions inside the map

use core::ptr::NonNull;

/// Target size of one deque buffer in bytes
pub const BUFFER_BYTES: usize = 512;

/// Elements per buffer for `T`
///
/// `BUFFER_BYTES / size_of::<T>()` for elements smaller than `BUFFER_BYTES`,
/// otherwise one element per buffer. Zero-sized types count as one byte.
pub const fn buffer_len<T>() -> usize {
    let size = match core::mem::size_of::<T>() {
        0 => 1,
        size => size,
    };
    if size < BUFFER_BYTES {
        BUFFER_BYTES / size
    } else {
        1
    }
}

/// Array of buffer pointers; `None` outside `[start.node, finish.node]`
pub(crate) type Map<T> = NonNull<Option<NonNull<T>>>;

/// Element position: map slot plus offset inside that slot's buffer
///
/// `offset < buffer_len` always holds. Positions also have a linear form,
/// `node * buffer_len + offset`, which orders them and makes jumps and
/// differences plain arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Position {
    pub(crate) node: usize,
    pub(crate) offset: usize,
}

impl Position {
    #[inline]
    pub(crate) const fn new(node: usize, offset: usize) -> Self {
        Self { node, offset }
    }

    #[inline]
    pub(crate) const fn linear(self, buf: usize) -> usize {
        self.node * buf + self.offset
    }

    #[inline]
    pub(crate) const fn from_linear(linear: usize, buf: usize) -> Self {
        Self {
            node: linear / buf,
            offset: linear % buf,
        }
    }
}

/// Pointer to the element slot at `pos`
///
/// # Safety
/// `pos.node` must be a map slot holding a buffer, and `pos.offset` must be
/// below the buffer length.
#[inline]
pub(crate) unsafe fn slot<T>(map: Map<T>, pos: Position) -> NonNull<T> {
    // SAFETY: caller guarantees the slot is inside the map and holds a buffer.
    unsafe {
        let buffer = *map.as_ptr().add(pos.node);
        debug_assert!(buffer.is_some(), "no buffer at map slot {}", pos.node);
        buffer.unwrap_unchecked().add(pos.offset)
    }
}
