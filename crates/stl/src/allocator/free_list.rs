//! Intrusive singly linked free list
//!
//! A free block stores the link to the next free block in its own first
//! bytes. A block is either on exactly one list (link live) or handed out
//! (all bytes belong to the caller), never both.

use core::ptr::NonNull;

#[repr(C)]
struct FreeBlock {
    next: Option<NonNull<FreeBlock>>,
}

/// LIFO stack of free blocks of one size class
#[derive(Debug)]
pub(crate) struct FreeList {
    head: Option<NonNull<FreeBlock>>,
    len: usize,
}

impl FreeList {
    pub(crate) const EMPTY: Self = Self { head: None, len: 0 };

    /// Pushes `block` onto the list
    ///
    /// # Safety
    /// `block` must be writable for at least one pointer, aligned for a
    /// pointer, and unused by anyone else until popped again.
    #[inline]
    pub(crate) unsafe fn push(&mut self, block: NonNull<u8>) {
        let node = block.cast::<FreeBlock>();
        // SAFETY: caller guarantees the block is ours and large enough for the link.
        unsafe { node.as_ptr().write(FreeBlock { next: self.head }) };
        self.head = Some(node);
        self.len += 1;
    }

    /// Pops the most recently pushed block
    #[inline]
    pub(crate) fn pop(&mut self) -> Option<NonNull<u8>> {
        let node = self.head?;
        // SAFETY: every node on the list carries the link written by `push`.
        self.head = unsafe { node.as_ptr().read().next };
        self.len -= 1;
        Some(node.cast())
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub(crate) fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    /// Whether `ptr` is currently on this list
    pub(crate) fn contains(&self, ptr: NonNull<u8>) -> bool {
        let mut cursor = self.head;
        while let Some(node) = cursor {
            if node.cast::<u8>() == ptr {
                return true;
            }
            // SAFETY: see `pop`.
            cursor = unsafe { node.as_ptr().read().next };
        }
        false
    }
}
