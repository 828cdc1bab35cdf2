//! System allocator implementation
//!
//! Wraps the process heap (`std::alloc::System`). This is the backing
//! allocator a [`FreeListAllocator`](super::FreeListAllocator) carves its
//! pool chunks from, and the target of every oversized request.

use core::alloc::{GlobalAlloc, Layout};
use core::ptr::NonNull;
use std::alloc::System;

use super::Allocator;
use crate::error::{StlError, StlResult};

/// Wrapper for the system's default allocator
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemAllocator;

impl SystemAllocator {
    /// Creates a new SystemAllocator
    ///
    /// This is a zero-cost operation as the SystemAllocator contains no state.
    #[inline]
    pub const fn new() -> Self {
        SystemAllocator
    }
}

// SAFETY: delegates to `System`, which upholds the GlobalAlloc contract.
// Zero-sized layouts never reach `System`; they get a dangling aligned pointer.
unsafe impl Allocator for SystemAllocator {
    #[inline]
    unsafe fn allocate(&self, layout: Layout) -> StlResult<NonNull<u8>> {
        if layout.size() == 0 {
            // Well-aligned dangling pointer, never dereferenced
            return Ok(NonNull::new(layout.align() as *mut u8).unwrap_or(NonNull::dangling()));
        }

        // SAFETY: layout has non-zero size.
        let ptr = unsafe { System.alloc(layout) };
        NonNull::new(ptr).ok_or_else(|| StlError::out_of_memory_with_layout(layout))
    }

    #[inline]
    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        if layout.size() == 0 {
            return;
        }

        // SAFETY: caller guarantees `ptr` came from `allocate(layout)`.
        unsafe { System.dealloc(ptr.as_ptr(), layout) };
    }

    fn name(&self) -> &'static str {
        "SystemAllocator"
    }
}
