//! Allocators backing every container in the crate
//!
//! The system is built around one unsafe trait, [`Allocator`], with `&self`
//! methods so that several containers can share one allocator by reference
//! (or through `Rc`/`Arc`). Implementations:
//!
//! - [`SystemAllocator`]: the process heap
//! - [`TrackedAllocator`]: call counting and an optional byte limit around another allocator
//! - [`FreeListAllocator`]: the segregated free-list pool (single-threaded)
//! - [`SharedAllocator`]: a pool behind a mutex, for cross-thread use
//! - [`DefaultAllocator`]: handle to a per-thread pool created on first use
//!
//! # Safety
//!
//! Implementors must return pointers that are valid for `layout.size()`
//! bytes, aligned to `layout.align()` and not handed out again until
//! deallocated. Callers must deallocate with the layout they allocated with.

use core::alloc::Layout;
use core::ptr::NonNull;
use std::rc::Rc;
use std::sync::Arc;

use crate::error::{StlError, StlResult};

mod free_list;
pub mod pool;
pub mod shared;
pub mod size_class;
pub mod stats;
pub mod system;
pub mod tracked;

pub use pool::FreeListAllocator;
pub use shared::{DefaultAllocator, SharedAllocator};
pub use size_class::SizeClasses;
pub use stats::PoolStats;
pub use system::SystemAllocator;
pub use tracked::TrackedAllocator;

/// Raw memory allocation interface
///
/// # Safety
///
/// See the [module documentation](self).
pub unsafe trait Allocator {
    /// Allocates memory for `layout`
    ///
    /// # Safety
    /// - Memory content is uninitialized and must be initialized before use
    unsafe fn allocate(&self, layout: Layout) -> StlResult<NonNull<u8>>;

    /// Returns memory to the allocator
    ///
    /// # Safety
    /// - `ptr` must have been allocated by this allocator with `layout`
    /// - `ptr` must not be used after this call
    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout);

    /// Releases `ptr` and allocates a fresh block for `new_layout`
    ///
    /// Always deallocate-then-allocate: contents are not carried over and no
    /// in-place growth is attempted, even when both layouts share a size class.
    ///
    /// # Safety
    /// - Same requirements as [`deallocate`](Self::deallocate) for `ptr` / `old_layout`
    unsafe fn reallocate(
        &self,
        ptr: NonNull<u8>,
        old_layout: Layout,
        new_layout: Layout,
    ) -> StlResult<NonNull<u8>> {
        // SAFETY: caller guarantees `ptr` was allocated here with `old_layout`.
        unsafe {
            self.deallocate(ptr, old_layout);
            self.allocate(new_layout)
        }
    }

    /// Allocator name for debugging
    fn name(&self) -> &'static str {
        core::any::type_name::<Self>()
    }
}

// SAFETY: forwards every call to the referenced allocator unchanged.
unsafe impl<A: Allocator + ?Sized> Allocator for &A {
    #[inline]
    unsafe fn allocate(&self, layout: Layout) -> StlResult<NonNull<u8>> {
        // SAFETY: caller's contract is forwarded.
        unsafe { (**self).allocate(layout) }
    }

    #[inline]
    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        // SAFETY: caller's contract is forwarded.
        unsafe { (**self).deallocate(ptr, layout) }
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}

// SAFETY: forwards every call to the shared allocator unchanged.
unsafe impl<A: Allocator + ?Sized> Allocator for Rc<A> {
    #[inline]
    unsafe fn allocate(&self, layout: Layout) -> StlResult<NonNull<u8>> {
        // SAFETY: caller's contract is forwarded.
        unsafe { (**self).allocate(layout) }
    }

    #[inline]
    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        // SAFETY: caller's contract is forwarded.
        unsafe { (**self).deallocate(ptr, layout) }
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}

// SAFETY: forwards every call to the shared allocator unchanged.
unsafe impl<A: Allocator + ?Sized> Allocator for Arc<A> {
    #[inline]
    unsafe fn allocate(&self, layout: Layout) -> StlResult<NonNull<u8>> {
        // SAFETY: caller's contract is forwarded.
        unsafe { (**self).allocate(layout) }
    }

    #[inline]
    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        // SAFETY: caller's contract is forwarded.
        unsafe { (**self).deallocate(ptr, layout) }
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}

/// Array layout for `n` values of `T`, or `InvalidLayout` on overflow
pub fn array_layout<T>(n: usize) -> StlResult<Layout> {
    Layout::array::<T>(n).map_err(|_| {
        StlError::invalid_layout(
            n.saturating_mul(core::mem::size_of::<T>()),
            core::mem::align_of::<T>(),
        )
    })
}

/// Typed helpers on top of any [`Allocator`]
pub trait TypedAllocator: Allocator {
    /// Allocates uninitialized storage for `n` values of `T`
    ///
    /// # Safety
    /// Same contract as [`Allocator::allocate`].
    unsafe fn allocate_array<T>(&self, n: usize) -> StlResult<NonNull<T>> {
        let layout = array_layout::<T>(n)?;
        // SAFETY: layout is valid; storage is returned uninitialized.
        unsafe { self.allocate(layout) }.map(NonNull::cast)
    }

    /// Releases storage obtained from [`allocate_array`](Self::allocate_array)
    ///
    /// # Safety
    /// `ptr` must come from `allocate_array::<T>(n)` on this allocator with the same `n`.
    unsafe fn deallocate_array<T>(&self, ptr: NonNull<T>, n: usize) {
        if let Ok(layout) = Layout::array::<T>(n) {
            // SAFETY: same layout as the matching allocate_array call.
            unsafe { self.deallocate(ptr.cast(), layout) }
        }
    }
}

impl<A: Allocator + ?Sized> TypedAllocator for A {}
