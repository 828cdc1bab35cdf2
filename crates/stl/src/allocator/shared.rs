//! Process-wide and per-thread access to free-list pools
//!
//! - [`SharedAllocator`] puts one pool behind a `parking_lot::Mutex`; every
//!   allocation and deallocation takes the lock.
//! - [`DefaultAllocator`] is a zero-sized handle to a pool owned by the
//!   current thread. The pool is created on first use and released when the
//!   thread exits. The handle is `!Send`, so containers using it stay on the
//!   thread whose pool owns their memory.

use core::alloc::Layout;
use core::marker::PhantomData;
use core::ptr::NonNull;

use parking_lot::Mutex;

use super::{Allocator, FreeListAllocator, PoolStats, SystemAllocator};
use crate::config::AllocatorConfig;
use crate::error::{StlError, StlResult};

/// Free-list pool shared between threads
#[derive(Debug)]
pub struct SharedAllocator<B: Allocator = SystemAllocator> {
    inner: Mutex<FreeListAllocator<B>>,
}

impl SharedAllocator {
    /// Creates a shared pool over the system heap
    pub fn new() -> Self {
        Self::from_pool(FreeListAllocator::new())
    }

    /// Creates a shared pool with a custom configuration
    ///
    /// # Errors
    /// Returns `InvalidConfig` if the configuration is rejected.
    pub fn with_config(config: AllocatorConfig) -> StlResult<Self> {
        FreeListAllocator::with_config(config).map(Self::from_pool)
    }
}

impl Default for SharedAllocator {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: Allocator> SharedAllocator<B> {
    /// Wraps an existing pool
    pub fn from_pool(pool: FreeListAllocator<B>) -> Self {
        Self {
            inner: Mutex::new(pool),
        }
    }

    /// Runs `f` with the pool locked
    pub fn with_pool<R>(&self, f: impl FnOnce(&FreeListAllocator<B>) -> R) -> R {
        f(&self.inner.lock())
    }

    /// Statistics snapshot of the underlying pool
    pub fn stats(&self) -> Option<PoolStats> {
        self.inner.lock().stats()
    }

    /// Consumes the wrapper and returns the pool
    pub fn into_inner(self) -> FreeListAllocator<B> {
        self.inner.into_inner()
    }
}

// SAFETY: every call is forwarded to the pool while holding the lock.
unsafe impl<B: Allocator> Allocator for SharedAllocator<B> {
    unsafe fn allocate(&self, layout: Layout) -> StlResult<NonNull<u8>> {
        // SAFETY: caller's contract is forwarded.
        unsafe { self.inner.lock().allocate(layout) }
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        // SAFETY: caller's contract is forwarded.
        unsafe { self.inner.lock().deallocate(ptr, layout) }
    }

    fn name(&self) -> &'static str {
        "SharedAllocator"
    }
}

thread_local! {
    static THREAD_POOL: FreeListAllocator = FreeListAllocator::new();
}

/// Handle to the current thread's free-list pool
///
/// This is the allocator containers use when none is given.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultAllocator {
    _not_send: PhantomData<*const ()>,
}

impl DefaultAllocator {
    /// Handle to this thread's pool
    pub const fn new() -> Self {
        Self {
            _not_send: PhantomData,
        }
    }

    /// Runs `f` with this thread's pool
    pub fn with_pool<R>(f: impl FnOnce(&FreeListAllocator) -> R) -> R {
        THREAD_POOL.with(f)
    }

    /// Statistics snapshot of this thread's pool
    pub fn stats() -> Option<PoolStats> {
        THREAD_POOL.with(FreeListAllocator::stats)
    }
}

// SAFETY: forwards to the thread-local pool. Once the pool has been torn down
// at thread exit, allocation fails and deallocation leaks.
unsafe impl Allocator for DefaultAllocator {
    unsafe fn allocate(&self, layout: Layout) -> StlResult<NonNull<u8>> {
        THREAD_POOL
            // SAFETY: caller's contract is forwarded.
            .try_with(|pool| unsafe { pool.allocate(layout) })
            .unwrap_or_else(|_| Err(StlError::out_of_memory_with_layout(layout)))
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        // SAFETY: caller's contract is forwarded; the handle is `!Send`, so
        // `ptr` came from this same thread's pool.
        let _ = THREAD_POOL.try_with(|pool| unsafe { pool.deallocate(ptr, layout) });
    }

    fn name(&self) -> &'static str {
        "DefaultAllocator"
    }
}
