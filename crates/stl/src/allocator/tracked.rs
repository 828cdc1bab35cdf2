//! Tracked allocator implementation
//!
//! Wraps another allocator and counts every call that reaches it. Used to
//! observe how often a pool goes back to the system (refill batching,
//! chunk growth) and, through [`TrackedAllocator::with_limit`], to simulate
//! exhaustion of the backing allocator.
//!
//! ## Invariants
//!
//! - Every successful allocation is counted and adds to `allocated_bytes`
//! - Every deallocation subtracts its layout size again
//! - Failed allocations only bump the failure count

use core::alloc::Layout;
use core::ptr::NonNull;
use core::sync::atomic::{AtomicUsize, Ordering};

use super::Allocator;
use crate::error::{StlError, StlResult};

/// A wrapper allocator that tracks memory usage statistics
#[derive(Debug)]
pub struct TrackedAllocator<A> {
    inner: A,
    limit: Option<usize>,
    allocations: AtomicUsize,
    deallocations: AtomicUsize,
    failed: AtomicUsize,
    allocated: AtomicUsize,
    peak: AtomicUsize,
}

impl<A> TrackedAllocator<A> {
    /// Creates a new TrackedAllocator wrapping the provided allocator
    pub fn new(allocator: A) -> Self {
        Self {
            inner: allocator,
            limit: None,
            allocations: AtomicUsize::new(0),
            deallocations: AtomicUsize::new(0),
            failed: AtomicUsize::new(0),
            allocated: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        }
    }

    /// Creates a tracker that refuses requests once `limit` bytes are live
    pub fn with_limit(allocator: A, limit: usize) -> Self {
        Self {
            limit: Some(limit),
            ..Self::new(allocator)
        }
    }

    /// Gets a reference to the underlying allocator
    pub fn inner(&self) -> &A {
        &self.inner
    }

    /// Byte limit, if any
    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    /// Returns the total bytes currently allocated
    pub fn allocated_bytes(&self) -> usize {
        self.allocated.load(Ordering::Relaxed)
    }

    /// Returns the peak bytes allocated
    pub fn peak_allocated_bytes(&self) -> usize {
        self.peak.load(Ordering::Relaxed)
    }

    /// Returns the total number of allocations performed
    pub fn allocation_count(&self) -> usize {
        self.allocations.load(Ordering::Relaxed)
    }

    /// Returns the total number of deallocations performed
    pub fn deallocation_count(&self) -> usize {
        self.deallocations.load(Ordering::Relaxed)
    }

    /// Returns the number of failed allocations
    pub fn failed_allocations(&self) -> usize {
        self.failed.load(Ordering::Relaxed)
    }

    /// Check if there are any memory leaks (allocations > deallocations)
    pub fn has_leaks(&self) -> bool {
        self.allocation_count() > self.deallocation_count()
    }

    fn would_exceed(&self, size: usize) -> bool {
        self.limit
            .is_some_and(|limit| self.allocated_bytes().saturating_add(size) > limit)
    }
}

// SAFETY: forwards to the inner allocator with the caller's contract intact.
// Counting is a side effect only; a refused request never reaches `inner`.
unsafe impl<A: Allocator> Allocator for TrackedAllocator<A> {
    unsafe fn allocate(&self, layout: Layout) -> StlResult<NonNull<u8>> {
        if self.would_exceed(layout.size()) {
            self.failed.fetch_add(1, Ordering::Relaxed);
            return Err(StlError::out_of_memory_with_layout(layout));
        }

        // SAFETY: caller's contract is forwarded.
        match unsafe { self.inner.allocate(layout) } {
            Ok(ptr) => {
                self.allocations.fetch_add(1, Ordering::Relaxed);
                let now = self.allocated.fetch_add(layout.size(), Ordering::Relaxed) + layout.size();
                self.peak.fetch_max(now, Ordering::Relaxed);
                Ok(ptr)
            }
            Err(err) => {
                self.failed.fetch_add(1, Ordering::Relaxed);
                Err(err)
            }
        }
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        // SAFETY: caller's contract is forwarded.
        unsafe { self.inner.deallocate(ptr, layout) };
        self.deallocations.fetch_add(1, Ordering::Relaxed);
        self.allocated.fetch_sub(layout.size(), Ordering::Relaxed);
    }

    fn name(&self) -> &'static str {
        "TrackedAllocator"
    }
}
