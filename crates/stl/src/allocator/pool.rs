//! Segregated free-list allocator
//!
//! Small requests (up to `max_bytes`, default 128) are rounded up to a
//! multiple of `align` (default 8) and served from one of the per-class
//! free lists. Empty lists are refilled in batches carved from a shared
//! pool chunk; the chunk grows geometrically from the backing allocator.
//! Larger requests go straight to the backing allocator.
//!
//! # Memory Layout
//! ```text
//! class 0 (8)   : [blk] -> [blk] -> [blk] -> None
//! class 2 (24)  : [blk] -> None
//! ...
//! pool chunk    : [carved | carved | ......... remainder ........]
//!                                    ^pool_start      pool_left^
//! ```
//!
//! # Refill
//! When a class list is empty, a batch of `refill_batch` blocks is carved
//! from the pool. If the pool cannot supply the whole batch it supplies as
//! many whole blocks as fit; if it cannot supply even one, the remainder is
//! salvaged onto its own class list and a chunk of
//! `2 * batch_bytes + round_up(heap_size / 16)` is requested. If that fails,
//! a free block of the requested class or larger is adopted as the pool.
//! Only when that also fails is the request reported as out of memory.
//!
//! Memory is never returned to the backing allocator before the pool
//! itself is dropped.

use core::alloc::Layout;
use core::cell::RefCell;
use core::ptr::NonNull;

#[cfg(feature = "logging")]
use tracing::{debug, trace};

use super::free_list::FreeList;
use super::size_class::SizeClasses;
use super::stats::{PoolCounters, PoolStats};
use super::{Allocator, SystemAllocator};
use crate::config::{AllocatorConfig, MAX_SIZE_CLASSES};
use crate::error::{StlError, StlResult};

/// Segregated free-list pool allocator
///
/// Single-threaded: all methods take `&self` and keep their state in a
/// `RefCell`. Share one pool between containers by reference or `Rc`; wrap
/// it in a [`SharedAllocator`](super::SharedAllocator) for cross-thread use.
#[derive(Debug)]
pub struct FreeListAllocator<B: Allocator = SystemAllocator> {
    backing: B,
    config: AllocatorConfig,
    classes: SizeClasses,
    state: RefCell<PoolState>,
}

#[derive(Debug)]
struct PoolState {
    free_lists: [FreeList; MAX_SIZE_CLASSES],
    pool_start: Option<NonNull<u8>>,
    pool_left: usize,
    heap_size: usize,
    chunks: Vec<(NonNull<u8>, Layout)>,
    counters: PoolCounters,
}

impl PoolState {
    fn new() -> Self {
        Self {
            free_lists: [FreeList::EMPTY; MAX_SIZE_CLASSES],
            pool_start: None,
            pool_left: 0,
            heap_size: 0,
            chunks: Vec::new(),
            counters: PoolCounters::default(),
        }
    }
}

impl FreeListAllocator {
    /// Creates a pool over the system heap with the default configuration
    pub fn new() -> Self {
        Self::with_backing(SystemAllocator::new())
    }

    /// Creates a pool over the system heap with a custom configuration
    ///
    /// # Errors
    /// Returns `InvalidConfig` if `config.validate()` fails.
    pub fn with_config(config: AllocatorConfig) -> StlResult<Self> {
        Self::with_config_and_backing(config, SystemAllocator::new())
    }
}

impl Default for FreeListAllocator {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: Allocator> FreeListAllocator<B> {
    /// Creates a pool carving its chunks from `backing`
    pub fn with_backing(backing: B) -> Self {
        let config = AllocatorConfig::default();
        Self {
            backing,
            classes: SizeClasses::from_config(&config),
            config,
            state: RefCell::new(PoolState::new()),
        }
    }

    /// Creates a pool with both a custom configuration and backing allocator
    ///
    /// # Errors
    /// Returns `InvalidConfig` if `config.validate()` fails.
    pub fn with_config_and_backing(config: AllocatorConfig, backing: B) -> StlResult<Self> {
        config.validate()?;
        Ok(Self {
            backing,
            classes: SizeClasses::from_config(&config),
            config,
            state: RefCell::new(PoolState::new()),
        })
    }

    /// Active configuration
    pub fn config(&self) -> &AllocatorConfig {
        &self.config
    }

    /// Size-class mapping
    pub fn size_classes(&self) -> SizeClasses {
        self.classes
    }

    /// Allocator the pool grows from
    pub fn backing(&self) -> &B {
        &self.backing
    }

    /// Total bytes obtained from the backing allocator so far
    pub fn heap_size(&self) -> usize {
        self.state.borrow().heap_size
    }

    /// Free blocks currently on the list serving `bytes`
    pub fn free_blocks(&self, bytes: usize) -> usize {
        if !self.classes.is_pooled(bytes) {
            return 0;
        }
        self.state.borrow().free_lists[self.classes.index(bytes)].len()
    }

    /// Whether `ptr` sits on the free list serving `bytes`
    pub fn is_free(&self, ptr: NonNull<u8>, bytes: usize) -> bool {
        self.classes.is_pooled(bytes)
            && self.state.borrow().free_lists[self.classes.index(bytes)].contains(ptr)
    }

    /// Whether a layout is served from the free lists
    #[inline]
    pub fn serves(&self, layout: Layout) -> bool {
        self.classes.is_pooled(layout.size()) && layout.align() <= self.classes.align()
    }

    /// Allocates `bytes` bytes aligned to `config.align`
    ///
    /// Pooled requests pop the head of their class list, refilling it first
    /// when empty. Zero-byte requests are served from the smallest class.
    ///
    /// # Errors
    /// `OutOfMemory` once the free lists, the pool and the backing allocator
    /// are all exhausted.
    pub fn allocate_bytes(&self, bytes: usize) -> StlResult<NonNull<u8>> {
        if !self.classes.is_pooled(bytes) {
            return self.allocate_oversized(bytes);
        }

        let index = self.classes.index(bytes);
        let block_size = self.classes.block_size(index);
        let block = {
            let mut state = self.state.borrow_mut();
            let block = match state.free_lists[index].pop() {
                Some(block) => block,
                None => self.refill(&mut state, block_size)?,
            };
            if self.config.track_stats {
                state.counters.allocations += 1;
            }
            block
        };

        if let Some(pattern) = self.config.alloc_pattern {
            // SAFETY: the block is `block_size` bytes and now exclusively ours.
            unsafe { core::ptr::write_bytes(block.as_ptr(), pattern, block_size) };
        }

        Ok(block)
    }

    /// Returns a block obtained from [`allocate_bytes`](Self::allocate_bytes)
    ///
    /// Pooled blocks are pushed onto the head of their class list in O(1).
    ///
    /// # Safety
    /// `ptr` must come from `allocate_bytes(bytes)` on this pool and must not
    /// be used afterwards.
    pub unsafe fn deallocate_bytes(&self, ptr: NonNull<u8>, bytes: usize) {
        if !self.classes.is_pooled(bytes) {
            if let Ok(layout) = Layout::from_size_align(bytes, self.classes.align()) {
                // SAFETY: oversized blocks were allocated from `backing` with this layout.
                unsafe { self.backing.deallocate(ptr, layout) };
            }
            return;
        }

        let index = self.classes.index(bytes);
        if let Some(pattern) = self.config.dealloc_pattern {
            // SAFETY: caller hands the whole block back to us.
            unsafe {
                core::ptr::write_bytes(ptr.as_ptr(), pattern, self.classes.block_size(index));
            }
        }

        let mut state = self.state.borrow_mut();
        // SAFETY: block is at least `align` bytes, aligned to `align` and no longer in use.
        unsafe { state.free_lists[index].push(ptr) };
        if self.config.track_stats {
            state.counters.deallocations += 1;
        }
    }

    /// Deallocates then allocates; contents are not preserved
    ///
    /// # Safety
    /// Same as [`deallocate_bytes`](Self::deallocate_bytes) for `ptr` / `old_bytes`.
    pub unsafe fn reallocate_bytes(
        &self,
        ptr: NonNull<u8>,
        old_bytes: usize,
        new_bytes: usize,
    ) -> StlResult<NonNull<u8>> {
        // SAFETY: forwarded from the caller.
        unsafe { self.deallocate_bytes(ptr, old_bytes) };
        self.allocate_bytes(new_bytes)
    }

    /// Statistics snapshot, if tracking is enabled
    pub fn stats(&self) -> Option<PoolStats> {
        if !self.config.track_stats {
            return None;
        }

        let state = self.state.borrow();
        let mut free_blocks = [0; MAX_SIZE_CLASSES];
        for (count, list) in free_blocks.iter_mut().zip(&state.free_lists) {
            *count = list.len();
        }

        Some(PoolStats::new(
            state.counters,
            self.classes,
            state.heap_size,
            state.pool_left,
            free_blocks,
        ))
    }

    fn allocate_oversized(&self, bytes: usize) -> StlResult<NonNull<u8>> {
        let layout = Layout::from_size_align(bytes, self.classes.align())
            .map_err(|_| StlError::invalid_layout(bytes, self.classes.align()))?;
        // SAFETY: layout is valid; the block is handed out uninitialized.
        let ptr = unsafe { self.backing.allocate(layout) }?;
        if self.config.track_stats {
            self.state.borrow_mut().counters.oversized += 1;
        }
        Ok(ptr)
    }

    /// Refills the list of `size`-byte blocks and returns one block from it
    fn refill(&self, state: &mut PoolState, size: usize) -> StlResult<NonNull<u8>> {
        let (chunk, count) = self.chunk_alloc(state, size)?;

        #[cfg(feature = "logging")]
        trace!(size, count, "free list refilled");

        if self.config.track_stats {
            state.counters.refills += 1;
        }

        // First block goes to the caller, the rest are threaded in address order
        let list = &mut state.free_lists[self.classes.index(size)];
        for i in (1..count).rev() {
            // SAFETY: `chunk` spans `count * size` bytes carved from the pool.
            unsafe { list.push(chunk.add(i * size)) };
        }

        Ok(chunk)
    }

    /// Carves up to `refill_batch` blocks of `size` bytes from the pool
    ///
    /// Returns the start of the carved run and how many blocks it holds (at
    /// least one).
    fn chunk_alloc(&self, state: &mut PoolState, size: usize) -> StlResult<(NonNull<u8>, usize)> {
        let batch = self.config.refill_batch;
        let total = size
            .checked_mul(batch)
            .ok_or_else(|| StlError::invalid_layout(usize::MAX, self.classes.align()))?;

        loop {
            if let Some(start) = state.pool_start {
                let left = state.pool_left;
                if left >= size {
                    let count = if left >= total { batch } else { left / size };
                    let carved = count * size;
                    state.pool_left -= carved;
                    // SAFETY: `carved <= left`, so the new start stays inside the chunk.
                    state.pool_start = (state.pool_left > 0).then(|| unsafe { start.add(carved) });
                    return Ok((start, count));
                }

                // Remainder is smaller than one block; park it on its own list
                let index = self.classes.index(left);
                // SAFETY: remainder is a multiple of `align` and unused.
                unsafe { state.free_lists[index].push(start) };
                state.pool_start = None;
                state.pool_left = 0;

                #[cfg(feature = "logging")]
                debug!(bytes = left, "pool remainder salvaged");

                if self.config.track_stats {
                    state.counters.salvaged_remainders += 1;
                }
            }

            let request = total
                .checked_mul(2)
                .and_then(|bytes| bytes.checked_add(self.classes.round_up(state.heap_size >> 4)))
                .ok_or_else(|| StlError::out_of_memory(size, self.classes.align()))?;
            let layout = Layout::from_size_align(request, self.classes.align())
                .map_err(|_| StlError::invalid_layout(request, self.classes.align()))?;

            // SAFETY: layout is valid and non-zero.
            match unsafe { self.backing.allocate(layout) } {
                Ok(chunk) => {
                    state.chunks.push((chunk, layout));
                    state.heap_size = state.heap_size.saturating_add(request);
                    state.pool_start = Some(chunk);
                    state.pool_left = request;

                    #[cfg(feature = "logging")]
                    debug!(bytes = request, heap_size = state.heap_size, "pool chunk obtained");

                    if self.config.track_stats {
                        state.counters.system_requests += 1;
                    }
                }
                Err(_) => {
                    if self.config.track_stats {
                        state.counters.failed_system_requests += 1;
                    }

                    let classes = self.classes;
                    let adopted = (classes.index(size)..classes.count()).find_map(|i| {
                        state.free_lists[i]
                            .pop()
                            .map(|block| (block, classes.block_size(i)))
                    });

                    let Some((block, bytes)) = adopted else {
                        return Err(StlError::out_of_memory(size, classes.align()));
                    };

                    #[cfg(feature = "logging")]
                    debug!(size, adopted = bytes, "backing allocator refused, adopting free block");

                    state.pool_start = Some(block);
                    state.pool_left = bytes;
                    if self.config.track_stats {
                        state.counters.adopted_blocks += 1;
                    }
                }
            }
        }
    }
}

impl<B: Allocator> Drop for FreeListAllocator<B> {
    fn drop(&mut self) {
        let state = self.state.get_mut();
        for (chunk, layout) in state.chunks.drain(..) {
            // SAFETY: every chunk was obtained from `backing` with this layout.
            unsafe { self.backing.deallocate(chunk, layout) };
        }
    }
}

// SAFETY: the pool exclusively owns every chunk it points into; moving it to
// another thread moves that ownership along with it.
unsafe impl<B: Allocator + Send> Send for FreeListAllocator<B> {}

// SAFETY: pooled layouts go through the free lists, everything else is
// forwarded to `backing` with the same layout on both sides.
unsafe impl<B: Allocator> Allocator for FreeListAllocator<B> {
    unsafe fn allocate(&self, layout: Layout) -> StlResult<NonNull<u8>> {
        if self.serves(layout) {
            return self.allocate_bytes(layout.size());
        }

        // SAFETY: caller's contract is forwarded.
        let ptr = unsafe { self.backing.allocate(layout) }?;
        if self.config.track_stats {
            self.state.borrow_mut().counters.oversized += 1;
        }
        Ok(ptr)
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        if self.serves(layout) {
            // SAFETY: pooled layouts were served by `allocate_bytes(layout.size())`.
            unsafe { self.deallocate_bytes(ptr, layout.size()) };
        } else {
            // SAFETY: caller's contract is forwarded.
            unsafe { self.backing.deallocate(ptr, layout) };
        }
    }

    fn name(&self) -> &'static str {
        "FreeListAllocator"
    }
}
