//! Free-list allocator configuration

use crate::allocator::size_class::{ALIGN, MAX_BYTES, REFILL_BATCH};
use crate::error::{StlError, StlResult};

/// Upper bound on the number of size classes a pool may manage
pub const MAX_SIZE_CLASSES: usize = 64;

/// Configuration for [`FreeListAllocator`](crate::allocator::FreeListAllocator)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllocatorConfig {
    /// Size-class granularity in bytes; every pooled block is aligned to it
    pub align: usize,

    /// Largest request served from the free lists; bigger ones go to the backing allocator
    pub max_bytes: usize,

    /// Blocks requested from the pool per refill
    pub refill_batch: usize,

    /// Fill pattern byte for blocks handed out (for debugging)
    pub alloc_pattern: Option<u8>,
    /// Fill pattern byte for blocks returned to a free list (for debugging)
    pub dealloc_pattern: Option<u8>,

    /// Enable statistics tracking
    pub track_stats: bool,
}

impl Default for AllocatorConfig {
    fn default() -> Self {
        let patterns = cfg!(debug_assertions) || cfg!(feature = "debug-patterns");
        Self {
            align: ALIGN,
            max_bytes: MAX_BYTES,
            refill_batch: REFILL_BATCH,
            alloc_pattern: if patterns { Some(0xBB) } else { None },
            dealloc_pattern: if patterns { Some(0xDD) } else { None },
            track_stats: true,
        }
    }
}

impl AllocatorConfig {
    /// Production configuration - no fill patterns
    #[must_use]
    pub fn production() -> Self {
        Self {
            alloc_pattern: None,
            dealloc_pattern: None,
            ..Self::default()
        }
    }

    /// Debug configuration - fill patterns always on
    #[must_use]
    pub fn debug() -> Self {
        Self {
            alloc_pattern: Some(0xBB),
            dealloc_pattern: Some(0xDD),
            track_stats: true,
            ..Self::default()
        }
    }

    /// Performance configuration - minimal overhead
    #[must_use]
    pub fn performance() -> Self {
        Self {
            alloc_pattern: None,
            dealloc_pattern: None,
            track_stats: false,
            ..Self::default()
        }
    }

    /// Set the size-class granularity
    #[must_use = "builder methods must be chained or built"]
    pub fn with_align(mut self, align: usize) -> Self {
        self.align = align;
        self
    }

    /// Set the largest pooled request
    #[must_use = "builder methods must be chained or built"]
    pub fn with_max_bytes(mut self, max_bytes: usize) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    /// Set the refill batch size
    #[must_use = "builder methods must be chained or built"]
    pub fn with_refill_batch(mut self, refill_batch: usize) -> Self {
        self.refill_batch = refill_batch;
        self
    }

    /// Number of size classes (`max_bytes / align`)
    #[inline]
    pub fn size_classes(&self) -> usize {
        self.max_bytes / self.align
    }

    /// Validate the configuration
    pub fn validate(&self) -> StlResult<()> {
        if !self.align.is_power_of_two() {
            return Err(StlError::invalid_config("align must be a power of two"));
        }
        if self.align < core::mem::size_of::<*mut u8>() {
            return Err(StlError::invalid_config(
                "align must be able to hold a free-list link",
            ));
        }
        if self.max_bytes == 0 || self.max_bytes % self.align != 0 {
            return Err(StlError::invalid_config(
                "max_bytes must be a non-zero multiple of align",
            ));
        }
        if self.size_classes() > MAX_SIZE_CLASSES {
            return Err(StlError::invalid_config("too many size classes"));
        }
        if self.refill_batch == 0 {
            return Err(StlError::invalid_config("refill_batch must be at least 1"));
        }
        // Chunk requests are twice one batch of the largest class
        if self
            .max_bytes
            .checked_mul(self.refill_batch)
            .and_then(|bytes| bytes.checked_mul(2))
            .is_none_or(|bytes| bytes > isize::MAX as usize)
        {
            return Err(StlError::invalid_config("refill_batch is too large for max_bytes"));
        }
        Ok(())
    }
}
