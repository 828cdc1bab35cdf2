//! Free-list pool statistics

use core::fmt;

use super::size_class::SizeClasses;
use crate::config::MAX_SIZE_CLASSES;

/// Running counters kept inside a pool
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct PoolCounters {
    pub(crate) allocations: usize,
    pub(crate) deallocations: usize,
    pub(crate) oversized: usize,
    pub(crate) refills: usize,
    pub(crate) system_requests: usize,
    pub(crate) failed_system_requests: usize,
    pub(crate) salvaged_remainders: usize,
    pub(crate) adopted_blocks: usize,
}

/// Snapshot of a [`FreeListAllocator`](super::FreeListAllocator)
#[derive(Debug, Clone, Copy)]
pub struct PoolStats {
    /// Pooled allocations served
    pub allocations: usize,
    /// Pooled deallocations received
    pub deallocations: usize,
    /// Requests passed straight to the backing allocator
    pub oversized: usize,
    /// Free-list refills
    pub refills: usize,
    /// Chunks obtained from the backing allocator
    pub system_requests: usize,
    /// Chunk requests the backing allocator refused
    pub failed_system_requests: usize,
    /// Pool remainders pushed onto a free list before growing
    pub salvaged_remainders: usize,
    /// Free blocks of larger classes adopted as the pool
    pub adopted_blocks: usize,
    /// Total bytes obtained from the backing allocator
    pub heap_size: usize,
    /// Bytes left in the current pool chunk
    pub pool_bytes_left: usize,
    classes: SizeClasses,
    free_blocks: [usize; MAX_SIZE_CLASSES],
}

impl PoolStats {
    pub(crate) fn new(
        counters: PoolCounters,
        classes: SizeClasses,
        heap_size: usize,
        pool_bytes_left: usize,
        free_blocks: [usize; MAX_SIZE_CLASSES],
    ) -> Self {
        Self {
            allocations: counters.allocations,
            deallocations: counters.deallocations,
            oversized: counters.oversized,
            refills: counters.refills,
            system_requests: counters.system_requests,
            failed_system_requests: counters.failed_system_requests,
            salvaged_remainders: counters.salvaged_remainders,
            adopted_blocks: counters.adopted_blocks,
            heap_size,
            pool_bytes_left,
            classes,
            free_blocks,
        }
    }

    /// Free blocks waiting in the class that serves `bytes`
    pub fn free_blocks_for(&self, bytes: usize) -> usize {
        if bytes > self.classes.max_bytes() {
            return 0;
        }
        self.free_blocks[self.classes.index(bytes)]
    }

    /// Free blocks across all classes
    pub fn total_free_blocks(&self) -> usize {
        self.free_blocks[..self.classes.count()].iter().sum()
    }

    /// Bytes sitting on free lists
    pub fn free_bytes(&self) -> usize {
        (0..self.classes.count())
            .map(|i| self.free_blocks[i] * self.classes.block_size(i))
            .sum()
    }

    /// Pooled blocks currently handed out
    pub fn live_blocks(&self) -> usize {
        self.allocations.saturating_sub(self.deallocations)
    }
}

impl fmt::Display for PoolStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Free-list pool statistics:")?;
        writeln!(f, "  Allocations:      {}", self.allocations)?;
        writeln!(f, "  Deallocations:    {}", self.deallocations)?;
        writeln!(f, "  Oversized:        {}", self.oversized)?;
        writeln!(f, "  Refills:          {}", self.refills)?;
        writeln!(
            f,
            "  System requests:  {} ({} failed)",
            self.system_requests, self.failed_system_requests
        )?;
        writeln!(f, "  Heap size:        {} bytes", self.heap_size)?;
        writeln!(f, "  Pool remainder:   {} bytes", self.pool_bytes_left)?;
        writeln!(
            f,
            "  Free blocks:      {} ({} bytes)",
            self.total_free_blocks(),
            self.free_bytes()
        )?;
        write!(
            f,
            "  Salvaged/adopted: {}/{}",
            self.salvaged_remainders, self.adopted_blocks
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_free_block_accounting() {
        let classes = SizeClasses::default();
        let mut free = [0; MAX_SIZE_CLASSES];
        free[0] = 3;
        free[2] = 2;

        let counters = PoolCounters {
            allocations: 10,
            deallocations: 4,
            ..PoolCounters::default()
        };
        let stats = PoolStats::new(counters, classes, 4096, 64, free);

        assert_eq!(stats.free_blocks_for(20), 2);
        assert_eq!(stats.free_blocks_for(1000), 0);
        assert_eq!(stats.total_free_blocks(), 5);
        assert_eq!(stats.free_bytes(), 3 * 8 + 2 * 24);
        assert_eq!(stats.live_blocks(), 6);
        assert!(stats.to_string().contains("Heap size:        4096 bytes"));
    }
}
