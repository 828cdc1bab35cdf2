//! Size-class arithmetic
//!
//! Requests up to `max_bytes` are rounded up to a multiple of `align` and
//! served from class `round_up(n) / align - 1`, so class `i` holds blocks of
//! exactly `(i + 1) * align` bytes.

use crate::config::AllocatorConfig;

/// Default size-class granularity in bytes
pub const ALIGN: usize = 8;
/// Default largest pooled request
pub const MAX_BYTES: usize = 128;
/// Default number of size classes
pub const NUM_CLASSES: usize = MAX_BYTES / ALIGN;
/// Default blocks per refill
pub const REFILL_BATCH: usize = 20;

/// Size-class mapping for one pool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeClasses {
    align: usize,
    max_bytes: usize,
}

impl SizeClasses {
    /// Creates a mapping; `align` must be a power of two
    pub const fn new(align: usize, max_bytes: usize) -> Self {
        Self { align, max_bytes }
    }

    /// Mapping described by a validated config
    pub const fn from_config(config: &AllocatorConfig) -> Self {
        Self::new(config.align, config.max_bytes)
    }

    /// Granularity
    #[inline]
    pub const fn align(&self) -> usize {
        self.align
    }

    /// Largest pooled size
    #[inline]
    pub const fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    /// Number of classes
    #[inline]
    pub const fn count(&self) -> usize {
        self.max_bytes / self.align
    }

    /// Whether a request of `bytes` is served from the free lists
    #[inline]
    pub const fn is_pooled(&self, bytes: usize) -> bool {
        bytes <= self.max_bytes
    }

    /// Rounds `bytes` up to a multiple of the class granularity
    #[inline]
    pub const fn round_up(&self, bytes: usize) -> usize {
        (bytes + self.align - 1) & !(self.align - 1)
    }

    /// Class index for a pooled request of `bytes`; zero maps to the smallest class
    #[inline]
    pub const fn index(&self, bytes: usize) -> usize {
        if bytes == 0 {
            return 0;
        }
        self.round_up(bytes) / self.align - 1
    }

    /// Block size of class `index`
    #[inline]
    pub const fn block_size(&self, index: usize) -> usize {
        (index + 1) * self.align
    }
}

impl Default for SizeClasses {
    fn default() -> Self {
        Self::new(ALIGN, MAX_BYTES)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_up() {
        let classes = SizeClasses::default();
        assert_eq!(classes.round_up(0), 0);
        assert_eq!(classes.round_up(1), 8);
        assert_eq!(classes.round_up(8), 8);
        assert_eq!(classes.round_up(9), 16);
        assert_eq!(classes.round_up(128), 128);
    }

    #[test]
    fn test_index_and_block_size() {
        let classes = SizeClasses::default();
        assert_eq!(classes.count(), NUM_CLASSES);
        assert_eq!(classes.index(0), 0);
        assert_eq!(classes.index(1), 0);
        assert_eq!(classes.index(24), 2);
        assert_eq!(classes.index(25), 3);
        assert_eq!(classes.index(128), 15);

        for i in 0..classes.count() {
            assert_eq!(classes.index(classes.block_size(i)), i);
        }
    }

    #[test]
    fn test_pooled_boundary() {
        let classes = SizeClasses::new(16, 256);
        assert!(classes.is_pooled(256));
        assert!(!classes.is_pooled(257));
        assert_eq!(classes.index(17), 1);
    }
}
