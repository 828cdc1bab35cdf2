//! Error types for nebula-stl
//!
//! Uses thiserror for clean, idiomatic Rust error definitions.

use core::alloc::Layout;
use thiserror::Error;

#[cfg(feature = "logging")]
use tracing::{debug, error};

// ============================================================================
// Main Error Type
// ============================================================================

/// Allocator and container errors
#[must_use = "errors should be handled"]
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StlError {
    /// Free lists, pool remainder and the backing allocator are all exhausted
    #[error("Out of memory: {size} bytes with {align} byte alignment")]
    OutOfMemory { size: usize, align: usize },

    /// A container would grow past `max_size()`
    #[error("Length exceeded: requested {requested} elements (max: {max})")]
    LengthExceeded { requested: usize, max: usize },

    /// Bounds-checked access outside `[0, len)`
    #[error("Index out of range: {index} (len: {len})")]
    OutOfRange { index: usize, len: usize },

    /// Layout computation overflowed or produced an invalid alignment
    #[error("Invalid layout: {size} bytes with {align} byte alignment")]
    InvalidLayout { size: usize, align: usize },

    /// Configuration rejected by `validate()`
    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },
}

impl StlError {
    /// Get error code for categorization
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::OutOfMemory { .. } => "STL:ALLOC:OOM",
            Self::LengthExceeded { .. } => "STL:CONTAINER:LENGTH",
            Self::OutOfRange { .. } => "STL:CONTAINER:RANGE",
            Self::InvalidLayout { .. } => "STL:ALLOC:LAYOUT",
            Self::InvalidConfig { .. } => "STL:CONFIG:INVALID",
        }
    }

    /// Out-of-memory is the only non-recoverable condition
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::OutOfMemory { .. })
    }

    /// Create out of memory error
    pub fn out_of_memory(size: usize, align: usize) -> Self {
        #[cfg(feature = "logging")]
        error!(size, align, "allocator exhausted");

        Self::OutOfMemory { size, align }
    }

    /// Create out of memory error from layout
    pub fn out_of_memory_with_layout(layout: Layout) -> Self {
        Self::out_of_memory(layout.size(), layout.align())
    }

    /// Create length exceeded error
    pub fn length_exceeded(requested: usize, max: usize) -> Self {
        #[cfg(feature = "logging")]
        debug!(requested, max, "container length exceeded");

        Self::LengthExceeded { requested, max }
    }

    /// Create out of range error
    pub fn out_of_range(index: usize, len: usize) -> Self {
        #[cfg(feature = "logging")]
        debug!(index, len, "index out of range");

        Self::OutOfRange { index, len }
    }

    /// Create invalid layout error
    pub fn invalid_layout(size: usize, align: usize) -> Self {
        Self::InvalidLayout { size, align }
    }

    /// Create invalid config error
    pub fn invalid_config(reason: &str) -> Self {
        Self::InvalidConfig {
            reason: reason.to_string(),
        }
    }
}

// ============================================================================
// Result Types
// ============================================================================

/// Result type for allocator and container operations
pub type StlResult<T> = core::result::Result<T, StlError>;

/// Generic result type alias
pub type Result<T> = StlResult<T>;

/// Unwrapping for the infallible convenience wrappers (`push_back`, `Index`, ...)
pub(crate) trait OrPanic<T> {
    fn or_panic(self) -> T;
}

impl<T> OrPanic<T> for StlResult<T> {
    #[track_caller]
    fn or_panic(self) -> T {
        match self {
            Ok(value) => value,
            Err(err) => panic!("{err}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = StlError::out_of_memory(1024, 8);
        assert!(error.to_string().contains("1024"));

        let error = StlError::length_exceeded(10, 5);
        assert!(error.to_string().contains("max: 5"));
    }

    #[test]
    fn test_error_with_layout() {
        let layout = Layout::new::<u64>();
        let error = StlError::out_of_memory_with_layout(layout);
        assert_eq!(error, StlError::OutOfMemory { size: 8, align: 8 });
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(StlError::out_of_memory(1, 1).code(), "STL:ALLOC:OOM");
        assert_eq!(StlError::out_of_range(3, 2).code(), "STL:CONTAINER:RANGE");
        assert_eq!(StlError::invalid_config("x").code(), "STL:CONFIG:INVALID");
    }

    #[test]
    #[should_panic(expected = "Index out of range: 4 (len: 2)")]
    fn test_or_panic_message() {
        let result: StlResult<()> = Err(StlError::OutOfRange { index: 4, len: 2 });
        result.or_panic();
    }

    #[test]
    fn test_fatal() {
        assert!(StlError::out_of_memory(8, 8).is_fatal());
        assert!(!StlError::length_exceeded(2, 1).is_fatal());
        assert!(!StlError::invalid_layout(usize::MAX, 8).is_fatal());
    }
}
