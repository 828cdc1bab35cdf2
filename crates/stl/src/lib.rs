//! # nebula-stl
//!
//! Container primitives built from three layers:
//!
//! - a segregated free-list allocator that serves small blocks from
//!   per-size-class free lists and refills them in batches
//! - an iterator protocol where every cursor declares its category and
//!   generic algorithms (`distance`, `copy`, `lower_bound`, ...) pick their
//!   strategy from it at compile time
//! - a double-ended queue over segmented buffers that uses both, plus
//!   [`Stack`] and [`Queue`] adapters on top of it
//!
//! ## Quick Start
//!
//! ```rust
//! use nebula_stl::prelude::*;
//!
//! // Containers draw from a per-thread pool by default
//! let mut deque = Deque::new();
//! deque.push_back(2);
//! deque.push_front(1);
//! assert_eq!(deque.iter().copied().collect::<Vec<_>>(), [1, 2]);
//!
//! // Or from an explicit pool with its own lifetime
//! let pool = FreeListAllocator::new();
//! let mut queue = Queue::new_in(&pool);
//! queue.push("job");
//! assert_eq!(queue.pop(), Some("job"));
//! ```
//!
//! ## Features
//!
//! - `logging` (default): structured events through `tracing` for pool
//!   growth, salvage and out-of-memory, and deque map reallocation
//! - `debug-patterns`: fill pooled blocks with byte patterns in every build
//!   profile, not only debug builds
//!
//! ## Thread safety
//!
//! [`FreeListAllocator`] is single-threaded. Share one pool across threads
//! through [`SharedAllocator`]; [`DefaultAllocator`] gives each thread its own.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![allow(unsafe_code)]
#![warn(rust_2018_idioms)]

pub mod adapters;
pub mod allocator;
pub mod config;
pub mod construct;
pub mod deque;
pub mod error;
pub mod iter;
mod macros;

pub use crate::adapters::{Queue, Stack};
pub use crate::allocator::{
    Allocator, DefaultAllocator, FreeListAllocator, SharedAllocator, SystemAllocator,
    TrackedAllocator, TypedAllocator,
};
pub use crate::config::AllocatorConfig;
pub use crate::deque::Deque;
pub use crate::error::{Result, StlError, StlResult};

pub mod prelude {
    //! Convenient re-exports of commonly used types and traits.

    // Errors and configuration
    pub use crate::config::AllocatorConfig;
    pub use crate::error::{StlError, StlResult};

    // Allocators
    pub use crate::allocator::{
        Allocator, DefaultAllocator, FreeListAllocator, PoolStats, SharedAllocator,
        SystemAllocator, TrackedAllocator, TypedAllocator,
    };

    // Iterator protocol
    pub use crate::iter::{
        BidirectionalCursor, CategoryKind, Cursor, ForwardCursor, InputCursor, OutputCursor,
        RandomAccessCursor, WritableCursor,
    };

    // Containers
    pub use crate::adapters::{Queue, Stack};
    pub use crate::deque::Deque;
}
