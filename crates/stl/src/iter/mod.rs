//! Iterator protocol
//!
//! Category tags, cursor capability traits, the traits record, and the
//! algorithms dispatched on category at compile time.
//!
//! # Examples
//!
//! ```
//! use nebula_stl::iter::{self, CategoryKind};
//!
//! let values = [1, 2, 3, 3, 3, 4, 5];
//! let range = values.as_ptr_range();
//!
//! assert_eq!(iter::category_of::<*const i32>(), CategoryKind::RandomAccess);
//! assert_eq!(iter::distance(&range.start, &range.end), 7);
//!
//! // SAFETY: the pointers delimit a live, sorted slice.
//! let at = unsafe { iter::lower_bound(range.start, range.end, &3) };
//! assert_eq!(iter::distance(&range.start, &at), 2);
//! ```

pub mod adapters;
pub mod algorithm;
pub mod category;
pub mod cursor;
pub mod traits;

pub use adapters::{BackInserter, ForwardOnly, InputOnly, PushBack, SliceCursor};
pub use algorithm::{
    BackwardCopyStrategy, CopyStrategy, SearchStrategy, TraversalStrategy, advance, binary_search,
    copy, copy_backward, copy_n, copy_trivial, distance, equal_range, lower_bound, lower_bound_by,
    move_backward, move_range, next, partition_point, prev, upper_bound,
};
pub use category::{
    BidirectionalIteratorTag, BidirectionalTag, CategoryKind, ForwardIteratorTag, ForwardTag,
    InputIteratorTag, InputTag, IteratorCategory, OutputIteratorTag, RandomAccessIteratorTag,
};
pub use cursor::{
    BidirectionalCursor, Cursor, ForwardCursor, InputCursor, OutputCursor, RandomAccessCursor,
    WritableCursor,
};
pub use traits::{IteratorTraits, TraitsRecord, category_of, traits_of};
