//! Cursor capability traits
//!
//! A cursor is a position in a sequence, compared for equality against an
//! end position, in the style of C++ iterators rather than Rust's
//! `Iterator`. The trait a cursor implements states what it *can* do; its
//! `Category` states which algorithm implementations it opts into. A cursor
//! declaring a stronger category than its capabilities fails to compile as
//! soon as an algorithm needs the missing capability.
//!
//! Raw pointers are random-access cursors over contiguous storage.

use super::category::{IteratorCategory, RandomAccessIteratorTag};

/// Base of every cursor: its category tag and element type
pub trait Cursor {
    type Category: IteratorCategory;
    type Value;
}

/// Readable cursor that can step forward
pub trait InputCursor: Cursor + Clone + PartialEq {
    /// Element under the cursor
    ///
    /// # Safety
    /// The cursor must point at a live element, not at the end position.
    unsafe fn get(&self) -> &Self::Value;

    /// Moves to the next position
    fn step(&mut self);
}

/// Multi-pass input cursor: copies traverse independently
pub trait ForwardCursor: InputCursor {}

/// Forward cursor that can step back
pub trait BidirectionalCursor: ForwardCursor {
    /// Moves to the previous position
    fn step_back(&mut self);
}

/// Bidirectional cursor with constant-time arithmetic
pub trait RandomAccessCursor: BidirectionalCursor {
    /// Moves by `n` positions (negative moves back)
    fn jump(&mut self, n: isize);

    /// Signed number of steps from `origin` to `self`
    fn distance_from(&self, origin: &Self) -> isize;
}

/// Cursor whose current slot can be written through
pub trait WritableCursor: Cursor {
    /// Raw pointer to the slot under the cursor
    fn slot(&self) -> *mut Self::Value;
}

/// Write-only sink of `T` values
pub trait OutputCursor<T> {
    /// Stores `value` at the current position and advances
    ///
    /// # Safety
    /// For cursors into existing storage the current slot must hold a live
    /// value; it is dropped and replaced. Appending sinks have no requirement.
    unsafe fn put(&mut self, value: T);
}

macro_rules! impl_pointer_cursor {
    ($ptr:ty) => {
        impl<T> Cursor for $ptr {
            type Category = RandomAccessIteratorTag;
            type Value = T;
        }

        impl<T> InputCursor for $ptr {
            #[inline]
            unsafe fn get(&self) -> &T {
                // SAFETY: caller guarantees the pointer addresses a live element.
                unsafe { &**self }
            }

            #[inline]
            fn step(&mut self) {
                *self = self.wrapping_add(1);
            }
        }

        impl<T> ForwardCursor for $ptr {}

        impl<T> BidirectionalCursor for $ptr {
            #[inline]
            fn step_back(&mut self) {
                *self = self.wrapping_sub(1);
            }
        }

        impl<T> RandomAccessCursor for $ptr {
            #[inline]
            fn jump(&mut self, n: isize) {
                *self = self.wrapping_offset(n);
            }

            #[inline]
            fn distance_from(&self, origin: &Self) -> isize {
                let bytes = self.addr().wrapping_sub(origin.addr()) as isize;
                bytes / core::mem::size_of::<T>().max(1) as isize
            }
        }
    };
}

impl_pointer_cursor!(*const T);
impl_pointer_cursor!(*mut T);

impl<T> WritableCursor for *mut T {
    #[inline]
    fn slot(&self) -> *mut T {
        *self
    }
}

impl<T> OutputCursor<T> for *mut T {
    #[inline]
    unsafe fn put(&mut self, value: T) {
        // SAFETY: caller guarantees the slot holds a live value.
        unsafe { **self = value };
        self.step();
    }
}
