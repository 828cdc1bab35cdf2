//! Cursor adapters
//!
//! - [`InputOnly`] / [`ForwardOnly`] re-declare a stronger cursor under a
//!   weaker category, forcing the generic algorithm path.
//! - [`SliceCursor`] is a bounds-checked random-access cursor over a slice.
//! - [`BackInserter`] is an output cursor appending to a [`PushBack`] container.

use super::category::{ForwardIteratorTag, InputIteratorTag, OutputIteratorTag, RandomAccessIteratorTag};
use super::cursor::{
    BidirectionalCursor, Cursor, ForwardCursor, InputCursor, OutputCursor, RandomAccessCursor,
};

/// Presents any readable cursor as an input cursor
#[derive(Debug, Clone, PartialEq)]
pub struct InputOnly<I>(I);

impl<I: InputCursor> InputOnly<I> {
    pub fn new(inner: I) -> Self {
        Self(inner)
    }

    pub fn into_inner(self) -> I {
        self.0
    }
}

impl<I: InputCursor> Cursor for InputOnly<I> {
    type Category = InputIteratorTag;
    type Value = I::Value;
}

impl<I: InputCursor> InputCursor for InputOnly<I> {
    #[inline]
    unsafe fn get(&self) -> &I::Value {
        // SAFETY: forwarded from the caller.
        unsafe { self.0.get() }
    }

    #[inline]
    fn step(&mut self) {
        self.0.step();
    }
}

/// Presents any multi-pass cursor as a forward cursor
#[derive(Debug, Clone, PartialEq)]
pub struct ForwardOnly<I>(I);

impl<I: ForwardCursor> ForwardOnly<I> {
    pub fn new(inner: I) -> Self {
        Self(inner)
    }

    pub fn into_inner(self) -> I {
        self.0
    }
}

impl<I: ForwardCursor> Cursor for ForwardOnly<I> {
    type Category = ForwardIteratorTag;
    type Value = I::Value;
}

impl<I: ForwardCursor> InputCursor for ForwardOnly<I> {
    #[inline]
    unsafe fn get(&self) -> &I::Value {
        // SAFETY: forwarded from the caller.
        unsafe { self.0.get() }
    }

    #[inline]
    fn step(&mut self) {
        self.0.step();
    }
}

impl<I: ForwardCursor> ForwardCursor for ForwardOnly<I> {}

/// Random-access cursor over a borrowed slice
///
/// Dereferencing the end position panics instead of reading out of bounds.
#[derive(Debug)]
pub struct SliceCursor<'a, T> {
    slice: &'a [T],
    pos: usize,
}

impl<'a, T> SliceCursor<'a, T> {
    /// Cursor at index `pos` of `slice`
    pub fn new(slice: &'a [T], pos: usize) -> Self {
        Self { slice, pos }
    }

    /// `(begin, end)` cursors of `slice`
    pub fn range(slice: &'a [T]) -> (Self, Self) {
        (Self::new(slice, 0), Self::new(slice, slice.len()))
    }

    /// Index into the slice
    pub fn position(&self) -> usize {
        self.pos
    }
}

impl<T> Clone for SliceCursor<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for SliceCursor<'_, T> {}

impl<T> PartialEq for SliceCursor<'_, T> {
    fn eq(&self, other: &Self) -> bool {
        self.pos == other.pos && core::ptr::eq(self.slice, other.slice)
    }
}

impl<T> Cursor for SliceCursor<'_, T> {
    type Category = RandomAccessIteratorTag;
    type Value = T;
}

impl<T> InputCursor for SliceCursor<'_, T> {
    #[inline]
    unsafe fn get(&self) -> &T {
        &self.slice[self.pos]
    }

    #[inline]
    fn step(&mut self) {
        self.pos += 1;
    }
}

impl<T> ForwardCursor for SliceCursor<'_, T> {}

impl<T> BidirectionalCursor for SliceCursor<'_, T> {
    #[inline]
    fn step_back(&mut self) {
        self.pos -= 1;
    }
}

impl<T> RandomAccessCursor for SliceCursor<'_, T> {
    #[inline]
    fn jump(&mut self, n: isize) {
        self.pos = self.pos.wrapping_add_signed(n);
    }

    #[inline]
    fn distance_from(&self, origin: &Self) -> isize {
        self.pos as isize - origin.pos as isize
    }
}

/// Containers that can append at the back
pub trait PushBack {
    type Item;

    fn push_back(&mut self, value: Self::Item);
}

impl<T> PushBack for Vec<T> {
    type Item = T;

    #[inline]
    fn push_back(&mut self, value: T) {
        self.push(value);
    }
}

/// Output cursor that appends every value to a container
#[derive(Debug)]
pub struct BackInserter<'a, C> {
    container: &'a mut C,
}

impl<'a, C: PushBack> BackInserter<'a, C> {
    pub fn new(container: &'a mut C) -> Self {
        Self { container }
    }
}

impl<C: PushBack> Cursor for BackInserter<'_, C> {
    type Category = OutputIteratorTag;
    type Value = C::Item;
}

impl<C: PushBack> OutputCursor<C::Item> for BackInserter<'_, C> {
    #[inline]
    unsafe fn put(&mut self, value: C::Item) {
        self.container.push_back(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::iter::{CategoryKind, category_of};

    #[test]
    fn test_slice_cursor_walk() {
        let values = [3, 1, 4];
        let (mut it, end) = SliceCursor::range(&values);
        let mut seen = Vec::new();
        while it != end {
            seen.push(unsafe { *it.get() });
            it.step();
        }
        assert_eq!(seen, values);
        assert_eq!(end.distance_from(&SliceCursor::new(&values, 1)), 2);
    }

    #[test]
    #[should_panic]
    fn test_slice_cursor_end_is_checked() {
        let values = [1];
        let (_, end) = SliceCursor::range(&values);
        let _ = unsafe { end.get() };
    }

    #[test]
    fn test_categories() {
        assert_eq!(category_of::<SliceCursor<'_, u8>>(), CategoryKind::RandomAccess);
        assert_eq!(category_of::<ForwardOnly<*const u8>>(), CategoryKind::Forward);
        assert_eq!(category_of::<BackInserter<'_, Vec<u8>>>(), CategoryKind::Output);
    }

    #[test]
    fn test_back_inserter() {
        let mut out = vec![1];
        let mut sink = BackInserter::new(&mut out);
        unsafe {
            sink.put(2);
            sink.put(3);
        }
        assert_eq!(out, [1, 2, 3]);
    }
}
