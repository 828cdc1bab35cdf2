//! Category-dispatched algorithms
//!
//! Each algorithm family is a strategy trait implemented on the category
//! tags. A generic entry point such as [`distance`] requires
//! `I::Category: TraversalStrategy<I>`, so the tag's impl is chosen
//! statically with no runtime test. Tags without an impl (for example binary
//! search on an input-only cursor) make the call fail to compile.
//!
//! | family | input | forward | bidirectional | random access |
//! |---|---|---|---|---|
//! | distance / advance | step loop | step loop | signed step loop | O(1) arithmetic |
//! | copy / move_range | loop until `last` | = input | = input | counted loop |
//! | copy / move_backward | - | - | loop until `first` | counted loop |
//! | partition point | - | halving with stepping | = forward | halving with jumps |
//!
//! Stable Rust cannot specialize the random-access [`copy`] on `T: Copy`, so
//! the raw memory move for trivially copyable elements is the separate
//! [`copy_trivial`]. Containers relocating their own elements (the deque's
//! gap shifts) move them bitwise with `ptr::copy` for every `T`.

use core::ptr;

use super::category::{
    BidirectionalIteratorTag, ForwardIteratorTag, InputIteratorTag, RandomAccessIteratorTag,
};
use super::cursor::{
    BidirectionalCursor, Cursor, ForwardCursor, InputCursor, OutputCursor, RandomAccessCursor,
    WritableCursor,
};

// ============================================================================
// Traversal
// ============================================================================

/// `distance` / `advance` implementation for a category
pub trait TraversalStrategy<I> {
    /// Steps from `first` to `last`
    fn distance(first: &I, last: &I) -> isize;

    /// Moves `it` by `n` steps
    fn advance(it: &mut I, n: isize);
}

impl<I: InputCursor> TraversalStrategy<I> for InputIteratorTag {
    fn distance(first: &I, last: &I) -> isize {
        let mut it = first.clone();
        let mut n = 0;
        while it != *last {
            it.step();
            n += 1;
        }
        n
    }

    fn advance(it: &mut I, n: isize) {
        debug_assert!(n >= 0, "cursor cannot move backwards");
        for _ in 0..n.max(0) {
            it.step();
        }
    }
}

impl<I: ForwardCursor> TraversalStrategy<I> for ForwardIteratorTag {
    #[inline]
    fn distance(first: &I, last: &I) -> isize {
        <InputIteratorTag as TraversalStrategy<I>>::distance(first, last)
    }

    #[inline]
    fn advance(it: &mut I, n: isize) {
        <InputIteratorTag as TraversalStrategy<I>>::advance(it, n);
    }
}

impl<I: BidirectionalCursor> TraversalStrategy<I> for BidirectionalIteratorTag {
    #[inline]
    fn distance(first: &I, last: &I) -> isize {
        <InputIteratorTag as TraversalStrategy<I>>::distance(first, last)
    }

    fn advance(it: &mut I, n: isize) {
        if n >= 0 {
            for _ in 0..n {
                it.step();
            }
        } else {
            for _ in 0..n.unsigned_abs() {
                it.step_back();
            }
        }
    }
}

impl<I: RandomAccessCursor> TraversalStrategy<I> for RandomAccessIteratorTag {
    #[inline]
    fn distance(first: &I, last: &I) -> isize {
        last.distance_from(first)
    }

    #[inline]
    fn advance(it: &mut I, n: isize) {
        it.jump(n);
    }
}

/// Number of steps from `first` to `last`
///
/// Constant time for random-access cursors, linear otherwise.
#[inline]
pub fn distance<I>(first: &I, last: &I) -> isize
where
    I: Cursor,
    I::Category: TraversalStrategy<I>,
{
    <I::Category as TraversalStrategy<I>>::distance(first, last)
}

/// Moves `it` by `n` steps; negative `n` needs a bidirectional cursor
#[inline]
pub fn advance<I>(it: &mut I, n: isize)
where
    I: Cursor,
    I::Category: TraversalStrategy<I>,
{
    <I::Category as TraversalStrategy<I>>::advance(it, n);
}

/// Copy of `it` moved forward by `n`
#[inline]
#[must_use]
pub fn next<I>(it: &I, n: isize) -> I
where
    I: Cursor + Clone,
    I::Category: TraversalStrategy<I>,
{
    let mut moved = it.clone();
    advance(&mut moved, n);
    moved
}

/// Copy of `it` moved back by `n`
#[inline]
#[must_use]
pub fn prev<I>(it: &I, n: isize) -> I
where
    I: BidirectionalCursor,
    I::Category: TraversalStrategy<I>,
{
    let mut moved = it.clone();
    advance(&mut moved, -n);
    moved
}

// ============================================================================
// Forward copy / move
// ============================================================================

/// `copy` / `move_range` implementation for a category
pub trait CopyStrategy<I: InputCursor> {
    /// # Safety
    /// See [`copy`].
    unsafe fn copy<O>(first: I, last: I, result: O) -> O
    where
        O: OutputCursor<I::Value>,
        I::Value: Clone;

    /// # Safety
    /// See [`move_range`].
    unsafe fn move_range<D>(first: I, last: I, result: D) -> D
    where
        D: InputCursor + WritableCursor<Value = I::Value>;
}

impl<I: InputCursor> CopyStrategy<I> for InputIteratorTag {
    unsafe fn copy<O>(mut first: I, last: I, mut result: O) -> O
    where
        O: OutputCursor<I::Value>,
        I::Value: Clone,
    {
        while first != last {
            // SAFETY: `first` is inside `[first, last)`; output contract is the caller's.
            unsafe { result.put(first.get().clone()) };
            first.step();
        }
        result
    }

    unsafe fn move_range<D>(mut first: I, last: I, mut result: D) -> D
    where
        D: InputCursor + WritableCursor<Value = I::Value>,
    {
        while first != last {
            // SAFETY: caller guarantees sources are live and destinations writable.
            unsafe { ptr::write(result.slot(), ptr::read(first.get())) };
            first.step();
            result.step();
        }
        result
    }
}

impl<I: ForwardCursor> CopyStrategy<I> for ForwardIteratorTag {
    #[inline]
    unsafe fn copy<O>(first: I, last: I, result: O) -> O
    where
        O: OutputCursor<I::Value>,
        I::Value: Clone,
    {
        // SAFETY: forwarded from the caller.
        unsafe { <InputIteratorTag as CopyStrategy<I>>::copy(first, last, result) }
    }

    #[inline]
    unsafe fn move_range<D>(first: I, last: I, result: D) -> D
    where
        D: InputCursor + WritableCursor<Value = I::Value>,
    {
        // SAFETY: forwarded from the caller.
        unsafe { <InputIteratorTag as CopyStrategy<I>>::move_range(first, last, result) }
    }
}

impl<I: BidirectionalCursor> CopyStrategy<I> for BidirectionalIteratorTag {
    #[inline]
    unsafe fn copy<O>(first: I, last: I, result: O) -> O
    where
        O: OutputCursor<I::Value>,
        I::Value: Clone,
    {
        // SAFETY: forwarded from the caller.
        unsafe { <InputIteratorTag as CopyStrategy<I>>::copy(first, last, result) }
    }

    #[inline]
    unsafe fn move_range<D>(first: I, last: I, result: D) -> D
    where
        D: InputCursor + WritableCursor<Value = I::Value>,
    {
        // SAFETY: forwarded from the caller.
        unsafe { <InputIteratorTag as CopyStrategy<I>>::move_range(first, last, result) }
    }
}

impl<I: RandomAccessCursor> CopyStrategy<I> for RandomAccessIteratorTag {
    unsafe fn copy<O>(mut first: I, last: I, mut result: O) -> O
    where
        O: OutputCursor<I::Value>,
        I::Value: Clone,
    {
        // Counted loop: the trip count is known up front
        for _ in 0..last.distance_from(&first).max(0) {
            // SAFETY: fewer than `last - first` steps taken.
            unsafe { result.put(first.get().clone()) };
            first.step();
        }
        result
    }

    unsafe fn move_range<D>(mut first: I, last: I, mut result: D) -> D
    where
        D: InputCursor + WritableCursor<Value = I::Value>,
    {
        for _ in 0..last.distance_from(&first).max(0) {
            // SAFETY: caller guarantees sources are live and destinations writable.
            unsafe { ptr::write(result.slot(), ptr::read(first.get())) };
            first.step();
            result.step();
        }
        result
    }
}

/// Clones `[first, last)` into `result`; returns the output past the last write
///
/// # Safety
/// `[first, last)` must be a valid range. `result` must accept as many
/// values as the range holds (for pointer outputs: live destination slots).
pub unsafe fn copy<I, O>(first: I, last: I, result: O) -> O
where
    I: InputCursor,
    I::Category: CopyStrategy<I>,
    O: OutputCursor<I::Value>,
    I::Value: Clone,
{
    // SAFETY: forwarded from the caller.
    unsafe { <I::Category as CopyStrategy<I>>::copy(first, last, result) }
}

/// Relocates `[first, last)` to `result`, front to back
///
/// Sources are read bitwise and become moved-from; destinations are written
/// without dropping. The destination may overlap the source if it starts
/// before it.
///
/// # Safety
/// `[first, last)` must be a valid live range and the destination slots
/// must be writable and hold no value that still needs dropping.
pub unsafe fn move_range<I, D>(first: I, last: I, result: D) -> D
where
    I: InputCursor,
    I::Category: CopyStrategy<I>,
    D: InputCursor + WritableCursor<Value = I::Value>,
{
    // SAFETY: forwarded from the caller.
    unsafe { <I::Category as CopyStrategy<I>>::move_range(first, last, result) }
}

/// Clones `n` values starting at `first` into `result`
///
/// # Safety
/// `first` must have `n` readable positions ahead of it; see [`copy`] for `result`.
pub unsafe fn copy_n<I, O>(mut first: I, n: usize, mut result: O) -> O
where
    I: InputCursor,
    O: OutputCursor<I::Value>,
    I::Value: Clone,
{
    for _ in 0..n {
        // SAFETY: forwarded from the caller.
        unsafe { result.put(first.get().clone()) };
        first.step();
    }
    result
}

/// Bitwise copy of a contiguous `Copy` range, overlap allowed
///
/// # Safety
/// `[first, last)` must be a valid range and `result..result + (last - first)`
/// must be valid for writes.
pub unsafe fn copy_trivial<T: Copy>(first: *const T, last: *const T, result: *mut T) -> *mut T {
    let n = last.distance_from(&first).max(0) as usize;
    // SAFETY: forwarded from the caller.
    unsafe {
        ptr::copy(first, result, n);
        result.add(n)
    }
}

// ============================================================================
// Backward copy / move
// ============================================================================

/// `copy_backward` / `move_backward` implementation for a category
pub trait BackwardCopyStrategy<I: BidirectionalCursor> {
    /// # Safety
    /// See [`copy_backward`].
    unsafe fn copy_backward<D>(first: I, last: I, d_last: D) -> D
    where
        D: BidirectionalCursor + WritableCursor<Value = I::Value>,
        I::Value: Clone;

    /// # Safety
    /// See [`move_backward`].
    unsafe fn move_backward<D>(first: I, last: I, d_last: D) -> D
    where
        D: BidirectionalCursor + WritableCursor<Value = I::Value>;
}

impl<I: BidirectionalCursor> BackwardCopyStrategy<I> for BidirectionalIteratorTag {
    unsafe fn copy_backward<D>(first: I, mut last: I, mut d_last: D) -> D
    where
        D: BidirectionalCursor + WritableCursor<Value = I::Value>,
        I::Value: Clone,
    {
        while first != last {
            last.step_back();
            d_last.step_back();
            // SAFETY: destination slot is live; the old value is dropped by assignment.
            unsafe { *d_last.slot() = last.get().clone() };
        }
        d_last
    }

    unsafe fn move_backward<D>(first: I, mut last: I, mut d_last: D) -> D
    where
        D: BidirectionalCursor + WritableCursor<Value = I::Value>,
    {
        while first != last {
            last.step_back();
            d_last.step_back();
            // SAFETY: caller guarantees sources are live and destinations writable.
            unsafe { ptr::write(d_last.slot(), ptr::read(last.get())) };
        }
        d_last
    }
}

impl<I: RandomAccessCursor> BackwardCopyStrategy<I> for RandomAccessIteratorTag {
    unsafe fn copy_backward<D>(first: I, mut last: I, mut d_last: D) -> D
    where
        D: BidirectionalCursor + WritableCursor<Value = I::Value>,
        I::Value: Clone,
    {
        for _ in 0..last.distance_from(&first).max(0) {
            last.step_back();
            d_last.step_back();
            // SAFETY: destination slot is live; the old value is dropped by assignment.
            unsafe { *d_last.slot() = last.get().clone() };
        }
        d_last
    }

    unsafe fn move_backward<D>(first: I, mut last: I, mut d_last: D) -> D
    where
        D: BidirectionalCursor + WritableCursor<Value = I::Value>,
    {
        for _ in 0..last.distance_from(&first).max(0) {
            last.step_back();
            d_last.step_back();
            // SAFETY: caller guarantees sources are live and destinations writable.
            unsafe { ptr::write(d_last.slot(), ptr::read(last.get())) };
        }
        d_last
    }
}

/// Clones `[first, last)` so that it ends just before `d_last`, last element first
///
/// Returns the cursor to the first written slot.
///
/// # Safety
/// `[first, last)` must be a valid range and the destination slots before
/// `d_last` must hold live values (they are dropped and replaced).
pub unsafe fn copy_backward<I, D>(first: I, last: I, d_last: D) -> D
where
    I: BidirectionalCursor,
    I::Category: BackwardCopyStrategy<I>,
    D: BidirectionalCursor + WritableCursor<Value = I::Value>,
    I::Value: Clone,
{
    // SAFETY: forwarded from the caller.
    unsafe { <I::Category as BackwardCopyStrategy<I>>::copy_backward(first, last, d_last) }
}

/// Relocates `[first, last)` to end just before `d_last`, last element first
///
/// The destination may overlap the source if it ends after it.
///
/// # Safety
/// As [`move_range`].
pub unsafe fn move_backward<I, D>(first: I, last: I, d_last: D) -> D
where
    I: BidirectionalCursor,
    I::Category: BackwardCopyStrategy<I>,
    D: BidirectionalCursor + WritableCursor<Value = I::Value>,
{
    // SAFETY: forwarded from the caller.
    unsafe { <I::Category as BackwardCopyStrategy<I>>::move_backward(first, last, d_last) }
}

// ============================================================================
// Binary search
// ============================================================================

/// Partition-point search implementation for a category
pub trait SearchStrategy<I: ForwardCursor> {
    /// # Safety
    /// See [`partition_point`].
    unsafe fn partition_point<P>(first: I, last: I, pred: P) -> I
    where
        P: FnMut(&I::Value) -> bool;
}

impl<I: ForwardCursor> SearchStrategy<I> for ForwardIteratorTag {
    unsafe fn partition_point<P>(mut first: I, last: I, mut pred: P) -> I
    where
        P: FnMut(&I::Value) -> bool,
    {
        let mut len = <InputIteratorTag as TraversalStrategy<I>>::distance(&first, &last);
        while len > 0 {
            let half = len / 2;
            let mut middle = first.clone();
            <InputIteratorTag as TraversalStrategy<I>>::advance(&mut middle, half);
            // SAFETY: `middle` is strictly inside `[first, last)` since `half < len`.
            if pred(unsafe { middle.get() }) {
                first = middle;
                first.step();
                len -= half + 1;
            } else {
                len = half;
            }
        }
        first
    }
}

impl<I: BidirectionalCursor> SearchStrategy<I> for BidirectionalIteratorTag {
    #[inline]
    unsafe fn partition_point<P>(first: I, last: I, pred: P) -> I
    where
        P: FnMut(&I::Value) -> bool,
    {
        // SAFETY: forwarded from the caller.
        unsafe { <ForwardIteratorTag as SearchStrategy<I>>::partition_point(first, last, pred) }
    }
}

impl<I: RandomAccessCursor> SearchStrategy<I> for RandomAccessIteratorTag {
    unsafe fn partition_point<P>(mut first: I, last: I, mut pred: P) -> I
    where
        P: FnMut(&I::Value) -> bool,
    {
        let mut len = last.distance_from(&first);
        while len > 0 {
            let half = len / 2;
            let mut middle = first.clone();
            middle.jump(half);
            // SAFETY: `middle` is strictly inside `[first, last)` since `half < len`.
            if pred(unsafe { middle.get() }) {
                middle.step();
                first = middle;
                len -= half + 1;
            } else {
                len = half;
            }
        }
        first
    }
}

/// First position in `[first, last)` where `pred` is false
///
/// The range must be partitioned: every element satisfying `pred` precedes
/// every element that does not.
///
/// # Safety
/// `[first, last)` must be a valid range of live elements.
pub unsafe fn partition_point<I, P>(first: I, last: I, pred: P) -> I
where
    I: ForwardCursor,
    I::Category: SearchStrategy<I>,
    P: FnMut(&I::Value) -> bool,
{
    // SAFETY: forwarded from the caller.
    unsafe { <I::Category as SearchStrategy<I>>::partition_point(first, last, pred) }
}

/// First position whose element is not less than `value`
///
/// Equal elements resolve to the lowest index.
///
/// # Safety
/// `[first, last)` must be a valid range of live elements, sorted ascending.
pub unsafe fn lower_bound<I>(first: I, last: I, value: &I::Value) -> I
where
    I: ForwardCursor,
    I::Category: SearchStrategy<I>,
    I::Value: Ord,
{
    // SAFETY: forwarded from the caller.
    unsafe { partition_point(first, last, |elem| elem < value) }
}

/// [`lower_bound`] with a custom strict-weak `less`
///
/// # Safety
/// As [`lower_bound`], with the range sorted by `less`.
pub unsafe fn lower_bound_by<I, F>(first: I, last: I, value: &I::Value, mut less: F) -> I
where
    I: ForwardCursor,
    I::Category: SearchStrategy<I>,
    F: FnMut(&I::Value, &I::Value) -> bool,
{
    // SAFETY: forwarded from the caller.
    unsafe { partition_point(first, last, |elem| less(elem, value)) }
}

/// First position whose element is greater than `value`
///
/// # Safety
/// As [`lower_bound`].
pub unsafe fn upper_bound<I>(first: I, last: I, value: &I::Value) -> I
where
    I: ForwardCursor,
    I::Category: SearchStrategy<I>,
    I::Value: Ord,
{
    // SAFETY: forwarded from the caller.
    unsafe { partition_point(first, last, |elem| elem <= value) }
}

/// Range of elements equal to `value`
///
/// # Safety
/// As [`lower_bound`].
pub unsafe fn equal_range<I>(first: I, last: I, value: &I::Value) -> (I, I)
where
    I: ForwardCursor,
    I::Category: SearchStrategy<I>,
    I::Value: Ord,
{
    // SAFETY: forwarded from the caller.
    unsafe {
        let lower = lower_bound(first, last.clone(), value);
        let upper = upper_bound(lower.clone(), last, value);
        (lower, upper)
    }
}

/// Whether the sorted range contains `value`
///
/// # Safety
/// As [`lower_bound`].
pub unsafe fn binary_search<I>(first: I, last: I, value: &I::Value) -> bool
where
    I: ForwardCursor,
    I::Category: SearchStrategy<I>,
    I::Value: Ord,
{
    // SAFETY: forwarded from the caller; `found` is dereferenced only if it is not `last`.
    unsafe {
        let found = lower_bound(first, last.clone(), value);
        found != last && found.get() <= value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::iter::adapters::{BackInserter, ForwardOnly, InputOnly, SliceCursor};

    fn bounds<T>(values: &[T]) -> (*const T, *const T) {
        let range = values.as_ptr_range();
        (range.start, range.end)
    }

    #[test]
    fn test_distance_and_advance() {
        let values = [1, 2, 3, 4, 5];
        let (first, last) = bounds(&values);
        assert_eq!(distance(&first, &last), 5);

        let input_first = InputOnly::new(first);
        let input_last = InputOnly::new(last);
        assert_eq!(distance(&input_first, &input_last), 5);

        let mut it = first;
        advance(&mut it, 3);
        assert_eq!(unsafe { *it }, 4);
        assert_eq!(unsafe { *prev(&it, 2) }, 2);
        assert_eq!(next(&first, 5), last);
    }

    #[test]
    fn test_copy_into_vec() {
        let values = ["a".to_string(), "b".to_string(), "c".to_string()];
        let (first, last) = bounds(&values);
        let mut out = Vec::new();

        unsafe {
            copy(first, last, BackInserter::new(&mut out));
            copy(InputOnly::new(first), InputOnly::new(last), BackInserter::new(&mut out));
            copy_n(first, 1, BackInserter::new(&mut out));
        }
        assert_eq!(out, ["a", "b", "c", "a", "b", "c", "a"]);
    }

    #[test]
    fn test_copy_backward_overlapping_shift() {
        let mut values = [1, 2, 3, 4, 0];
        let first = values.as_mut_ptr();
        unsafe {
            let start = copy_backward(first, first.add(4), first.add(5));
            assert_eq!(start, first.add(1));
        }
        assert_eq!(values, [1, 1, 2, 3, 4]);
    }

    #[test]
    fn test_move_range_and_backward() {
        let mut values = [
            "w".to_string(),
            "x".to_string(),
            "y".to_string(),
            "z".to_string(),
        ];
        let first = values.as_mut_ptr();
        unsafe {
            // Drop "w", shift the rest one slot left, then back again
            core::ptr::drop_in_place(first);
            move_range(first.add(1), first.add(4), first);
            assert_eq!(*first, "x");
            move_backward(first, first.add(3), first.add(4));
            core::ptr::write(first, "v".to_string());
        }
        assert_eq!(values, ["v", "x", "y", "z"]);
    }

    #[test]
    fn test_copy_trivial() {
        let source = [1u8, 2, 3, 4];
        let mut dest = [0u8; 6];
        let (first, last) = bounds(&source);
        let end = unsafe { copy_trivial(first, last, dest.as_mut_ptr().add(1)) };
        assert_eq!(end, dest.as_mut_ptr().wrapping_add(5));
        assert_eq!(dest, [0, 1, 2, 3, 4, 0]);
    }

    #[test]
    fn test_copy_trivial_matches_dispatched_copy() {
        let source: Vec<u32> = (0..100).collect();
        let (first, last) = bounds(&source);
        let mut bulk = vec![0u32; 100];
        let mut stepped = vec![0u32; 100];
        unsafe {
            copy_trivial(first, last, bulk.as_mut_ptr());
            copy(first, last, stepped.as_mut_ptr());
        }
        assert_eq!(bulk, stepped);
        assert_eq!(bulk, source);
    }

    #[test]
    fn test_bounds_agree_across_categories() {
        let values = [1, 2, 3, 3, 3, 4, 5];
        let (first, last) = bounds(&values);

        for target in 0..=6 {
            let expected_lower = values.partition_point(|v| *v < target) as isize;
            let expected_upper = values.partition_point(|v| *v <= target) as isize;

            unsafe {
                let lower = lower_bound(first, last, &target);
                assert_eq!(lower.distance_from(&first), expected_lower);

                let forward = lower_bound(ForwardOnly::new(first), ForwardOnly::new(last), &target);
                assert_eq!(forward.into_inner().distance_from(&first), expected_lower);

                let upper = upper_bound(first, last, &target);
                assert_eq!(upper.distance_from(&first), expected_upper);

                let found = binary_search(first, last, &target);
                assert_eq!(found, values.contains(&target));
            }
        }
    }

    #[test]
    fn test_equal_range_on_slice_cursor() {
        let values = [1, 2, 3, 3, 3, 4, 5];
        let (first, last) = SliceCursor::range(&values);
        let (lower, upper) = unsafe { equal_range(first, last, &3) };
        assert_eq!(lower.position(), 2);
        assert_eq!(upper.position(), 5);

        let descending = [9, 7, 5, 3];
        let (first, last) = SliceCursor::range(&descending);
        let at = unsafe { lower_bound_by(first, last, &5, |a, b| a > b) };
        assert_eq!(at.position(), 2);
    }
}
