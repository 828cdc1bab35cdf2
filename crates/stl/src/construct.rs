//! Object lifetime primitives over raw storage
//!
//! Allocators hand out uninitialized bytes; these helpers start and end
//! object lifetimes in that storage. Destruction of types without drop glue
//! compiles to nothing (`needs_drop` is resolved at compile time).
//!
//! The `uninitialized_*` functions either initialize every target slot or,
//! if a clone panics part way, drop the ones already written before the
//! panic continues. The target range is then uninitialized again.

use core::mem::{self, ManuallyDrop};
use core::ptr::{self, NonNull};

/// Moves `value` into uninitialized storage
///
/// # Safety
/// `slot` must be valid for writes and properly aligned. Any previous value
/// is overwritten without being dropped.
#[inline]
pub unsafe fn construct<T>(slot: NonNull<T>, value: T) {
    // SAFETY: forwarded from the caller.
    unsafe { slot.as_ptr().write(value) }
}

/// Writes `T::default()` into uninitialized storage
///
/// # Safety
/// See [`construct`].
#[inline]
pub unsafe fn construct_default<T: Default>(slot: NonNull<T>) {
    // SAFETY: forwarded from the caller.
    unsafe { construct(slot, T::default()) }
}

/// Writes a clone of `source` into uninitialized storage
///
/// # Safety
/// See [`construct`].
#[inline]
pub unsafe fn construct_clone<T: Clone>(slot: NonNull<T>, source: &T) {
    // SAFETY: forwarded from the caller.
    unsafe { construct(slot, source.clone()) }
}

/// Writes the result of `init` into uninitialized storage
///
/// If `init` panics the slot stays uninitialized.
///
/// # Safety
/// See [`construct`].
#[inline]
pub unsafe fn construct_with<T>(slot: NonNull<T>, init: impl FnOnce() -> T) {
    // SAFETY: forwarded from the caller.
    unsafe { construct(slot, init()) }
}

/// Ends the lifetime of the value at `slot`
///
/// # Safety
/// `slot` must hold an initialized value that is not used again.
#[inline]
pub unsafe fn destroy<T>(slot: NonNull<T>) {
    if const { mem::needs_drop::<T>() } {
        // SAFETY: forwarded from the caller.
        unsafe { ptr::drop_in_place(slot.as_ptr()) }
    }
}

/// Ends the lifetime of `n` contiguous values starting at `first`
///
/// # Safety
/// `first..first + n` must hold initialized values that are not used again.
#[inline]
pub unsafe fn destroy_n<T>(first: NonNull<T>, n: usize) {
    if const { mem::needs_drop::<T>() } {
        // SAFETY: forwarded from the caller.
        unsafe { ptr::drop_in_place(ptr::slice_from_raw_parts_mut(first.as_ptr(), n)) }
    }
}

/// Ends the lifetime of every value in `[first, last)`
///
/// # Safety
/// Both pointers must belong to the same allocation with `first <= last`,
/// and the range must hold initialized values that are not used again.
#[inline]
pub unsafe fn destroy_range<T>(first: NonNull<T>, last: NonNull<T>) {
    if const { mem::needs_drop::<T>() } {
        // SAFETY: forwarded from the caller; `first <= last`.
        unsafe {
            let n = last.offset_from(first) as usize;
            destroy_n(first, n);
        }
    }
}

/// Drops the prefix written so far if initialization unwinds
struct InitGuard<T> {
    first: NonNull<T>,
    initialized: usize,
}

impl<T> InitGuard<T> {
    fn new(first: NonNull<T>) -> Self {
        Self {
            first,
            initialized: 0,
        }
    }

    fn commit(self) -> usize {
        ManuallyDrop::new(self).initialized
    }
}

impl<T> Drop for InitGuard<T> {
    fn drop(&mut self) {
        // SAFETY: exactly `initialized` values were written from `first`.
        unsafe { destroy_n(self.first, self.initialized) }
    }
}

/// Fills `n` uninitialized slots from `first` with clones of `value`
///
/// # Safety
/// `first..first + n` must be valid for writes and uninitialized.
pub unsafe fn uninitialized_fill_n<T: Clone>(first: NonNull<T>, n: usize, value: &T) {
    let mut guard = InitGuard::new(first);
    for i in 0..n {
        // SAFETY: `i < n`, inside the caller's range.
        unsafe { construct_clone(first.add(i), value) };
        guard.initialized += 1;
    }
    guard.commit();
}

/// Clones `source` into uninitialized storage starting at `dest`
///
/// # Safety
/// `dest..dest + source.len()` must be valid for writes, uninitialized and
/// must not overlap `source`.
pub unsafe fn uninitialized_copy<T: Clone>(source: &[T], dest: NonNull<T>) {
    let mut guard = InitGuard::new(dest);
    for (i, item) in source.iter().enumerate() {
        // SAFETY: `i < source.len()`, inside the caller's range.
        unsafe { construct_clone(dest.add(i), item) };
        guard.initialized += 1;
    }
    guard.commit();
}

/// Writes up to `n` items from `iter` into uninitialized storage
///
/// Returns how many slots were initialized; fewer than `n` when the
/// iterator runs dry.
///
/// # Safety
/// `dest..dest + n` must be valid for writes and uninitialized.
pub unsafe fn uninitialized_from_iter<T>(
    iter: impl IntoIterator<Item = T>,
    dest: NonNull<T>,
    n: usize,
) -> usize {
    let mut guard = InitGuard::new(dest);
    for item in iter.into_iter().take(n) {
        // SAFETY: at most `n` items are written.
        unsafe { construct(dest.add(guard.initialized), item) };
        guard.initialized += 1;
    }
    guard.commit()
}

/// Relocates `n` values from `source` to uninitialized `dest`
///
/// The ranges may overlap. Afterwards the source slots are logically
/// uninitialized.
///
/// # Safety
/// Both ranges must be valid for `n` values; `source` must be initialized.
#[inline]
pub unsafe fn uninitialized_move<T>(source: NonNull<T>, dest: NonNull<T>, n: usize) {
    // SAFETY: forwarded from the caller.
    unsafe { ptr::copy(source.as_ptr(), dest.as_ptr(), n) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::mem::MaybeUninit;
    use std::cell::Cell;
    use std::panic::{self, AssertUnwindSafe};
    use std::rc::Rc;

    /// Counts live instances; panics on the N-th clone
    struct Witness {
        live: Rc<Cell<usize>>,
        fail_at: Option<usize>,
        clones: Rc<Cell<usize>>,
    }

    impl Witness {
        fn new(live: &Rc<Cell<usize>>, fail_at: Option<usize>) -> Self {
            live.set(live.get() + 1);
            Self {
                live: Rc::clone(live),
                fail_at,
                clones: Rc::new(Cell::new(0)),
            }
        }
    }

    impl Clone for Witness {
        fn clone(&self) -> Self {
            let n = self.clones.get() + 1;
            self.clones.set(n);
            if self.fail_at == Some(n) {
                panic!("clone {n} failed");
            }
            self.live.set(self.live.get() + 1);
            Self {
                live: Rc::clone(&self.live),
                fail_at: self.fail_at,
                clones: Rc::clone(&self.clones),
            }
        }
    }

    impl Drop for Witness {
        fn drop(&mut self) {
            self.live.set(self.live.get() - 1);
        }
    }

    fn slots<T, const N: usize>(storage: &mut [MaybeUninit<T>; N]) -> NonNull<T> {
        NonNull::new(storage.as_mut_ptr().cast()).unwrap()
    }

    #[test]
    fn test_construct_and_destroy() {
        let live = Rc::new(Cell::new(0));
        let mut storage = [const { MaybeUninit::<Witness>::uninit() }; 2];
        let first = slots(&mut storage);

        unsafe {
            construct(first, Witness::new(&live, None));
            construct_clone(first.add(1), &*first.as_ptr());
            assert_eq!(live.get(), 2);
            destroy(first);
            destroy_range(first.add(1), first.add(2));
        }
        assert_eq!(live.get(), 0);
    }

    #[test]
    fn test_construct_default_and_with() {
        let mut storage = [const { MaybeUninit::<String>::uninit() }; 2];
        let first = slots(&mut storage);

        unsafe {
            construct_default(first);
            construct_with(first.add(1), || "built".to_string());
            assert!((&(*first.as_ptr())).is_empty());
            assert_eq!(*first.add(1).as_ptr(), "built");
            destroy_n(first, 2);
        }
    }

    #[test]
    fn test_fill_n_rolls_back_on_panic() {
        let live = Rc::new(Cell::new(0));
        let template = Witness::new(&live, Some(4));
        let mut storage = [const { MaybeUninit::<Witness>::uninit() }; 6];
        let first = slots(&mut storage);

        let result = panic::catch_unwind(AssertUnwindSafe(|| unsafe {
            uninitialized_fill_n(first, 6, &template);
        }));

        assert!(result.is_err());
        // Only the template survives; the three finished clones were dropped
        assert_eq!(live.get(), 1);
    }

    #[test]
    fn test_copy_and_from_iter() {
        let source = vec!["a".to_string(), "b".to_string()];
        let mut storage = [const { MaybeUninit::<String>::uninit() }; 4];
        let first = slots(&mut storage);

        unsafe {
            uninitialized_copy(&source, first);
            let written = uninitialized_from_iter(["c".to_string()], first.add(2), 2);
            assert_eq!(written, 1);
            assert_eq!(*first.add(1).as_ptr(), "b");
            assert_eq!(*first.add(2).as_ptr(), "c");
            destroy_n(first, 3);
        }
    }

    #[test]
    fn test_uninitialized_move_overlapping() {
        let mut values = [1u32, 2, 3, 4, 5];
        let first = NonNull::new(values.as_mut_ptr()).unwrap();
        unsafe { uninitialized_move(first, first.add(1), 4) };
        assert_eq!(values, [1, 1, 2, 3, 4]);
    }
}
