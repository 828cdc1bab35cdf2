//! Rust iterators over a deque

use core::fmt;
use core::iter::FusedIterator;
use core::marker::PhantomData;

use super::Deque;
use super::buffer::{self, Map, Position, buffer_len};
use crate::allocator::Allocator;

/// Borrowing iterator, see [`Deque::iter`]
pub struct Iter<'a, T> {
    map: Map<T>,
    front: usize,
    back: usize,
    _marker: PhantomData<&'a T>,
}

// SAFETY: the iterator only hands out `&T`, like `&[T]`.
unsafe impl<T: Sync> Send for Iter<'_, T> {}
// SAFETY: as above.
unsafe impl<T: Sync> Sync for Iter<'_, T> {}

impl<T> Iter<'_, T> {
    pub(super) fn new(map: Map<T>, front: usize, back: usize) -> Self {
        Self {
            map,
            front,
            back,
            _marker: PhantomData,
        }
    }
}

impl<T> Clone for Iter<'_, T> {
    fn clone(&self) -> Self {
        Self::new(self.map, self.front, self.back)
    }
}

impl<T> fmt::Debug for Iter<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Iter").field("remaining", &(self.back - self.front)).finish()
    }
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    #[inline]
    fn next(&mut self) -> Option<&'a T> {
        if self.front == self.back {
            return None;
        }
        let pos = Position::from_linear(self.front, buffer_len::<T>());
        self.front += 1;
        // SAFETY: positions in `[front, back)` are live elements borrowed for `'a`.
        Some(unsafe { buffer::slot(self.map, pos).as_ref() })
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self.back - self.front;
        (len, Some(len))
    }

    #[inline]
    fn nth(&mut self, n: usize) -> Option<&'a T> {
        self.front = self.front.saturating_add(n).min(self.back);
        self.next()
    }
}

impl<'a, T> DoubleEndedIterator for Iter<'a, T> {
    #[inline]
    fn next_back(&mut self) -> Option<&'a T> {
        if self.front == self.back {
            return None;
        }
        self.back -= 1;
        let pos = Position::from_linear(self.back, buffer_len::<T>());
        // SAFETY: as in `next`.
        Some(unsafe { buffer::slot(self.map, pos).as_ref() })
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}
impl<T> FusedIterator for Iter<'_, T> {}

/// Mutably borrowing iterator, see [`Deque::iter_mut`]
pub struct IterMut<'a, T> {
    map: Map<T>,
    front: usize,
    back: usize,
    _marker: PhantomData<&'a mut T>,
}

// SAFETY: the iterator hands out disjoint `&mut T`, like `&mut [T]`.
unsafe impl<T: Send> Send for IterMut<'_, T> {}
// SAFETY: shared access to the iterator exposes no element.
unsafe impl<T: Sync> Sync for IterMut<'_, T> {}

impl<T> IterMut<'_, T> {
    pub(super) fn new(map: Map<T>, front: usize, back: usize) -> Self {
        Self {
            map,
            front,
            back,
            _marker: PhantomData,
        }
    }
}

impl<T> fmt::Debug for IterMut<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IterMut").field("remaining", &(self.back - self.front)).finish()
    }
}

impl<'a, T> Iterator for IterMut<'a, T> {
    type Item = &'a mut T;

    #[inline]
    fn next(&mut self) -> Option<&'a mut T> {
        if self.front == self.back {
            return None;
        }
        let pos = Position::from_linear(self.front, buffer_len::<T>());
        self.front += 1;
        // SAFETY: each live position is yielded at most once, so the
        // exclusive borrows never alias.
        Some(unsafe { buffer::slot(self.map, pos).as_mut() })
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self.back - self.front;
        (len, Some(len))
    }
}

impl<'a, T> DoubleEndedIterator for IterMut<'a, T> {
    #[inline]
    fn next_back(&mut self) -> Option<&'a mut T> {
        if self.front == self.back {
            return None;
        }
        self.back -= 1;
        let pos = Position::from_linear(self.back, buffer_len::<T>());
        // SAFETY: as in `next`.
        Some(unsafe { buffer::slot(self.map, pos).as_mut() })
    }
}

impl<T> ExactSizeIterator for IterMut<'_, T> {}
impl<T> FusedIterator for IterMut<'_, T> {}

/// Owning iterator, see [`Deque::into_iter`](IntoIterator::into_iter)
pub struct IntoIter<T, A: Allocator> {
    deque: Deque<T, A>,
}

impl<T, A: Allocator> IntoIter<T, A> {
    pub(super) fn new(deque: Deque<T, A>) -> Self {
        Self { deque }
    }
}

impl<T: fmt::Debug, A: Allocator> fmt::Debug for IntoIter<T, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("IntoIter").field(&self.deque).finish()
    }
}

impl<T, A: Allocator> Iterator for IntoIter<T, A> {
    type Item = T;

    #[inline]
    fn next(&mut self) -> Option<T> {
        self.deque.pop_front()
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self.deque.len();
        (len, Some(len))
    }
}

impl<T, A: Allocator> DoubleEndedIterator for IntoIter<T, A> {
    #[inline]
    fn next_back(&mut self) -> Option<T> {
        self.deque.pop_back()
    }
}

impl<T, A: Allocator> ExactSizeIterator for IntoIter<T, A> {}
impl<T, A: Allocator> FusedIterator for IntoIter<T, A> {}

#[cfg(test)]
mod tests {
    use crate::deque::Deque;

    fn assert_send_sync<T: Send + Sync>(_: &T) {}

    #[test]
    fn test_iterators_cross_threads() {
        let mut deque: Deque<u32> = (0..1500).collect();
        let iter = deque.iter();
        assert_send_sync(&iter);
        let sum = std::thread::scope(|s| s.spawn(move || iter.sum::<u32>()).join().unwrap());
        assert_eq!(sum, (0..1500).sum::<u32>());

        let iter_mut = deque.iter_mut();
        assert_send_sync(&iter_mut);
        std::thread::scope(|s| {
            s.spawn(move || iter_mut.for_each(|v| *v *= 2));
        });
        assert_eq!(deque[700], 1400);
    }

    #[test]
    fn test_iter_both_directions() {
        let deque: Deque<u16> = (0..600).collect();
        let mut iter = deque.iter();
        assert_eq!(iter.next(), Some(&0));
        assert_eq!(iter.next_back(), Some(&599));
        assert_eq!(iter.len(), 598);
        assert_eq!(iter.nth(300), Some(&301));
        assert_eq!(iter.clone().count(), 297);
        assert_eq!(iter.rev().next(), Some(&598));
    }

    #[test]
    fn test_iter_mut_meets_in_middle() {
        let mut deque: Deque<i32> = (0..5).collect();
        let mut iter = deque.iter_mut();
        *iter.next().unwrap() = 10;
        *iter.next_back().unwrap() = 40;
        assert_eq!(iter.len(), 3);
        iter.for_each(|v| *v = -*v);
        assert_eq!(deque.iter().copied().collect::<Vec<_>>(), [10, -1, -2, -3, 40]);
    }

    #[test]
    fn test_into_iter_drops_rest() {
        use std::rc::Rc;

        let marker = Rc::new(());
        let deque: Deque<Rc<()>> = (0..100).map(|_| Rc::clone(&marker)).collect();
        let mut owned = deque.into_iter();
        let first = owned.next();
        let last = owned.next_back();
        assert_eq!(owned.len(), 98);
        drop(owned);
        assert_eq!(Rc::strong_count(&marker), 3);
        drop((first, last));
        assert_eq!(Rc::strong_count(&marker), 1);
    }
}
