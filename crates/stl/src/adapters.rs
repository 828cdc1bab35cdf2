//! LIFO and FIFO adapters over [`Deque`]

use core::fmt;

use crate::allocator::{Allocator, DefaultAllocator};
use crate::deque::Deque;
use crate::error::StlResult;

/// Last-in first-out stack; the top is the back of the deque
pub struct Stack<T, A: Allocator = DefaultAllocator> {
    inner: Deque<T, A>,
}

impl<T> Stack<T> {
    pub fn new() -> Self {
        Self { inner: Deque::new() }
    }
}

impl<T> Default for Stack<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, A: Allocator> Stack<T, A> {
    pub fn new_in(alloc: A) -> Self {
        Self {
            inner: Deque::new_in(alloc),
        }
    }

    /// Wraps an existing deque; its back becomes the top
    pub fn from_deque(inner: Deque<T, A>) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> Deque<T, A> {
        self.inner
    }

    pub fn push(&mut self, value: T) {
        self.inner.push_back(value);
    }

    pub fn try_push(&mut self, value: T) -> StlResult<()> {
        self.inner.try_push_back(value)
    }

    pub fn pop(&mut self) -> Option<T> {
        self.inner.pop_back()
    }

    pub fn top(&self) -> Option<&T> {
        self.inner.back()
    }

    pub fn top_mut(&mut self) -> Option<&mut T> {
        self.inner.back_mut()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl<T: fmt::Debug, A: Allocator> fmt::Debug for Stack<T, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stack").field("items", &self.inner).finish()
    }
}

impl<T: PartialEq, A: Allocator> PartialEq for Stack<T, A> {
    fn eq(&self, other: &Self) -> bool {
        self.inner == other.inner
    }
}

impl<T, A: Allocator> Extend<T> for Stack<T, A> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        self.inner.extend(iter);
    }
}

/// First-in first-out queue: push at the back, pop at the front
pub struct Queue<T, A: Allocator = DefaultAllocator> {
    inner: Deque<T, A>,
}

impl<T> Queue<T> {
    pub fn new() -> Self {
        Self { inner: Deque::new() }
    }
}

impl<T> Default for Queue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, A: Allocator> Queue<T, A> {
    pub fn new_in(alloc: A) -> Self {
        Self {
            inner: Deque::new_in(alloc),
        }
    }

    /// Wraps an existing deque; its front is the next element out
    pub fn from_deque(inner: Deque<T, A>) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> Deque<T, A> {
        self.inner
    }

    pub fn push(&mut self, value: T) {
        self.inner.push_back(value);
    }

    pub fn try_push(&mut self, value: T) -> StlResult<()> {
        self.inner.try_push_back(value)
    }

    pub fn pop(&mut self) -> Option<T> {
        self.inner.pop_front()
    }

    /// Next element out
    pub fn front(&self) -> Option<&T> {
        self.inner.front()
    }

    pub fn front_mut(&mut self) -> Option<&mut T> {
        self.inner.front_mut()
    }

    /// Most recently pushed element
    pub fn back(&self) -> Option<&T> {
        self.inner.back()
    }

    pub fn back_mut(&mut self) -> Option<&mut T> {
        self.inner.back_mut()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl<T: fmt::Debug, A: Allocator> fmt::Debug for Queue<T, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Queue").field("items", &self.inner).finish()
    }
}

impl<T: PartialEq, A: Allocator> PartialEq for Queue<T, A> {
    fn eq(&self, other: &Self) -> bool {
        self.inner == other.inner
    }
}

impl<T, A: Allocator> Extend<T> for Queue<T, A> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        self.inner.extend(iter);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocator::FreeListAllocator;

    #[test]
    fn test_stack_is_lifo() {
        let mut stack = Stack::new();
        stack.extend(1..=3);
        stack.push(4);
        assert_eq!(stack.top(), Some(&4));
        assert_eq!(stack.pop(), Some(4));
        assert_eq!(stack.pop(), Some(3));
        *stack.top_mut().unwrap() = 20;
        assert_eq!(stack.len(), 2);
        assert_eq!(stack.into_inner().iter().copied().collect::<Vec<_>>(), [1, 20]);
    }

    #[test]
    fn test_queue_is_fifo() {
        let mut queue = Queue::new();
        for word in ["a", "b", "c"] {
            queue.push(word);
        }
        assert_eq!(queue.front(), Some(&"a"));
        assert_eq!(queue.back(), Some(&"c"));
        assert_eq!(queue.pop(), Some("a"));
        assert_eq!(queue.pop(), Some("b"));
        assert_eq!(queue.pop(), Some("c"));
        assert!(queue.is_empty());
        assert_eq!(queue.pop(), None);
    }

    #[test]
    fn test_adapters_on_explicit_pool() {
        let pool = FreeListAllocator::new();
        let mut queue = Queue::new_in(&pool);
        let mut stack = Stack::new_in(&pool);
        for i in 0..1000u32 {
            queue.push(i);
            stack.push(i);
        }
        assert_eq!(queue.pop(), Some(0));
        assert_eq!(stack.pop(), Some(999));
        assert_eq!(queue.len() + stack.len(), 1998);
    }
}
