//! Segmented-buffer double-ended queue
//!
//! Elements live in fixed-size buffers (see [`buffer_len`]); a map holds one
//! pointer per buffer. Growth at either end allocates one buffer at a time
//! and only touches the map when it runs out of spare slots, in which case
//! the run of buffer pointers is recentred in place or copied into a larger
//! map. Elements never move when the deque grows at its ends.
//!
//! ```text
//! map:   [ None | buf | buf | buf | None | None ]
//!                  ^start.node  ^finish.node
//! buf:   [ . . x x ]  [ x x x x ]  [ x . . . ]
//!              ^start                ^finish (one past the last element)
//! ```
//!
//! Insertion and removal in the middle shift whichever side of the position
//! holds fewer elements; when both sides are equal the front side moves.

use core::fmt;
use core::marker::PhantomData;
use core::mem::{self, ManuallyDrop};
use core::ops::{Index, IndexMut};
use core::ptr::{self, NonNull};

#[cfg(feature = "logging")]
use tracing::trace;

use crate::allocator::{Allocator, DefaultAllocator, TypedAllocator};
use crate::construct::{construct, destroy_n, uninitialized_fill_n};
use crate::error::{OrPanic, StlError, StlResult};
use crate::iter::PushBack;

mod buffer;
mod cursor;
mod iter;

use buffer::{Map, Position};
pub use buffer::{BUFFER_BYTES, buffer_len};
pub use cursor::DequeCursor;
pub use iter::{IntoIter, Iter, IterMut};

/// Smallest map ever allocated
pub const INITIAL_MAP_SIZE: usize = 8;

/// Double-ended queue over segmented buffers
pub struct Deque<T, A: Allocator = DefaultAllocator> {
    map: Map<T>,
    map_size: usize,
    start: Position,
    finish: Position,
    alloc: A,
    _marker: PhantomData<T>,
}

// SAFETY: the deque owns its elements and storage like `Vec` does.
unsafe impl<T: Send, A: Allocator + Send> Send for Deque<T, A> {}
// SAFETY: shared access only hands out `&T`.
unsafe impl<T: Sync, A: Allocator + Sync> Sync for Deque<T, A> {}

impl<T> Deque<T> {
    /// Creates an empty deque on this thread's pool
    ///
    /// # Panics
    /// If the map or first buffer cannot be allocated.
    pub fn new() -> Self {
        Self::new_in(DefaultAllocator::new())
    }

    /// Deque of `n` clones of `value` on this thread's pool
    ///
    /// # Panics
    /// If allocation fails or `n` exceeds `max_size()`.
    pub fn from_elem(n: usize, value: &T) -> Self
    where
        T: Clone,
    {
        Self::from_elem_in(n, value, DefaultAllocator::new()).or_panic()
    }
}

impl<T> Default for Deque<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, A: Allocator> Deque<T, A> {
    const BUF: usize = buffer_len::<T>();

    // ------------------------------------------------------------------
    // Construction
    // ------------------------------------------------------------------

    /// Creates an empty deque: a map and one buffer
    ///
    /// # Errors
    /// `OutOfMemory` if the allocator cannot supply them.
    pub fn try_new_in(alloc: A) -> StlResult<Self> {
        Self::with_nodes_for(0, alloc)
    }

    /// Creates an empty deque, panicking on allocation failure
    pub fn new_in(alloc: A) -> Self {
        Self::try_new_in(alloc).or_panic()
    }

    /// Deque of `n` clones of `value`
    ///
    /// # Errors
    /// `LengthExceeded` above `max_size()`; `OutOfMemory` from the allocator.
    pub fn from_elem_in(n: usize, value: &T, alloc: A) -> StlResult<Self>
    where
        T: Clone,
    {
        let mut deque = Self::with_nodes_for(n, alloc)?;

        // Buffers are filled whole from the first one; `finish` follows each
        // completed buffer so a panicking clone leaves a consistent deque.
        let mut node = deque.start.node;
        let mut remaining = n;
        while remaining > 0 {
            let chunk = remaining.min(Self::BUF);
            // SAFETY: `node` was given a fresh buffer by `with_nodes_for`.
            unsafe {
                let first = buffer::slot(deque.map, Position::new(node, 0));
                uninitialized_fill_n(first, chunk, value);
            }
            remaining -= chunk;
            deque.finish = Position::from_linear(deque.finish.linear(Self::BUF) + chunk, Self::BUF);
            node += 1;
        }

        Ok(deque)
    }

    /// Deque of `n` default values
    ///
    /// # Errors
    /// As [`from_elem_in`](Self::from_elem_in).
    pub fn with_len_in(n: usize, alloc: A) -> StlResult<Self>
    where
        T: Default + Clone,
    {
        Self::from_elem_in(n, &T::default(), alloc)
    }

    /// Allocates a map and enough buffers for `num_elements`, with `len() == 0`
    fn with_nodes_for(num_elements: usize, alloc: A) -> StlResult<Self> {
        let max = Self::max_len();
        if num_elements > max {
            return Err(StlError::length_exceeded(num_elements, max));
        }

        let num_nodes = num_elements / Self::BUF + 1;
        let map_size = INITIAL_MAP_SIZE.max(num_nodes + 2);
        let map = Self::allocate_map(&alloc, map_size)?;
        let node_start = (map_size - num_nodes) / 2;

        let mut deque = Self {
            map,
            map_size,
            start: Position::new(node_start, 0),
            finish: Position::new(node_start, 0),
            alloc,
            _marker: PhantomData,
        };

        // On failure `deque` is dropped, which releases every buffer so far
        for node in node_start..node_start + num_nodes {
            let buffer = deque.allocate_buffer()?;
            deque.set_buffer(node, Some(buffer));
        }

        Ok(deque)
    }

    // ------------------------------------------------------------------
    // Capacity and inspection
    // ------------------------------------------------------------------

    /// Number of elements
    #[inline]
    pub fn len(&self) -> usize {
        self.finish.linear(Self::BUF) - self.start.linear(Self::BUF)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.start == self.finish
    }

    /// Largest length this deque can reach
    #[inline]
    pub fn max_size(&self) -> usize {
        Self::max_len()
    }

    #[inline]
    const fn max_len() -> usize {
        isize::MAX as usize / buffer_size_of::<T>()
    }

    /// Elements per buffer
    #[inline]
    pub fn buffer_len(&self) -> usize {
        Self::BUF
    }

    /// Slots in the buffer map
    #[inline]
    pub fn map_size(&self) -> usize {
        self.map_size
    }

    /// Buffers currently allocated
    pub fn allocated_buffers(&self) -> usize {
        (0..self.map_size)
            .filter(|&node| self.map_entry(node).is_some())
            .count()
    }

    /// Allocator backing this deque
    pub fn allocator(&self) -> &A {
        &self.alloc
    }

    // ------------------------------------------------------------------
    // Element access
    // ------------------------------------------------------------------

    pub fn get(&self, index: usize) -> Option<&T> {
        // SAFETY: index is in bounds.
        (index < self.len()).then(|| unsafe { self.get_unchecked(index) })
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        if index < self.len() {
            // SAFETY: index is in bounds.
            Some(unsafe { self.get_unchecked_mut(index) })
        } else {
            None
        }
    }

    /// Bounds-checked access
    ///
    /// # Errors
    /// `OutOfRange` when `index >= len()`.
    pub fn at(&self, index: usize) -> StlResult<&T> {
        let len = self.len();
        self.get(index)
            .ok_or_else(|| StlError::out_of_range(index, len))
    }

    /// Bounds-checked mutable access
    ///
    /// # Errors
    /// `OutOfRange` when `index >= len()`.
    pub fn at_mut(&mut self, index: usize) -> StlResult<&mut T> {
        let len = self.len();
        self.get_mut(index)
            .ok_or_else(|| StlError::out_of_range(index, len))
    }

    /// # Safety
    /// `index < len()`.
    #[inline]
    pub unsafe fn get_unchecked(&self, index: usize) -> &T {
        // SAFETY: caller guarantees `index` addresses a live element.
        unsafe { self.slot_at(index).as_ref() }
    }

    /// # Safety
    /// `index < len()`.
    #[inline]
    pub unsafe fn get_unchecked_mut(&mut self, index: usize) -> &mut T {
        // SAFETY: caller guarantees `index` addresses a live element.
        unsafe { self.slot_at(index).as_mut() }
    }

    pub fn front(&self) -> Option<&T> {
        self.get(0)
    }

    pub fn front_mut(&mut self) -> Option<&mut T> {
        self.get_mut(0)
    }

    pub fn back(&self) -> Option<&T> {
        self.len().checked_sub(1).and_then(|last| self.get(last))
    }

    pub fn back_mut(&mut self) -> Option<&mut T> {
        self.len().checked_sub(1).and_then(|last| self.get_mut(last))
    }

    // ------------------------------------------------------------------
    // Ends
    // ------------------------------------------------------------------

    /// Appends an element, allocating a new back buffer when the last one fills
    ///
    /// # Errors
    /// `LengthExceeded` at `max_size()`; `OutOfMemory` from the allocator.
    /// The deque is unchanged on error.
    pub fn try_push_back(&mut self, value: T) -> StlResult<()> {
        self.check_growth(1)?;

        if self.finish.offset + 1 < Self::BUF {
            // SAFETY: `finish` is a vacant slot of an allocated buffer.
            unsafe { construct(self.slot(self.finish), value) };
            self.finish.offset += 1;
        } else {
            self.reserve_map_at_back(1)?;
            let buffer = self.allocate_buffer()?;
            self.set_buffer(self.finish.node + 1, Some(buffer));
            // SAFETY: as above; the next buffer now exists for the new `finish`.
            unsafe { construct(self.slot(self.finish), value) };
            self.finish = Position::new(self.finish.node + 1, 0);
        }
        Ok(())
    }

    /// Prepends an element, allocating a new front buffer when the first one is full
    ///
    /// # Errors
    /// As [`try_push_back`](Self::try_push_back).
    pub fn try_push_front(&mut self, value: T) -> StlResult<()> {
        self.check_growth(1)?;

        if self.start.offset > 0 {
            self.start.offset -= 1;
        } else {
            self.reserve_map_at_front(1)?;
            let buffer = self.allocate_buffer()?;
            self.set_buffer(self.start.node - 1, Some(buffer));
            self.start = Position::new(self.start.node - 1, Self::BUF - 1);
        }
        // SAFETY: `start` now names a vacant slot of an allocated buffer.
        unsafe { construct(self.slot(self.start), value) };
        Ok(())
    }

    /// Appends an element
    ///
    /// # Panics
    /// If allocation fails or the deque is at `max_size()`.
    pub fn push_back(&mut self, value: T) {
        self.try_push_back(value).or_panic();
    }

    /// Prepends an element
    ///
    /// # Panics
    /// If allocation fails or the deque is at `max_size()`.
    pub fn push_front(&mut self, value: T) {
        self.try_push_front(value).or_panic();
    }

    /// Removes the last element; frees the back buffer once it empties
    pub fn pop_back(&mut self) -> Option<T> {
        if self.is_empty() {
            return None;
        }

        if self.finish.offset == 0 {
            let node = self.finish.node;
            self.free_buffer(node);
            self.finish = Position::new(node - 1, Self::BUF - 1);
        } else {
            self.finish.offset -= 1;
        }
        // SAFETY: `finish` now names the last live element, which we take.
        Some(unsafe { self.slot(self.finish).read() })
    }

    /// Removes the first element; frees the front buffer once it empties
    pub fn pop_front(&mut self) -> Option<T> {
        if self.is_empty() {
            return None;
        }

        // SAFETY: `start` names the first live element, which we take.
        let value = unsafe { self.slot(self.start).read() };
        if self.start.offset + 1 < Self::BUF {
            self.start.offset += 1;
        } else {
            let node = self.start.node;
            self.free_buffer(node);
            self.start = Position::new(node + 1, 0);
        }
        Some(value)
    }

    // ------------------------------------------------------------------
    // Middle
    // ------------------------------------------------------------------

    /// Inserts `value` before position `index`
    ///
    /// # Errors
    /// `OutOfRange` when `index > len()`; otherwise as [`try_push_back`](Self::try_push_back).
    pub fn insert(&mut self, index: usize, value: T) -> StlResult<()> {
        let len = self.len();
        if index > len {
            return Err(StlError::out_of_range(index, len));
        }
        if index == 0 {
            return self.try_push_front(value);
        }
        if index == len {
            return self.try_push_back(value);
        }

        self.open_gap(index, 1)?;
        // SAFETY: the gap slot at `index` is allocated and vacant.
        unsafe { construct(self.slot_at(index), value) };
        Ok(())
    }

    /// Inserts `n` clones of `value` before position `index`
    ///
    /// If a clone panics, the clones made so far are dropped and the deque
    /// is restored to its previous contents.
    ///
    /// # Errors
    /// As [`insert`](Self::insert); nothing changes on error.
    pub fn insert_n(&mut self, index: usize, n: usize, value: &T) -> StlResult<()>
    where
        T: Clone,
    {
        let len = self.len();
        if index > len {
            return Err(StlError::out_of_range(index, len));
        }
        self.open_gap(index, n)?;

        let mut gap = GapGuard::new(self, index, n);
        while gap.filled < n {
            let pos = gap.deque.position_at(index + gap.filled);
            let chunk = (n - gap.filled).min(Self::BUF - pos.offset);
            // SAFETY: `chunk` vacant slots follow `pos` inside one buffer.
            unsafe { uninitialized_fill_n(gap.deque.slot(pos), chunk, value) };
            gap.filled += chunk;
        }
        gap.commit();
        Ok(())
    }

    /// Inserts the items of an exact-size iterator before position `index`
    ///
    /// An iterator that yields fewer items than it reported leaves the
    /// unused slots closed again.
    ///
    /// # Errors
    /// As [`insert`](Self::insert).
    pub fn insert_iter<I>(&mut self, index: usize, items: I) -> StlResult<()>
    where
        I: IntoIterator<Item = T>,
        I::IntoIter: ExactSizeIterator,
    {
        let len = self.len();
        if index > len {
            return Err(StlError::out_of_range(index, len));
        }
        let items = items.into_iter();
        let n = items.len();
        self.open_gap(index, n)?;

        let mut gap = GapGuard::new(self, index, n);
        for item in items.take(n) {
            let slot = gap.deque.slot_at(index + gap.filled);
            // SAFETY: the slot lies inside the vacant gap.
            unsafe { construct(slot, item) };
            gap.filled += 1;
        }

        let filled = gap.filled;
        let deque = gap.commit();
        if filled < n {
            // SAFETY: `[index + filled, index + n)` is vacant.
            unsafe { deque.close_gap(index + filled, n - filled) };
        }
        Ok(())
    }

    /// Removes and returns the element at `index`
    ///
    /// Shifts the shorter side by one: `min(index, len - index - 1)` moves.
    ///
    /// # Errors
    /// `OutOfRange` when `index >= len()`.
    pub fn erase(&mut self, index: usize) -> StlResult<T> {
        let len = self.len();
        if index >= len {
            return Err(StlError::out_of_range(index, len));
        }

        // SAFETY: `index` is live; its slot is vacated and then closed.
        unsafe {
            let value = self.slot_at(index).read();
            self.close_gap(index, 1);
            Ok(value)
        }
    }

    /// Removes the element at `index`, if any
    pub fn remove(&mut self, index: usize) -> Option<T> {
        if index < self.len() {
            self.erase(index).ok()
        } else {
            None
        }
    }

    /// Drops the elements in `[first, last)`
    ///
    /// # Errors
    /// `OutOfRange` unless `first <= last <= len()`.
    pub fn erase_range(&mut self, first: usize, last: usize) -> StlResult<()> {
        let len = self.len();
        if first > last || last > len {
            return Err(StlError::out_of_range(last.max(first), len));
        }
        if first == last {
            return Ok(());
        }
        if first == 0 && last == len {
            self.clear();
            return Ok(());
        }

        let n = last - first;
        let from = self.start.linear(Self::BUF) + first;
        // The gap is closed even if an element destructor unwinds
        let gap = GapGuard::new(self, first, n);
        // SAFETY: the range is live; afterwards it is vacant and `gap` closes it.
        unsafe { gap.deque.destroy_span(from, from + n) };
        drop(gap);
        Ok(())
    }

    /// Drops every element, keeping exactly one buffer
    pub fn clear(&mut self) {
        let from = self.start.linear(Self::BUF);
        let to = self.finish.linear(Self::BUF);
        let last_node = self.finish.node;

        self.finish = self.start;
        let trim = TrimBuffers::new(self, last_node);
        // SAFETY: `[from, to)` held the live elements; `finish` no longer covers them.
        unsafe { trim.deque.destroy_span(from, to) };
    }

    /// Shortens the deque to `len` elements
    pub fn truncate(&mut self, len: usize) {
        let current = self.len();
        if len >= current {
            return;
        }
        if len == 0 {
            self.clear();
            return;
        }

        let from = self.start.linear(Self::BUF) + len;
        let to = self.finish.linear(Self::BUF);
        let old_finish = self.finish;
        self.finish = Position::from_linear(from, Self::BUF);
        let trim = TrimBuffers::new(self, old_finish.node);
        // SAFETY: `[from, to)` is live and no longer covered by `finish`.
        unsafe { trim.deque.destroy_span(from, to) };
    }

    /// Grows with clones of `value` or truncates to `new_len`
    ///
    /// # Errors
    /// As [`insert_n`](Self::insert_n).
    pub fn resize(&mut self, new_len: usize, value: T) -> StlResult<()>
    where
        T: Clone,
    {
        let len = self.len();
        if new_len <= len {
            self.truncate(new_len);
            Ok(())
        } else {
            self.insert_n(len, new_len - len, &value)
        }
    }

    /// Exchanges contents (and allocators) with `other`
    pub fn swap_with(&mut self, other: &mut Self) {
        mem::swap(self, other);
    }

    // ------------------------------------------------------------------
    // Iteration
    // ------------------------------------------------------------------

    pub fn iter(&self) -> Iter<'_, T> {
        Iter::new(self.map, self.start.linear(Self::BUF), self.finish.linear(Self::BUF))
    }

    pub fn iter_mut(&mut self) -> IterMut<'_, T> {
        IterMut::new(self.map, self.start.linear(Self::BUF), self.finish.linear(Self::BUF))
    }

    /// Random-access cursor at the first element
    pub fn begin(&self) -> DequeCursor<'_, T> {
        DequeCursor::new(self.map, self.start)
    }

    /// Random-access cursor one past the last element
    pub fn end(&self) -> DequeCursor<'_, T> {
        DequeCursor::new(self.map, self.finish)
    }

    /// Random-access cursor at `index` (`index <= len()`)
    pub fn cursor_at(&self, index: usize) -> DequeCursor<'_, T> {
        debug_assert!(index <= self.len());
        DequeCursor::new(self.map, self.position_at(index))
    }

    // ------------------------------------------------------------------
    // Map and buffer management
    // ------------------------------------------------------------------

    fn allocate_map(alloc: &A, map_size: usize) -> StlResult<Map<T>> {
        // SAFETY: storage is initialized right below.
        let map = unsafe { alloc.allocate_array::<Option<NonNull<T>>>(map_size) }?;
        for node in 0..map_size {
            // SAFETY: `node < map_size`.
            unsafe { map.add(node).write(None) };
        }
        Ok(map)
    }

    fn allocate_buffer(&self) -> StlResult<NonNull<T>> {
        // SAFETY: the buffer is handed out uninitialized and tracked in the map.
        unsafe { self.alloc.allocate_array::<T>(Self::BUF) }
    }

    #[inline]
    fn map_entry(&self, node: usize) -> Option<NonNull<T>> {
        debug_assert!(node < self.map_size);
        // SAFETY: every map slot is initialized.
        unsafe { *self.map.as_ptr().add(node) }
    }

    #[inline]
    fn set_buffer(&mut self, node: usize, buffer: Option<NonNull<T>>) {
        debug_assert!(node < self.map_size);
        // SAFETY: `node` is inside the map.
        unsafe { self.map.as_ptr().add(node).write(buffer) };
    }

    /// Returns the buffer at `node` to the allocator
    fn free_buffer(&mut self, node: usize) {
        if let Some(buffer) = self.map_entry(node) {
            self.set_buffer(node, None);
            // SAFETY: the buffer came from `allocate_buffer` and holds no live elements.
            unsafe { self.alloc.deallocate_array(buffer, Self::BUF) };
        }
    }

    #[inline]
    fn position_at(&self, index: usize) -> Position {
        Position::from_linear(self.start.linear(Self::BUF) + index, Self::BUF)
    }

    #[inline]
    fn slot(&self, pos: Position) -> NonNull<T> {
        // SAFETY: callers only pass positions inside `[start.node, finish.node]`
        // or freshly reserved buffers.
        unsafe { buffer::slot(self.map, pos) }
    }

    #[inline]
    fn slot_at(&self, index: usize) -> NonNull<T> {
        self.slot(self.position_at(index))
    }

    fn check_growth(&self, n: usize) -> StlResult<()> {
        let len = self.len();
        let max = Self::max_len();
        if n > max - len {
            return Err(StlError::length_exceeded(len.saturating_add(n), max));
        }
        Ok(())
    }

    fn reserve_map_at_back(&mut self, nodes_to_add: usize) -> StlResult<()> {
        if nodes_to_add + 1 > self.map_size - self.finish.node {
            self.reallocate_map(nodes_to_add, false)?;
        }
        Ok(())
    }

    fn reserve_map_at_front(&mut self, nodes_to_add: usize) -> StlResult<()> {
        if nodes_to_add > self.start.node {
            self.reallocate_map(nodes_to_add, true)?;
        }
        Ok(())
    }

    /// Makes room in the map for `nodes_to_add` more buffers on one side
    ///
    /// A map more than twice the needed size is recentred in place; otherwise
    /// a map of `map_size + max(map_size, nodes_to_add) + 2` slots replaces it.
    /// Buffers themselves never move.
    fn reallocate_map(&mut self, nodes_to_add: usize, add_at_front: bool) -> StlResult<()> {
        let old_num_nodes = self.finish.node - self.start.node + 1;
        let new_num_nodes = old_num_nodes + nodes_to_add;
        let bias = if add_at_front { nodes_to_add } else { 0 };

        let new_start = if self.map_size > 2 * new_num_nodes {
            let new_start = (self.map_size - new_num_nodes) / 2 + bias;
            // SAFETY: both runs lie inside the map; `copy` handles the overlap.
            unsafe {
                ptr::copy(
                    self.map.as_ptr().add(self.start.node),
                    self.map.as_ptr().add(new_start),
                    old_num_nodes,
                );
            }
            for node in (0..new_start).chain(new_start + old_num_nodes..self.map_size) {
                self.set_buffer(node, None);
            }

            #[cfg(feature = "logging")]
            trace!(map_size = self.map_size, nodes_to_add, "deque map recentred");

            new_start
        } else {
            let new_map_size = self
                .map_size
                .checked_add(self.map_size.max(nodes_to_add))
                .and_then(|size| size.checked_add(2))
                .ok_or_else(|| StlError::length_exceeded(usize::MAX, Self::max_len()))?;
            let new_map = Self::allocate_map(&self.alloc, new_map_size)?;
            let new_start = (new_map_size - new_num_nodes) / 2 + bias;
            // SAFETY: the run fits in both maps and they do not overlap; the
            // old map holds only pointers, so it is released without drops.
            unsafe {
                ptr::copy_nonoverlapping(
                    self.map.as_ptr().add(self.start.node),
                    new_map.as_ptr().add(new_start),
                    old_num_nodes,
                );
                self.alloc.deallocate_array(self.map, self.map_size);
            }

            #[cfg(feature = "logging")]
            trace!(old_map_size = self.map_size, new_map_size, "deque map grown");

            self.map = new_map;
            self.map_size = new_map_size;
            new_start
        };

        self.start.node = new_start;
        self.finish.node = new_start + old_num_nodes - 1;
        Ok(())
    }

    /// Ensures `n` vacant slots exist before `start`; all-or-nothing
    fn reserve_elements_at_front(&mut self, n: usize) -> StlResult<()> {
        let vacancies = self.start.offset;
        if n <= vacancies {
            return Ok(());
        }

        let new_nodes = (n - vacancies).div_ceil(Self::BUF);
        self.reserve_map_at_front(new_nodes)?;
        for i in 1..=new_nodes {
            match self.allocate_buffer() {
                Ok(buffer) => self.set_buffer(self.start.node - i, Some(buffer)),
                Err(err) => {
                    for j in 1..i {
                        self.free_buffer(self.start.node - j);
                    }
                    return Err(err);
                }
            }
        }
        Ok(())
    }

    /// Ensures `n` vacant slots exist from `finish` on; all-or-nothing
    fn reserve_elements_at_back(&mut self, n: usize) -> StlResult<()> {
        let vacancies = Self::BUF - self.finish.offset - 1;
        if n <= vacancies {
            return Ok(());
        }

        let new_nodes = (n - vacancies).div_ceil(Self::BUF);
        self.reserve_map_at_back(new_nodes)?;
        for i in 1..=new_nodes {
            match self.allocate_buffer() {
                Ok(buffer) => self.set_buffer(self.finish.node + i, Some(buffer)),
                Err(err) => {
                    for j in 1..i {
                        self.free_buffer(self.finish.node + j);
                    }
                    return Err(err);
                }
            }
        }
        Ok(())
    }

    /// Opens `n` vacant slots at logical `index` by shifting the shorter side
    ///
    /// The front side moves when it is not longer than the back side.
    /// Fails before any element moves.
    fn open_gap(&mut self, index: usize, n: usize) -> StlResult<()> {
        if n == 0 {
            return Ok(());
        }
        self.check_growth(n)?;

        let elems_after = self.len() - index;
        if index <= elems_after {
            self.reserve_elements_at_front(n)?;
            let old_start = self.start.linear(Self::BUF);
            // SAFETY: the `n` slots before `start` were just reserved.
            unsafe { self.move_elements(old_start, old_start - n, index) };
            self.start = Position::from_linear(old_start - n, Self::BUF);
        } else {
            self.reserve_elements_at_back(n)?;
            let first = self.start.linear(Self::BUF) + index;
            let old_finish = self.finish.linear(Self::BUF);
            // SAFETY: the `n` slots from `finish` on were just reserved.
            unsafe { self.move_elements(first, first + n, elems_after) };
            self.finish = Position::from_linear(old_finish + n, Self::BUF);
        }
        Ok(())
    }

    /// Closes `n` vacant slots at logical `index` by shifting the shorter side
    ///
    /// Buffers left without elements are released.
    ///
    /// # Safety
    /// `[index, index + n)` must be inside the deque and hold no live values.
    unsafe fn close_gap(&mut self, index: usize, n: usize) {
        if n == 0 {
            return;
        }

        let elems_after = self.len() - index - n;
        if index <= elems_after {
            let old_start = self.start.linear(Self::BUF);
            // SAFETY: moves the `index` leading elements up over the gap.
            unsafe { self.move_elements(old_start, old_start + n, index) };
            let new_start = Position::from_linear(old_start + n, Self::BUF);
            for node in self.start.node..new_start.node {
                self.free_buffer(node);
            }
            self.start = new_start;
        } else {
            let first = self.start.linear(Self::BUF) + index;
            // SAFETY: moves the `elems_after` trailing elements down over the gap.
            unsafe { self.move_elements(first + n, first, elems_after) };
            let new_finish = Position::from_linear(self.finish.linear(Self::BUF) - n, Self::BUF);
            for node in new_finish.node + 1..=self.finish.node {
                self.free_buffer(node);
            }
            self.finish = new_finish;
        }
    }

    /// Relocates `count` elements from linear `src` to linear `dst`
    ///
    /// Copies buffer-sized segments with `ptr::copy`, walking away from the
    /// destination so overlapping ranges stay intact.
    ///
    /// # Safety
    /// Every position touched must lie in an allocated buffer.
    unsafe fn move_elements(&mut self, src: usize, dst: usize, count: usize) {
        if count == 0 || src == dst {
            return;
        }
        let buf = Self::BUF;

        if dst < src {
            let mut done = 0;
            while done < count {
                let from = Position::from_linear(src + done, buf);
                let to = Position::from_linear(dst + done, buf);
                let chunk = (count - done).min(buf - from.offset).min(buf - to.offset);
                // SAFETY: both segments stay inside one buffer each.
                unsafe { ptr::copy(self.slot(from).as_ptr(), self.slot(to).as_ptr(), chunk) };
                done += chunk;
            }
        } else {
            let mut left = count;
            while left > 0 {
                let from = Position::from_linear(src + left - 1, buf);
                let to = Position::from_linear(dst + left - 1, buf);
                let chunk = left.min(from.offset + 1).min(to.offset + 1);
                // SAFETY: both segments end at `from` / `to` and start inside the same buffer.
                unsafe {
                    ptr::copy(
                        self.slot(from).as_ptr().sub(chunk - 1),
                        self.slot(to).as_ptr().sub(chunk - 1),
                        chunk,
                    );
                }
                left -= chunk;
            }
        }
    }

    /// Drops the elements at linear positions `[from, to)`
    ///
    /// # Safety
    /// The range must hold live elements that are not used again.
    unsafe fn destroy_span(&mut self, from: usize, to: usize) {
        if !mem::needs_drop::<T>() {
            return;
        }

        let mut at = from;
        while at < to {
            let pos = Position::from_linear(at, Self::BUF);
            let chunk = (to - at).min(Self::BUF - pos.offset);
            // SAFETY: the segment lies inside one buffer and is live.
            unsafe { destroy_n(self.slot(pos), chunk) };
            at += chunk;
        }
    }

    /// Releases every buffer and the map
    ///
    /// # Safety
    /// No live elements may remain; the deque must not be used afterwards.
    unsafe fn release_storage(&mut self) {
        for node in 0..self.map_size {
            self.free_buffer(node);
        }
        // SAFETY: the map came from `allocate_map` with `map_size` slots.
        unsafe { self.alloc.deallocate_array(self.map, self.map_size) };
    }
}

/// Size used for the element-count bound; zero-sized types count as one byte
const fn buffer_size_of<T>() -> usize {
    match mem::size_of::<T>() {
        0 => 1,
        size => size,
    }
}

/// Vacant gap opened in a deque, closed again on drop
///
/// `filled` counts the leading gap slots initialized so far; they are
/// dropped before the gap is closed. `commit` keeps the gap as filled.
struct GapGuard<'a, T, A: Allocator> {
    deque: &'a mut Deque<T, A>,
    index: usize,
    len: usize,
    filled: usize,
}

impl<'a, T, A: Allocator> GapGuard<'a, T, A> {
    fn new(deque: &'a mut Deque<T, A>, index: usize, len: usize) -> Self {
        Self {
            deque,
            index,
            len,
            filled: 0,
        }
    }

    fn commit(self) -> &'a mut Deque<T, A> {
        let this = ManuallyDrop::new(self);
        // SAFETY: `this` is never dropped, so the reference is moved out exactly once.
        unsafe { ptr::read(&this.deque) }
    }
}

impl<T, A: Allocator> Drop for GapGuard<'_, T, A> {
    fn drop(&mut self) {
        let from = self.deque.start.linear(Deque::<T, A>::BUF) + self.index;
        // SAFETY: the first `filled` gap slots are live, the rest vacant.
        unsafe {
            self.deque.destroy_span(from, from + self.filled);
            self.deque.close_gap(self.index, self.len);
        }
    }
}

/// Frees the buffers between `finish` and a former last node on drop,
/// so a shrinking deque keeps no storage past its end even if an element
/// destructor unwinds
struct TrimBuffers<'a, T, A: Allocator> {
    deque: &'a mut Deque<T, A>,
    last_node: usize,
}

impl<'a, T, A: Allocator> TrimBuffers<'a, T, A> {
    fn new(deque: &'a mut Deque<T, A>, last_node: usize) -> Self {
        Self { deque, last_node }
    }
}

impl<T, A: Allocator> Drop for TrimBuffers<'_, T, A> {
    fn drop(&mut self) {
        for node in self.deque.finish.node + 1..=self.last_node {
            self.deque.free_buffer(node);
        }
    }
}

impl<T, A: Allocator> Drop for Deque<T, A> {
    fn drop(&mut self) {
        /// Releases the storage even if an element destructor unwinds
        struct Release<'a, T, A: Allocator>(&'a mut Deque<T, A>);

        impl<T, A: Allocator> Drop for Release<'_, T, A> {
            fn drop(&mut self) {
                // SAFETY: every element has been dropped (or leaked by an unwinding drop).
                unsafe { self.0.release_storage() };
            }
        }

        let from = self.start.linear(Self::BUF);
        let to = self.finish.linear(Self::BUF);
        let release = Release(self);
        // SAFETY: `[from, to)` holds the live elements, dropped exactly once here.
        unsafe { release.0.destroy_span(from, to) };
    }
}

impl<T: Clone, A: Allocator + Clone> Clone for Deque<T, A> {
    fn clone(&self) -> Self {
        let mut copy = Self::new_in(self.alloc.clone());
        copy.extend(self.iter().cloned());
        copy
    }
}

impl<T: fmt::Debug, A: Allocator> fmt::Debug for Deque<T, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T: PartialEq, A: Allocator, B: Allocator> PartialEq<Deque<T, B>> for Deque<T, A> {
    fn eq(&self, other: &Deque<T, B>) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}

impl<T: Eq, A: Allocator> Eq for Deque<T, A> {}

impl<T, A: Allocator> Index<usize> for Deque<T, A> {
    type Output = T;

    #[track_caller]
    fn index(&self, index: usize) -> &T {
        let len = self.len();
        self.at(index).unwrap_or_else(|_| panic!("index {index} out of range for deque of length {len}"))
    }
}

impl<T, A: Allocator> IndexMut<usize> for Deque<T, A> {
    #[track_caller]
    fn index_mut(&mut self, index: usize) -> &mut T {
        let len = self.len();
        self.at_mut(index).unwrap_or_else(|_| panic!("index {index} out of range for deque of length {len}"))
    }
}

impl<T, A: Allocator> Extend<T> for Deque<T, A> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for value in iter {
            self.push_back(value);
        }
    }
}

impl<'a, T: Copy + 'a, A: Allocator> Extend<&'a T> for Deque<T, A> {
    fn extend<I: IntoIterator<Item = &'a T>>(&mut self, iter: I) {
        self.extend(iter.into_iter().copied());
    }
}

impl<T> FromIterator<T> for Deque<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut deque = Self::new();
        deque.extend(iter);
        deque
    }
}

impl<T, A: Allocator> IntoIterator for Deque<T, A> {
    type Item = T;
    type IntoIter = IntoIter<T, A>;

    fn into_iter(self) -> IntoIter<T, A> {
        IntoIter::new(self)
    }
}

impl<'a, T, A: Allocator> IntoIterator for &'a Deque<T, A> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Iter<'a, T> {
        self.iter()
    }
}

impl<'a, T, A: Allocator> IntoIterator for &'a mut Deque<T, A> {
    type Item = &'a mut T;
    type IntoIter = IterMut<'a, T>;

    fn into_iter(self) -> IterMut<'a, T> {
        self.iter_mut()
    }
}

impl<T, A: Allocator> PushBack for Deque<T, A> {
    type Item = T;

    fn push_back(&mut self, value: T) {
        Deque::push_back(self, value);
    }
}
