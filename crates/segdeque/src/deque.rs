//! The segmented double-ended queue.
//!
//! [`SegDeque`] keeps two positions into its block map: `start`, the
//! first live slot, and `finish`, the slot one past the last live
//! element. `finish` always names an allocated, unconstructed slot, so a
//! back push only needs a new block when it fills the last slot of one.
//!
//! Every mutator that can fail stages its resources first (map room,
//! then a block), runs the element constructor, and only then moves
//! `start`/`finish`. The staged block is held by a `Staged` guard: on
//! an error or a panic from the constructor it is released or put back in
//! the slack cache, and the deque is unchanged.

#![allow(unsafe_code)]

use std::mem;
use std::ops::{Index, IndexMut};

use segdeque_arena::{BlockHandle, BlockMap, BlockStore, Claim, Global, MemoryProvider};
use segdeque_core::{DequeConfig, DequeError, MapStats};

use crate::cursor::{Cursor, Position};
use crate::iter::{IntoIter, Iter, IterMut};

/// A double-ended queue stored in fixed-size blocks.
///
/// Each block holds [`block_len`](Self::block_len) elements, derived from
/// [`DequeConfig::block_bytes`]. Blocks come from a [`MemoryProvider`]
/// captured at construction.
///
/// `new()` allocates nothing; the block map and first block are created
/// by the first push or insert.
pub struct SegDeque<T, P: MemoryProvider = Global> {
    store: BlockStore<T, P>,
    map: BlockMap<T>,
    start: Position,
    finish: Position,
    config: DequeConfig,
}

impl<T> SegDeque<T> {
    /// An empty deque on the global allocator.
    pub fn new() -> Self {
        Self::with_provider(Global)
    }
}

impl<T, P: MemoryProvider> SegDeque<T, P> {
    // ── Construction ────────────────────────────────────────────

    /// An empty deque drawing blocks from `provider`.
    pub fn with_provider(provider: P) -> Self {
        Self::from_parts(provider, DequeConfig::default())
    }

    /// An empty deque with explicit block sizing.
    ///
    /// # Errors
    ///
    /// Returns [`DequeError::InvalidConfig`] if `config` fails validation,
    /// or [`DequeError::CapacityOverflow`] if a block of `T` cannot be
    /// laid out.
    pub fn with_config(config: DequeConfig, provider: P) -> Result<Self, DequeError> {
        config.validate()?;
        let store = BlockStore::new(provider, config.block_len::<T>())?;
        Ok(Self {
            store,
            map: BlockMap::new(),
            start: Position::default(),
            finish: Position::default(),
            config,
        })
    }

    /// A deque holding `count` clones of `value`.
    ///
    /// # Errors
    ///
    /// Returns [`DequeError::AllocationFailed`] if the map or any block
    /// cannot be allocated. Nothing is leaked.
    pub fn from_elem(count: usize, value: T, provider: P) -> Result<Self, DequeError>
    where
        T: Clone,
    {
        let mut deque = Self::with_provider(provider);
        deque.initialize_map(count)?;
        for _ in 0..count {
            deque.push_back(value.clone())?;
        }
        Ok(deque)
    }

    /// Build from a config that is already known to lay out for `T`.
    fn from_parts(provider: P, config: DequeConfig) -> Self {
        let store = BlockStore::new(provider, config.block_len::<T>())
            .expect("validated config always lays out a block");
        Self {
            store,
            map: BlockMap::new(),
            start: Position::default(),
            finish: Position::default(),
            config,
        }
    }

    /// Clone with a fallible element constructor.
    ///
    /// The copy gets a map sized for `self` and the provider chosen by
    /// [`MemoryProvider::select_on_copy`].
    ///
    /// # Errors
    ///
    /// Returns the first error from `clone` or from block allocation.
    /// The partial copy is dropped before returning; `self` is untouched.
    pub fn try_clone_with<E, F>(&self, mut clone: F) -> Result<Self, E>
    where
        E: From<DequeError>,
        F: FnMut(&T) -> Result<T, E>,
    {
        let provider = self.store.provider().select_on_copy();
        let mut copy = Self::from_parts(provider, self.config.clone());
        if !self.is_empty() {
            copy.initialize_map(self.len())?;
        }
        for item in self.iter() {
            copy.push_back_with(|| clone(item))?;
        }
        Ok(copy)
    }

    /// Clone, reporting allocation failure instead of panicking.
    ///
    /// # Errors
    ///
    /// Returns [`DequeError::AllocationFailed`] if the copy cannot be
    /// allocated.
    pub fn try_clone(&self) -> Result<Self, DequeError>
    where
        T: Clone,
    {
        self.try_clone_with(|item| Ok(item.clone()))
    }

    /// Move the contents out, leaving `self` empty with the same provider
    /// and config.
    pub fn take(&mut self) -> Self {
        let empty = Self::from_parts(self.store.provider().clone(), self.config.clone());
        mem::replace(self, empty)
    }

    // ── Capacity and introspection ──────────────────────────────

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.finish.distance(self.start, self.block_len()) as usize
    }

    /// Whether the deque holds no elements.
    pub fn is_empty(&self) -> bool {
        self.start == self.finish
    }

    /// Upper bound on the element count the provider could ever back.
    pub fn max_size(&self) -> usize {
        self.store.provider().max_bytes() / mem::size_of::<T>().max(1)
    }

    /// Elements per block.
    pub fn block_len(&self) -> usize {
        self.store.block_len()
    }

    /// Slots in the block map (0 before the first allocation).
    pub fn map_size(&self) -> usize {
        self.map.len()
    }

    /// The configuration this deque was built with.
    pub fn config(&self) -> &DequeConfig {
        &self.config
    }

    /// The memory provider.
    pub fn provider(&self) -> &P {
        self.store.provider()
    }

    /// Block traffic and map growth counters.
    pub fn stats(&self) -> MapStats {
        let blocks = self.store.stats();
        MapStats {
            blocks_acquired: blocks.blocks_acquired,
            blocks_released: blocks.blocks_released,
            ..self.map.stats()
        }
    }

    /// Release cached slack blocks. Live elements are not touched.
    pub fn shrink_to_fit(&mut self) {
        self.map.release_slack(&mut self.store);
    }

    // ── Element access ──────────────────────────────────────────

    /// Element at `index`, or `None` past the end.
    pub fn get(&self, index: usize) -> Option<&T> {
        if index >= self.len() {
            return None;
        }
        self.get_at(self.position_of(index))
    }

    /// Mutable element at `index`, or `None` past the end.
    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        if index >= self.len() {
            return None;
        }
        let (handle, offset) = self.slot(self.position_of(index));
        // SAFETY: `index < len`, so the slot is live; `&mut self` is exclusive.
        Some(unsafe { self.store.get_mut(handle, offset) })
    }

    /// Checked access.
    ///
    /// # Errors
    ///
    /// Returns [`DequeError::OutOfRange`] if `index >= len()`.
    pub fn at(&self, index: usize) -> Result<&T, DequeError> {
        let len = self.len();
        self.get(index).ok_or(DequeError::OutOfRange { index, len })
    }

    /// Checked mutable access.
    ///
    /// # Errors
    ///
    /// Returns [`DequeError::OutOfRange`] if `index >= len()`.
    pub fn at_mut(&mut self, index: usize) -> Result<&mut T, DequeError> {
        let len = self.len();
        self.get_mut(index).ok_or(DequeError::OutOfRange { index, len })
    }

    /// First element.
    pub fn front(&self) -> Option<&T> {
        self.get(0)
    }

    /// Mutable first element.
    pub fn front_mut(&mut self) -> Option<&mut T> {
        self.get_mut(0)
    }

    /// Last element.
    pub fn back(&self) -> Option<&T> {
        self.get(self.len().checked_sub(1)?)
    }

    /// Mutable last element.
    pub fn back_mut(&mut self) -> Option<&mut T> {
        let last = self.len().checked_sub(1)?;
        self.get_mut(last)
    }

    // ── Cursors and iteration ───────────────────────────────────

    /// Cursor at the first element.
    pub fn begin(&self) -> Cursor<'_, T, P> {
        Cursor::new(self, self.start)
    }

    /// Cursor one past the last element.
    pub fn end(&self) -> Cursor<'_, T, P> {
        Cursor::new(self, self.finish)
    }

    /// Same as [`begin`](Self::begin).
    pub fn cbegin(&self) -> Cursor<'_, T, P> {
        self.begin()
    }

    /// Same as [`end`](Self::end).
    pub fn cend(&self) -> Cursor<'_, T, P> {
        self.end()
    }

    /// Front-to-back iterator over shared references.
    pub fn iter(&self) -> Iter<'_, T, P> {
        Iter::new(&self.store, &self.map, self.start, self.finish, self.len())
    }

    /// Front-to-back iterator over mutable references.
    pub fn iter_mut(&mut self) -> IterMut<'_, T, P> {
        let len = self.len();
        IterMut::new(&self.store, &self.map, self.start, self.finish, len)
    }

    pub(crate) fn begin_position(&self) -> Position {
        self.start
    }

    /// Element at `pos` if it lies in `[start, finish)`.
    pub(crate) fn get_at(&self, pos: Position) -> Option<&T> {
        if pos < self.start || pos >= self.finish {
            return None;
        }
        let (handle, offset) = self.slot(pos);
        // SAFETY: inside the live range; `&self` blocks mutation.
        Some(unsafe { self.store.get(handle, offset) })
    }

    // ── End mutators ────────────────────────────────────────────

    /// Append `value`.
    ///
    /// # Errors
    ///
    /// Returns [`DequeError::AllocationFailed`] if a new block or a larger
    /// map is needed and cannot be allocated. The deque is unchanged and
    /// `value` is dropped.
    pub fn push_back(&mut self, value: T) -> Result<(), DequeError> {
        self.push_back_with(|| Ok(value))
    }

    /// Prepend `value`.
    ///
    /// # Errors
    ///
    /// Same as [`push_back`](Self::push_back).
    pub fn push_front(&mut self, value: T) -> Result<(), DequeError> {
        self.push_front_with(|| Ok(value))
    }

    /// Append the value produced by a fallible constructor.
    ///
    /// Map room and the next block are secured before `make` runs; the
    /// end position moves only after it succeeds.
    ///
    /// # Errors
    ///
    /// Returns the staging error or the constructor's error. Either way
    /// the deque is exactly as before and the staged block is handed back
    /// to the map. The same holds if `make` panics.
    pub fn push_back_with<E, F>(&mut self, make: F) -> Result<(), E>
    where
        E: From<DequeError>,
        F: FnOnce() -> Result<T, E>,
    {
        self.ensure_map()?;
        let claim = self.stage_back()?;
        let (handle, offset) = self.slot(self.finish);
        let staged = Staged::new(&mut self.map, &mut self.store, claim, End::Back);
        // SAFETY: `finish` is always an unconstructed slot of an in-use block.
        unsafe { staged.store.construct_with(handle, offset, make) }?;
        staged.commit();
        self.finish = self.finish.next(self.block_len());
        Ok(())
    }

    /// Prepend the value produced by a fallible constructor.
    ///
    /// # Errors
    ///
    /// Same as [`push_back_with`](Self::push_back_with).
    pub fn push_front_with<E, F>(&mut self, make: F) -> Result<(), E>
    where
        E: From<DequeError>,
        F: FnOnce() -> Result<T, E>,
    {
        self.ensure_map()?;
        let claim = self.stage_front()?;
        let target = self.start.prev(self.block_len());
        let handle = match &claim {
            Some(claim) => claim.handle(),
            None => self.map.handle(target.node),
        };
        let staged = Staged::new(&mut self.map, &mut self.store, claim, End::Front);
        // SAFETY: `target` precedes `start`, so it holds no element.
        unsafe { staged.store.construct_with(handle, target.offset, make) }?;
        staged.commit();
        self.start = target;
        Ok(())
    }

    /// Remove and return the last element.
    pub fn pop_back(&mut self) -> Option<T> {
        if self.is_empty() {
            return None;
        }
        self.retreat_finish();
        let (handle, offset) = self.slot(self.finish);
        // SAFETY: this was the last live slot; it now lies at `finish`.
        Some(unsafe { self.store.take(handle, offset) })
    }

    /// Remove and return the first element.
    pub fn pop_front(&mut self) -> Option<T> {
        if self.is_empty() {
            return None;
        }
        let (handle, offset) = self.slot(self.start);
        // SAFETY: `start` is live in a non-empty deque; `advance_start`
        // moves past it.
        let value = unsafe { self.store.take(handle, offset) };
        self.advance_start();
        Some(value)
    }

    // ── Positional mutators ─────────────────────────────────────

    /// Insert `value` before `index`, shifting the shorter side.
    ///
    /// # Errors
    ///
    /// Returns [`DequeError::OutOfRange`] if `index > len()`, or an
    /// allocation error. The deque is unchanged on error.
    pub fn insert(&mut self, index: usize, value: T) -> Result<(), DequeError> {
        self.insert_with(index, || Ok(value))
    }

    /// Insert the value of a fallible constructor before `index`.
    ///
    /// # Errors
    ///
    /// Same as [`insert`](Self::insert), plus the constructor's error.
    pub fn insert_with<E, F>(&mut self, index: usize, make: F) -> Result<(), E>
    where
        E: From<DequeError>,
        F: FnOnce() -> Result<T, E>,
    {
        let len = self.len();
        if index > len {
            return Err(DequeError::OutOfRange { index, len }.into());
        }
        if index == 0 {
            return self.push_front_with(make);
        }
        if index == len {
            return self.push_back_with(make);
        }

        let b = self.block_len();
        if index < len / 2 {
            let claim = self.stage_front()?;
            let staged = Staged::new(&mut self.map, &mut self.store, claim, End::Front);
            let value = make()?;
            staged.commit();
            let new_start = self.start.prev(b);
            let mut hole = new_start;
            for _ in 0..index {
                let src = hole.next(b);
                // SAFETY: `src` is live and `hole` was vacated by the
                // previous step (or lies before `start`).
                unsafe { self.store.relocate(self.slot(src), self.slot(hole)) };
                hole = src;
            }
            self.start = new_start;
            let (handle, offset) = self.slot(hole);
            // SAFETY: `hole` was vacated by the last relocation.
            unsafe { self.store.construct(handle, offset, value) };
        } else {
            let claim = self.stage_back()?;
            let staged = Staged::new(&mut self.map, &mut self.store, claim, End::Back);
            let value = make()?;
            staged.commit();
            let mut hole = self.finish;
            for _ in index..len {
                let src = hole.prev(b);
                // SAFETY: as above, walking back from `finish`.
                unsafe { self.store.relocate(self.slot(src), self.slot(hole)) };
                hole = src;
            }
            self.finish = self.finish.next(b);
            let (handle, offset) = self.slot(hole);
            // SAFETY: `hole` was vacated by the last relocation.
            unsafe { self.store.construct(handle, offset, value) };
        }
        Ok(())
    }

    /// Remove and return the element at `index`, shifting the shorter side.
    ///
    /// # Errors
    ///
    /// Returns [`DequeError::OutOfRange`] if `index >= len()`.
    pub fn erase(&mut self, index: usize) -> Result<T, DequeError> {
        let len = self.len();
        if index >= len {
            return Err(DequeError::OutOfRange { index, len });
        }
        let b = self.block_len();
        let pos = self.position_of(index);
        let (handle, offset) = self.slot(pos);
        // SAFETY: `index < len`; the hole is refilled or dropped from the
        // live range below.
        let value = unsafe { self.store.take(handle, offset) };

        let mut hole = pos;
        if index < len / 2 {
            for _ in 0..index {
                let src = hole.prev(b);
                // SAFETY: `src` is live, `hole` is vacant.
                unsafe { self.store.relocate(self.slot(src), self.slot(hole)) };
                hole = src;
            }
            self.advance_start();
        } else {
            for _ in index + 1..len {
                let src = hole.next(b);
                // SAFETY: `src` is live, `hole` is vacant.
                unsafe { self.store.relocate(self.slot(src), self.slot(hole)) };
                hole = src;
            }
            self.retreat_finish();
        }
        Ok(value)
    }

    /// Destroy every element. Blocks stay cached for reuse; see
    /// [`shrink_to_fit`](Self::shrink_to_fit).
    pub fn clear(&mut self) {
        if self.is_empty() {
            return;
        }
        let b = self.block_len();
        let (start, finish) = (self.start, self.finish);
        self.finish = start;
        self.map.collapse();
        for node in start.node..=finish.node {
            let Some(handle) = self.map.slots()[node] else {
                continue;
            };
            let lo = if node == start.node { start.offset } else { 0 };
            let hi = if node == finish.node { finish.offset } else { b };
            // SAFETY: `lo..hi` was the live run of this block; the deque no
            // longer covers it.
            unsafe { self.store.destroy_range(handle, lo..hi) };
        }
    }

    /// Drop elements from the back until at most `len` remain.
    pub fn truncate(&mut self, len: usize) {
        while self.len() > len {
            self.pop_back();
        }
    }

    /// Grow with values from `fill` or shrink from the back to `new_len`.
    ///
    /// # Errors
    ///
    /// Returns an allocation error; elements pushed before the failure
    /// remain.
    pub fn resize_with<F>(&mut self, new_len: usize, mut fill: F) -> Result<(), DequeError>
    where
        F: FnMut() -> T,
    {
        self.truncate(new_len);
        while self.len() < new_len {
            self.push_back(fill())?;
        }
        Ok(())
    }

    /// Resize to `new_len`, filling with clones of `value`.
    ///
    /// # Errors
    ///
    /// Same as [`resize_with`](Self::resize_with).
    pub fn resize(&mut self, new_len: usize, value: T) -> Result<(), DequeError>
    where
        T: Clone,
    {
        self.resize_with(new_len, || value.clone())
    }

    /// Resize to `new_len`, filling with `T::default()`.
    ///
    /// # Errors
    ///
    /// Same as [`resize_with`](Self::resize_with).
    pub fn resize_default(&mut self, new_len: usize) -> Result<(), DequeError>
    where
        T: Default,
    {
        self.resize_with(new_len, T::default)
    }

    /// Exchange contents, providers, and configs with `other` in O(1).
    pub fn swap(&mut self, other: &mut Self) {
        mem::swap(self, other);
    }

    // ── Internals ───────────────────────────────────────────────

    fn position_of(&self, index: usize) -> Position {
        self.start.offset_by(index as isize, self.block_len())
    }

    fn slot(&self, pos: Position) -> (BlockHandle<T>, usize) {
        (self.map.handle(pos.node), pos.offset)
    }

    fn ensure_map(&mut self) -> Result<(), DequeError> {
        if self.map.is_allocated() {
            return Ok(());
        }
        self.initialize_map(0)
    }

    /// Create the map with enough blocks for `elements` back pushes.
    fn initialize_map(&mut self, elements: usize) -> Result<(), DequeError> {
        debug_assert!(!self.map.is_allocated());
        let blocks = elements / self.block_len() + 1;
        self.map = BlockMap::with_blocks(blocks, self.config.min_map_size, &mut self.store)?;
        self.start = Position::new(self.map.first(), 0);
        self.finish = self.start;
        Ok(())
    }

    fn reserve_nodes(&mut self, nodes: usize, at_front: bool) -> Result<(), DequeError> {
        let shift = self.map.reserve(nodes, at_front)?;
        if shift != 0 {
            self.start = self.start.rebase(shift);
            self.finish = self.finish.rebase(shift);
        }
        Ok(())
    }

    /// Secure the block `finish` moves into once its slot is written.
    fn stage_back(&mut self) -> Result<Option<Claim<T>>, DequeError> {
        if self.finish.offset + 1 < self.block_len() {
            return Ok(None);
        }
        self.reserve_nodes(1, false)?;
        self.map.claim_back(&mut self.store).map(Some)
    }

    /// Secure the block holding the slot before `start`.
    fn stage_front(&mut self) -> Result<Option<Claim<T>>, DequeError> {
        if self.start.offset > 0 {
            return Ok(None);
        }
        self.reserve_nodes(1, true)?;
        self.map.claim_front(&mut self.store).map(Some)
    }

    /// Step `finish` back one slot, releasing the block it leaves.
    fn retreat_finish(&mut self) {
        if self.finish.offset == 0 {
            // SAFETY: `finish` at offset 0 means its block holds nothing,
            // and the live element before it keeps another node in use.
            unsafe { self.map.release_back(&mut self.store) };
        }
        self.finish = self.finish.prev(self.block_len());
    }

    /// Step `start` forward past a vacated slot, releasing an emptied block.
    fn advance_start(&mut self) {
        if self.start.offset + 1 == self.block_len() {
            // SAFETY: the vacated slot was the last one in its block, and
            // `finish` lies in a later node.
            unsafe { self.map.release_front(&mut self.store) };
        }
        self.start = self.start.next(self.block_len());
    }
}

#[derive(Clone, Copy)]
enum End {
    Front,
    Back,
}

/// A block claimed for one end while an element constructor runs.
///
/// Dropping the guard without [`commit`](Self::commit) hands the block
/// back to the map, so an error or a panic in the constructor leaves the
/// block accounting as it was.
struct Staged<'a, T, P: MemoryProvider> {
    map: &'a mut BlockMap<T>,
    store: &'a mut BlockStore<T, P>,
    claim: Option<Claim<T>>,
    end: End,
}

impl<'a, T, P: MemoryProvider> Staged<'a, T, P> {
    fn new(
        map: &'a mut BlockMap<T>,
        store: &'a mut BlockStore<T, P>,
        claim: Option<Claim<T>>,
        end: End,
    ) -> Self {
        Self {
            map,
            store,
            claim,
            end,
        }
    }

    /// Attach the claimed block to the in-use range.
    fn commit(mut self) {
        if let Some(claim) = self.claim.take() {
            match self.end {
                End::Front => self.map.commit_front(claim),
                End::Back => self.map.commit_back(claim),
            }
        }
    }
}

impl<T, P: MemoryProvider> Drop for Staged<'_, T, P> {
    fn drop(&mut self) {
        if let Some(claim) = self.claim.take() {
            match self.end {
                End::Front => self.map.unclaim_front(claim, &mut *self.store),
                End::Back => self.map.unclaim_back(claim, &mut *self.store),
            }
        }
    }
}

impl<T, P: MemoryProvider> Drop for SegDeque<T, P> {
    fn drop(&mut self) {
        self.clear();
        if self.map.is_allocated() {
            // SAFETY: `clear` destroyed every element.
            unsafe { self.map.release_all(&mut self.store) };
        }
    }
}

impl<T, P: MemoryProvider + Default> Default for SegDeque<T, P> {
    fn default() -> Self {
        Self::with_provider(P::default())
    }
}

impl<T: Clone, P: MemoryProvider> Clone for SegDeque<T, P> {
    /// # Panics
    ///
    /// Panics if the copy cannot be allocated.
    fn clone(&self) -> Self {
        match self.try_clone() {
            Ok(copy) => copy,
            Err(err) => panic!("segdeque: clone failed: {err}"),
        }
    }
}

impl<T, P: MemoryProvider> Index<usize> for SegDeque<T, P> {
    type Output = T;

    fn index(&self, index: usize) -> &T {
        match self.get(index) {
            Some(value) => value,
            None => panic!(
                "segdeque: index {index} out of range for length {}",
                self.len()
            ),
        }
    }
}

impl<T, P: MemoryProvider> IndexMut<usize> for SegDeque<T, P> {
    fn index_mut(&mut self, index: usize) -> &mut T {
        let len = self.len();
        match self.get_mut(index) {
            Some(value) => value,
            None => panic!("segdeque: index {index} out of range for length {len}"),
        }
    }
}

// ── Conversions ─────────────────────────────────────────────────

impl<T, P: MemoryProvider> Extend<T> for SegDeque<T, P> {
    /// # Panics
    ///
    /// Panics if a block cannot be allocated.
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for item in iter {
            if let Err(err) = self.push_back(item) {
                panic!("segdeque: extend failed: {err}");
            }
        }
    }
}

impl<'a, T: Copy + 'a, P: MemoryProvider> Extend<&'a T> for SegDeque<T, P> {
    fn extend<I: IntoIterator<Item = &'a T>>(&mut self, iter: I) {
        Extend::<T>::extend(self, iter.into_iter().copied());
    }
}

impl<T> FromIterator<T> for SegDeque<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut deque = Self::new();
        deque.extend(iter);
        deque
    }
}

impl<T> From<Vec<T>> for SegDeque<T> {
    fn from(vec: Vec<T>) -> Self {
        vec.into_iter().collect()
    }
}

impl<T, const N: usize> From<[T; N]> for SegDeque<T> {
    fn from(array: [T; N]) -> Self {
        array.into_iter().collect()
    }
}

impl<T, P: MemoryProvider> IntoIterator for SegDeque<T, P> {
    type Item = T;
    type IntoIter = IntoIter<T, P>;

    fn into_iter(self) -> IntoIter<T, P> {
        IntoIter::new(self)
    }
}

impl<'a, T, P: MemoryProvider> IntoIterator for &'a SegDeque<T, P> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T, P>;

    fn into_iter(self) -> Iter<'a, T, P> {
        self.iter()
    }
}

impl<'a, T, P: MemoryProvider> IntoIterator for &'a mut SegDeque<T, P> {
    type Item = &'a mut T;
    type IntoIter = IterMut<'a, T, P>;

    fn into_iter(self) -> IterMut<'a, T, P> {
        self.iter_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use segdeque_test_utils::{CountingProvider, FailingFactory, LiveCounter, Tracked};
    use std::collections::VecDeque;

    fn contents<T: Clone, P: MemoryProvider>(d: &SegDeque<T, P>) -> Vec<T> {
        d.iter().cloned().collect()
    }

    /// Four `u64`s per block.
    fn small<T>() -> SegDeque<T> {
        SegDeque::with_config(DequeConfig::new().block_bytes(32), Global).unwrap()
    }

    #[test]
    fn new_allocates_nothing() {
        let d: SegDeque<u64> = SegDeque::new();
        assert!(d.is_empty());
        assert_eq!(d.map_size(), 0);
        assert_eq!(d.stats().blocks_acquired, 0);
        assert_eq!(d.front(), None);
        assert_eq!(d.iter().next(), None);
    }

    #[test]
    fn block_len_follows_element_size() {
        assert_eq!(SegDeque::<u8>::new().block_len(), 512);
        assert_eq!(SegDeque::<u64>::new().block_len(), 64);
        assert_eq!(SegDeque::<[u8; 1000]>::new().block_len(), 1);
        assert_eq!(SegDeque::<()>::new().block_len(), 512);
    }

    #[test]
    fn first_push_creates_centered_map() {
        let mut d = small::<u64>();
        d.push_back(1).unwrap();
        assert_eq!(d.map_size(), 8);
        assert_eq!(d.stats().blocks_acquired, 1);
    }

    #[test]
    fn scenario_push_pop_insert_erase() {
        let mut d = SegDeque::new();
        d.push_back(1).unwrap();
        d.push_back(2).unwrap();
        d.push_front(0).unwrap();
        assert_eq!(contents(&d), [0, 1, 2]);
        assert_eq!(d.pop_front(), Some(0));
        assert_eq!(contents(&d), [1, 2]);
        let at = (d.begin() + 1).index();
        d.insert(at, 9).unwrap();
        assert_eq!(contents(&d), [1, 9, 2]);
        let at = d.begin().index();
        assert_eq!(d.erase(at), Ok(1));
        assert_eq!(contents(&d), [9, 2]);
    }

    #[test]
    fn pushes_cross_block_boundaries_both_ways() {
        let mut d = small::<u64>();
        for i in 0..10 {
            d.push_back(i).unwrap();
            d.push_front(100 + i).unwrap();
        }
        let expected: Vec<u64> = (100..110).rev().chain(0..10).collect();
        assert_eq!(contents(&d), expected);
        for (i, want) in expected.iter().enumerate() {
            assert_eq!(d[i], *want);
        }
    }

    #[test]
    fn pops_release_emptied_blocks() {
        let mut d = small::<u64>();
        d.extend(0..16);
        let peak = d.stats().blocks_live();
        while d.pop_front().is_some() {}
        assert!(d.stats().blocks_live() < peak);
        assert_eq!(d.stats().blocks_live(), 1);

        d.extend(0..16);
        while d.pop_back().is_some() {}
        assert_eq!(d.stats().blocks_live(), 1);
    }

    #[test]
    fn single_slot_blocks_work() {
        let mut d: SegDeque<[u8; 600]> = SegDeque::new();
        assert_eq!(d.block_len(), 1);
        d.push_back([1; 600]).unwrap();
        d.push_front([0; 600]).unwrap();
        d.push_back([2; 600]).unwrap();
        d.insert(1, [7; 600]).unwrap();
        assert_eq!(d.len(), 4);
        assert_eq!(d[1][0], 7);
        assert_eq!(d.erase(2).unwrap()[0], 1);
        assert_eq!(d.pop_front().unwrap()[0], 0);
        assert_eq!(d.pop_back().unwrap()[0], 2);
        assert_eq!(d.len(), 1);
    }

    #[test]
    fn at_reports_out_of_range_without_change() {
        let mut d = SegDeque::from([1, 2, 3]);
        assert_eq!(d.at(2), Ok(&3));
        assert_eq!(d.at(3), Err(DequeError::OutOfRange { index: 3, len: 3 }));
        assert_eq!(
            d.at_mut(10).unwrap_err(),
            DequeError::OutOfRange { index: 10, len: 3 }
        );
        assert_eq!(d.len(), 3);
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn index_past_end_panics() {
        let d = SegDeque::from([1]);
        let _value: i32 = d[1];
    }

    #[test]
    fn insert_and_erase_pick_the_shorter_side() {
        let mut d = small::<u64>();
        d.extend(0..20);
        d.insert(3, 300).unwrap();
        d.insert(18, 1800).unwrap();
        let mut model: Vec<u64> = (0..20).collect();
        model.insert(3, 300);
        model.insert(18, 1800);
        assert_eq!(contents(&d), model);

        assert_eq!(d.erase(2), Ok(model.remove(2)));
        assert_eq!(d.erase(17), Ok(model.remove(17)));
        assert_eq!(contents(&d), model);
        assert_eq!(
            d.insert(100, 0),
            Err(DequeError::OutOfRange { index: 100, len: 20 })
        );
        assert_eq!(
            d.erase(20),
            Err(DequeError::OutOfRange { index: 20, len: 20 })
        );
    }

    #[test]
    fn clear_caches_blocks_and_shrink_releases_them() {
        let mut d = small::<u64>();
        d.extend(0..40);
        let live = d.stats().blocks_live();
        d.clear();
        assert!(d.is_empty());
        assert_eq!(d.stats().blocks_live(), live);

        d.extend(0..40);
        assert_eq!(d.stats().blocks_live(), live);
        assert!(d.stats().blocks_reused > 0);

        d.clear();
        d.shrink_to_fit();
        assert_eq!(d.stats().blocks_live(), 1);
        d.push_back(5).unwrap();
        assert_eq!(contents(&d), [5]);
    }

    #[test]
    fn clear_and_drop_destroy_every_element() {
        let counter = LiveCounter::new();
        let mut d: SegDeque<Tracked> = SegDeque::new();
        for i in 0..300 {
            d.push_back(Tracked::new(i, &counter)).unwrap();
            d.push_front(Tracked::new(-i, &counter)).unwrap();
        }
        assert_eq!(counter.live(), 600);
        d.clear();
        assert_eq!(counter.live(), 0);
        for i in 0..50 {
            d.push_back(Tracked::new(i, &counter)).unwrap();
        }
        drop(d.erase(10));
        assert_eq!(counter.live(), 49);
        drop(d);
        assert_eq!(counter.live(), 0);
    }

    #[test]
    fn failed_constructor_leaves_deque_unchanged() {
        let provider = CountingProvider::new();
        let mut d: SegDeque<u64, CountingProvider> =
            SegDeque::with_config(DequeConfig::new().block_bytes(32), provider.clone()).unwrap();
        d.extend(0..3);
        let before = contents(&d);
        let blocks = provider.live_allocations();

        // `finish` sits in the last slot of its block, so the push stages a
        // fresh block.
        let factory = FailingFactory::new(1);
        let result = d.push_back_with(|| factory.make(99));
        assert!(matches!(result, Err(DequeError::ElementConstruction { .. })));
        assert_eq!(contents(&d), before);
        assert_eq!(provider.live_allocations(), blocks);

        let result = d.push_front_with(|| factory.make(99).and(Err(DequeError::CapacityOverflow)));
        assert_eq!(result, Err(DequeError::CapacityOverflow));
        let result = d.insert_with(2, || FailingFactory::new(1).make(7));
        assert!(result.is_err());
        assert_eq!(contents(&d), before);
        assert_eq!(provider.live_allocations(), blocks);
    }

    #[test]
    fn allocation_failure_leaves_deque_unchanged() {
        let provider = CountingProvider::new();
        let mut d: SegDeque<u64, CountingProvider> =
            SegDeque::with_config(DequeConfig::new().block_bytes(32), provider.clone()).unwrap();
        d.extend(0..3);
        provider.fail_after(0);
        assert!(matches!(
            d.push_back(3),
            Err(DequeError::AllocationFailed { .. })
        ));
        assert!(d.push_front(99).is_err());
        assert!(d.insert(1, 99).is_err());
        assert_eq!(contents(&d), [0, 1, 2]);
        provider.allow_all();
        d.push_back(3).unwrap();
        assert_eq!(d.len(), 4);
    }

    #[test]
    fn take_leaves_an_empty_deque() {
        let mut d = SegDeque::from([1, 2, 3]);
        let moved = d.take();
        assert!(d.is_empty());
        assert_eq!(contents(&moved), [1, 2, 3]);
        d.push_back(4).unwrap();
        assert_eq!(contents(&d), [4]);
    }

    #[test]
    fn swap_exchanges_contents() {
        let mut a = SegDeque::from([1, 2]);
        let mut b = SegDeque::from([3]);
        a.swap(&mut b);
        assert_eq!(contents(&a), [3]);
        assert_eq!(contents(&b), [1, 2]);
    }

    #[test]
    fn clone_is_independent() {
        let mut a: SegDeque<String> = ["x", "y", "z"].iter().map(|s| s.to_string()).collect();
        let b = a.clone();
        a[0].push('!');
        a.push_back("w".into()).unwrap();
        assert_eq!(contents(&b), ["x", "y", "z"]);
        assert_eq!(a[0], "x!");
    }

    #[test]
    fn try_clone_with_failure_releases_partial_copy() {
        let counter = LiveCounter::new();
        let provider = CountingProvider::new();
        let mut d: SegDeque<Tracked, CountingProvider> = SegDeque::with_provider(provider.clone());
        for i in 0..100 {
            d.push_back(Tracked::new(i, &counter)).unwrap();
        }
        let allocations = provider.live_allocations();
        let factory = FailingFactory::new(60);
        let result = d.try_clone_with(|item| factory.make(item.clone()));
        assert!(result.is_err());
        assert_eq!(counter.live(), 100);
        assert_eq!(provider.live_allocations(), allocations);
    }

    #[test]
    fn resize_grows_and_shrinks() {
        let mut d = SegDeque::new();
        d.resize(5, 7u8).unwrap();
        assert_eq!(contents(&d), [7; 5]);
        d.resize_default(2).unwrap();
        assert_eq!(contents(&d), [7, 7]);
        d.resize_default(4).unwrap();
        assert_eq!(contents(&d), [7, 7, 0, 0]);
        let mut n = 0;
        d.resize_with(6, || {
            n += 1;
            n
        })
        .unwrap();
        assert_eq!(contents(&d), [7, 7, 0, 0, 1, 2]);
    }

    #[test]
    fn from_elem_fills_presized_map() {
        let d = SegDeque::from_elem(200, 3u64, Global).unwrap();
        assert_eq!(d.len(), 200);
        assert!(d.iter().all(|&v| v == 3));
        assert_eq!(d.stats().blocks_acquired, 200 / 64 + 1);
        assert_eq!(d.stats().map_reallocations, 0);
    }

    #[test]
    fn zero_sized_elements() {
        let mut d: SegDeque<()> = SegDeque::new();
        for _ in 0..2000 {
            d.push_back(()).unwrap();
            d.push_front(()).unwrap();
        }
        assert_eq!(d.len(), 4000);
        d.insert(17, ()).unwrap();
        assert_eq!(d.erase(3), Ok(()));
        assert_eq!(d.iter().count(), 4000);
    }

    #[test]
    fn mutation_through_accessors() {
        let mut d = SegDeque::from([1, 2, 3]);
        *d.front_mut().unwrap() = 10;
        *d.back_mut().unwrap() = 30;
        *d.at_mut(1).unwrap() += 5;
        d[1] += 1;
        for v in d.iter_mut() {
            *v *= 2;
        }
        assert_eq!(contents(&d), [20, 16, 60]);
    }

    #[cfg(not(miri))]
    mod proptests {
        use super::*;
        use proptest::prelude::*;

        #[derive(Clone, Debug)]
        enum Op {
            PushBack(i32),
            PushFront(i32),
            PopBack,
            PopFront,
            Insert(usize, i32),
            Erase(usize),
            Clear,
            Shrink,
        }

        fn op() -> impl Strategy<Value = Op> {
            prop_oneof![
                4 => any::<i32>().prop_map(Op::PushBack),
                4 => any::<i32>().prop_map(Op::PushFront),
                2 => Just(Op::PopBack),
                2 => Just(Op::PopFront),
                2 => (any::<usize>(), any::<i32>()).prop_map(|(i, v)| Op::Insert(i, v)),
                2 => any::<usize>().prop_map(Op::Erase),
                1 => Just(Op::Clear),
                1 => Just(Op::Shrink),
            ]
        }

        proptest! {
            #[test]
            fn matches_vecdeque_model(
                block_bytes in 4usize..64,
                ops in proptest::collection::vec(op(), 0..300),
            ) {
                let mut d: SegDeque<i32> =
                    SegDeque::with_config(DequeConfig::new().block_bytes(block_bytes), Global)
                        .unwrap();
                let mut model: VecDeque<i32> = VecDeque::new();
                for op in ops {
                    match op {
                        Op::PushBack(v) => {
                            d.push_back(v).unwrap();
                            model.push_back(v);
                        }
                        Op::PushFront(v) => {
                            d.push_front(v).unwrap();
                            model.push_front(v);
                        }
                        Op::PopBack => prop_assert_eq!(d.pop_back(), model.pop_back()),
                        Op::PopFront => prop_assert_eq!(d.pop_front(), model.pop_front()),
                        Op::Insert(i, v) => {
                            let i = i % (model.len() + 1);
                            d.insert(i, v).unwrap();
                            model.insert(i, v);
                        }
                        Op::Erase(i) => {
                            if model.is_empty() {
                                prop_assert!(d.erase(i).is_err());
                            } else {
                                let i = i % model.len();
                                prop_assert_eq!(d.erase(i).ok(), model.remove(i));
                            }
                        }
                        Op::Clear => {
                            d.clear();
                            model.clear();
                        }
                        Op::Shrink => d.shrink_to_fit(),
                    }
                    prop_assert_eq!(d.len(), model.len());
                }
                prop_assert!(d.iter().eq(model.iter()));
                prop_assert!(d.iter().rev().eq(model.iter().rev()));
                for (i, v) in model.iter().enumerate() {
                    prop_assert_eq!(&d[i], v);
                }
                prop_assert_eq!(d.at(model.len()).is_err(), true);
            }

            #[test]
            fn kth_constructor_failure_is_atomic(
                len in 1usize..40,
                k in 1usize..10,
                front in any::<bool>(),
            ) {
                let counter = LiveCounter::new();
                let provider = CountingProvider::new();
                let mut d: SegDeque<Tracked, CountingProvider> = SegDeque::with_config(
                    DequeConfig::new().block_bytes(3 * std::mem::size_of::<Tracked>()),
                    provider.clone(),
                )
                .unwrap();
                for i in 0..len as i64 {
                    d.push_back(Tracked::new(i, &counter)).unwrap();
                }
                let factory = FailingFactory::new(k);
                let mut pushed = 0;
                loop {
                    let before_len = d.len();
                    let before_blocks = provider.live_allocations();
                    let value = Tracked::new(1000, &counter);
                    let result = if front {
                        d.push_front_with(|| factory.make(value))
                    } else {
                        d.push_back_with(|| factory.make(value))
                    };
                    if result.is_err() {
                        prop_assert_eq!(d.len(), before_len);
                        prop_assert_eq!(provider.live_allocations(), before_blocks);
                        break;
                    }
                    pushed += 1;
                }
                prop_assert_eq!(pushed, k - 1);
                prop_assert_eq!(counter.live(), (len + pushed) as isize);
                drop(d);
                prop_assert_eq!(counter.live(), 0);
                prop_assert_eq!(provider.live_allocations(), 0);
            }
        }
    }
}
