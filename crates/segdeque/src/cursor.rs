//! Block-crossing coordinates and random-access cursors.
//!
//! A [`Position`] is a plain `(node, offset)` pair; all arithmetic on it
//! takes the block length explicitly, so it carries no reference to the
//! container. A [`Cursor`] pairs a position with a shared borrow of the
//! deque, which makes every cursor end at the next `&mut` operation.

use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, AddAssign, Sub, SubAssign};
use std::ptr;

use segdeque_arena::{Global, MemoryProvider};

use crate::deque::SegDeque;

/// Location of one slot: map node and offset within that node's block.
///
/// Ordered by node, then offset, which is logical order inside one
/// container.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
    /// Index into the block map.
    pub node: usize,
    /// Slot within the block, always `< block_len`.
    pub offset: usize,
}

impl Position {
    /// Build a position.
    pub const fn new(node: usize, offset: usize) -> Self {
        Self { node, offset }
    }

    /// Move by `n` slots (negative moves backwards), crossing blocks in O(1).
    ///
    /// Uses floor division so a step back from offset 0 lands on the last
    /// slot of the previous node.
    pub fn offset_by(self, n: isize, block_len: usize) -> Self {
        let b = block_len as isize;
        let linear = self.offset as isize + n;
        Self {
            node: (self.node as isize).wrapping_add(linear.div_euclid(b)) as usize,
            offset: linear.rem_euclid(b) as usize,
        }
    }

    /// Signed slot count from `other` to `self`.
    pub fn distance(self, other: Self, block_len: usize) -> isize {
        let nodes = (self.node as isize).wrapping_sub(other.node as isize);
        nodes * block_len as isize + (self.offset as isize - other.offset as isize)
    }

    /// The following slot.
    pub fn next(self, block_len: usize) -> Self {
        if self.offset + 1 == block_len {
            Self::new(self.node.wrapping_add(1), 0)
        } else {
            Self::new(self.node, self.offset + 1)
        }
    }

    /// The preceding slot.
    pub fn prev(self, block_len: usize) -> Self {
        if self.offset == 0 {
            Self::new(self.node.wrapping_sub(1), block_len - 1)
        } else {
            Self::new(self.node, self.offset - 1)
        }
    }

    /// Apply a map shift to the node index.
    pub(crate) fn rebase(self, shift: isize) -> Self {
        Self::new((self.node as isize + shift) as usize, self.offset)
    }
}

/// Random-access cursor into a [`SegDeque`].
///
/// Supports `+`/`-` with `isize`, difference between cursors, and all
/// six comparisons. Comparisons between cursors of different deques
/// return `false` / `None`. A cursor moved outside `begin()..=end()`
/// dereferences to `None`.
pub struct Cursor<'a, T, P: MemoryProvider = Global> {
    deque: &'a SegDeque<T, P>,
    pos: Position,
}

impl<'a, T, P: MemoryProvider> Cursor<'a, T, P> {
    pub(crate) fn new(deque: &'a SegDeque<T, P>, pos: Position) -> Self {
        Self { deque, pos }
    }

    /// The underlying coordinate.
    pub fn position(&self) -> Position {
        self.pos
    }

    /// Element under the cursor, or `None` at `end()` or out of range.
    pub fn get(&self) -> Option<&'a T> {
        self.deque.get_at(self.pos)
    }

    /// Element `n` slots away (`it[n]`).
    pub fn peek(&self, n: isize) -> Option<&'a T> {
        self.deque.get_at(self.pos.offset_by(n, self.deque.block_len()))
    }

    /// Logical index of the cursor (`it - begin()`).
    ///
    /// # Panics
    ///
    /// Panics if the cursor lies before `begin()`.
    pub fn index(&self) -> usize {
        let d = self
            .pos
            .distance(self.deque.begin_position(), self.deque.block_len());
        assert!(d >= 0, "cursor {d} slots before begin()");
        d as usize
    }

    /// Step forward one slot (`++it`).
    pub fn move_next(&mut self) {
        self.pos = self.pos.next(self.deque.block_len());
    }

    /// Step back one slot (`--it`).
    pub fn move_prev(&mut self) {
        self.pos = self.pos.prev(self.deque.block_len());
    }

    fn same_deque(&self, other: &Self) -> bool {
        ptr::eq(self.deque, other.deque)
    }
}

impl<T, P: MemoryProvider> Clone for Cursor<'_, T, P> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T, P: MemoryProvider> Copy for Cursor<'_, T, P> {}

impl<T, P: MemoryProvider> fmt::Debug for Cursor<'_, T, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cursor")
            .field("node", &self.pos.node)
            .field("offset", &self.pos.offset)
            .finish()
    }
}

impl<T, P: MemoryProvider> PartialEq for Cursor<'_, T, P> {
    fn eq(&self, other: &Self) -> bool {
        self.same_deque(other) && self.pos == other.pos
    }
}

impl<T, P: MemoryProvider> PartialOrd for Cursor<'_, T, P> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.same_deque(other).then(|| self.pos.cmp(&other.pos))
    }
}

// ── Arithmetic ──────────────────────────────────────────────────

impl<T, P: MemoryProvider> Add<isize> for Cursor<'_, T, P> {
    type Output = Self;

    fn add(mut self, n: isize) -> Self {
        self += n;
        self
    }
}

impl<T, P: MemoryProvider> Sub<isize> for Cursor<'_, T, P> {
    type Output = Self;

    fn sub(mut self, n: isize) -> Self {
        self -= n;
        self
    }
}

impl<T, P: MemoryProvider> AddAssign<isize> for Cursor<'_, T, P> {
    fn add_assign(&mut self, n: isize) {
        self.pos = self.pos.offset_by(n, self.deque.block_len());
    }
}

impl<T, P: MemoryProvider> SubAssign<isize> for Cursor<'_, T, P> {
    fn sub_assign(&mut self, n: isize) {
        self.pos = self.pos.offset_by(-n, self.deque.block_len());
    }
}

impl<'a, T, P: MemoryProvider> Sub<Cursor<'a, T, P>> for Cursor<'a, T, P> {
    type Output = isize;

    fn sub(self, other: Cursor<'a, T, P>) -> isize {
        debug_assert!(self.same_deque(&other), "cursors from different deques");
        self.pos.distance(other.pos, self.deque.block_len())
    }
}
