//! Iterators over a [`SegDeque`](crate::SegDeque).
//!
//! [`Iter`] and [`IterMut`] walk two [`Position`]s toward each other,
//! stepping across block boundaries through the block map. [`IntoIter`]
//! owns the deque and pops from either end.

#![allow(unsafe_code)]

use std::fmt;
use std::iter::FusedIterator;
use std::marker::PhantomData;

use segdeque_arena::{BlockMap, BlockStore, Global, MemoryProvider};

use crate::cursor::Position;
use crate::deque::SegDeque;

/// Shared-reference iterator, created by [`SegDeque::iter`].
pub struct Iter<'a, T, P: MemoryProvider = Global> {
    store: &'a BlockStore<T, P>,
    map: &'a BlockMap<T>,
    front: Position,
    back: Position,
    remaining: usize,
}

impl<'a, T, P: MemoryProvider> Iter<'a, T, P> {
    pub(crate) fn new(
        store: &'a BlockStore<T, P>,
        map: &'a BlockMap<T>,
        front: Position,
        back: Position,
        remaining: usize,
    ) -> Self {
        Self {
            store,
            map,
            front,
            back,
            remaining,
        }
    }
}

impl<T, P: MemoryProvider> Clone for Iter<'_, T, P> {
    fn clone(&self) -> Self {
        Self { ..*self }
    }
}

impl<T: fmt::Debug, P: MemoryProvider> fmt::Debug for Iter<'_, T, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Iter").field(&self.clone().collect::<Vec<_>>()).finish()
    }
}

impl<'a, T, P: MemoryProvider> Iterator for Iter<'a, T, P> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        if self.remaining == 0 {
            return None;
        }
        let pos = self.front;
        self.front = pos.next(self.store.block_len());
        self.remaining -= 1;
        // SAFETY: `pos` lies in the live range, which the shared borrow of
        // the deque freezes for `'a`.
        Some(unsafe { self.store.get(self.map.handle(pos.node), pos.offset) })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }

    fn nth(&mut self, n: usize) -> Option<&'a T> {
        if n >= self.remaining {
            self.front = self.back;
            self.remaining = 0;
            return None;
        }
        self.front = self.front.offset_by(n as isize, self.store.block_len());
        self.remaining -= n;
        self.next()
    }
}

impl<'a, T, P: MemoryProvider> DoubleEndedIterator for Iter<'a, T, P> {
    fn next_back(&mut self) -> Option<&'a T> {
        if self.remaining == 0 {
            return None;
        }
        self.back = self.back.prev(self.store.block_len());
        self.remaining -= 1;
        // SAFETY: as in `next`.
        Some(unsafe { self.store.get(self.map.handle(self.back.node), self.back.offset) })
    }
}

impl<T, P: MemoryProvider> ExactSizeIterator for Iter<'_, T, P> {}

impl<T, P: MemoryProvider> FusedIterator for Iter<'_, T, P> {}

/// Mutable-reference iterator, created by [`SegDeque::iter_mut`].
pub struct IterMut<'a, T, P: MemoryProvider = Global> {
    store: &'a BlockStore<T, P>,
    map: &'a BlockMap<T>,
    front: Position,
    back: Position,
    remaining: usize,
    _marker: PhantomData<&'a mut T>,
}

impl<'a, T, P: MemoryProvider> IterMut<'a, T, P> {
    /// Callers hold `&'a mut` on the deque for the iterator's lifetime.
    pub(crate) fn new(
        store: &'a BlockStore<T, P>,
        map: &'a BlockMap<T>,
        front: Position,
        back: Position,
        remaining: usize,
    ) -> Self {
        Self {
            store,
            map,
            front,
            back,
            remaining,
            _marker: PhantomData,
        }
    }
}

impl<T, P: MemoryProvider> fmt::Debug for IterMut<'_, T, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IterMut")
            .field("remaining", &self.remaining)
            .finish()
    }
}

impl<'a, T, P: MemoryProvider> Iterator for IterMut<'a, T, P> {
    type Item = &'a mut T;

    fn next(&mut self) -> Option<&'a mut T> {
        if self.remaining == 0 {
            return None;
        }
        let pos = self.front;
        self.front = pos.next(self.store.block_len());
        self.remaining -= 1;
        // SAFETY: the deque is exclusively borrowed for `'a` and each live
        // slot is yielded at most once.
        Some(unsafe { self.store.get_mut(self.map.handle(pos.node), pos.offset) })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<'a, T, P: MemoryProvider> DoubleEndedIterator for IterMut<'a, T, P> {
    fn next_back(&mut self) -> Option<&'a mut T> {
        if self.remaining == 0 {
            return None;
        }
        self.back = self.back.prev(self.store.block_len());
        self.remaining -= 1;
        // SAFETY: as in `next`.
        Some(unsafe { self.store.get_mut(self.map.handle(self.back.node), self.back.offset) })
    }
}

impl<T, P: MemoryProvider> ExactSizeIterator for IterMut<'_, T, P> {}

impl<T, P: MemoryProvider> FusedIterator for IterMut<'_, T, P> {}

/// Owning iterator, created by `SegDeque::into_iter`.
pub struct IntoIter<T, P: MemoryProvider = Global> {
    deque: SegDeque<T, P>,
}

impl<T, P: MemoryProvider> IntoIter<T, P> {
    pub(crate) fn new(deque: SegDeque<T, P>) -> Self {
        Self { deque }
    }
}

impl<T: fmt::Debug, P: MemoryProvider> fmt::Debug for IntoIter<T, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("IntoIter").field(&self.deque).finish()
    }
}

impl<T, P: MemoryProvider> Iterator for IntoIter<T, P> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        self.deque.pop_front()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self.deque.len();
        (len, Some(len))
    }
}

impl<T, P: MemoryProvider> DoubleEndedIterator for IntoIter<T, P> {
    fn next_back(&mut self) -> Option<T> {
        self.deque.pop_back()
    }
}

impl<T, P: MemoryProvider> ExactSizeIterator for IntoIter<T, P> {}

impl<T, P: MemoryProvider> FusedIterator for IntoIter<T, P> {}
