//! Block acquisition and placement construction.
//!
//! A [`BlockStore`] hands out storage blocks of a fixed slot count and
//! constructs or destroys elements inside them. It knows nothing about
//! which slots are live; that bookkeeping belongs to the container, which
//! is why the slot operations are `unsafe`.

#![allow(unsafe_code)]

use std::alloc::Layout;
use std::marker::PhantomData;
use std::ops::Range;

use segdeque_core::{DequeError, MapStats};

use crate::handle::BlockHandle;
use crate::provider::MemoryProvider;
use crate::raw;

/// Allocator and placement-construction front end for fixed-size blocks.
///
/// Every block issued by a store has exactly [`block_len`](Self::block_len)
/// slots. The store owns the memory provider.
pub struct BlockStore<T, P: MemoryProvider> {
    provider: P,
    block_len: usize,
    layout: Layout,
    stats: MapStats,
    _marker: PhantomData<T>,
}

impl<T, P: MemoryProvider> BlockStore<T, P> {
    /// Create a store issuing blocks of `block_len` slots.
    ///
    /// # Errors
    ///
    /// Returns [`DequeError::CapacityOverflow`] if a block of `block_len`
    /// elements cannot be described by a [`Layout`].
    pub fn new(provider: P, block_len: usize) -> Result<Self, DequeError> {
        debug_assert!(block_len > 0);
        let layout = raw::block_layout::<T>(block_len)?;
        Ok(Self {
            provider,
            block_len,
            layout,
            stats: MapStats::default(),
            _marker: PhantomData,
        })
    }

    /// Slots per block.
    pub fn block_len(&self) -> usize {
        self.block_len
    }

    /// Layout of one block.
    pub fn block_layout(&self) -> Layout {
        self.layout
    }

    /// The memory provider backing this store.
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Block acquisition/release counters.
    pub fn stats(&self) -> MapStats {
        self.stats
    }

    /// Allocate one block with every slot unconstructed.
    ///
    /// # Errors
    ///
    /// Returns [`DequeError::AllocationFailed`] if the provider refuses.
    /// Nothing is allocated in that case.
    pub fn acquire(&mut self) -> Result<BlockHandle<T>, DequeError> {
        let handle = raw::alloc_block(&self.provider, self.layout).inspect_err(|err| {
            log::debug!(
                "block acquisition failed after {} live blocks: {err}",
                self.stats.blocks_live()
            );
        })?;
        self.stats.blocks_acquired += 1;
        Ok(handle)
    }

    /// Return a block to the provider.
    ///
    /// # Safety
    ///
    /// `handle` was issued by this store, holds no live elements, and is
    /// not used again.
    pub unsafe fn release(&mut self, handle: BlockHandle<T>) {
        self.stats.blocks_released += 1;
        // SAFETY: issued by this store with `self.layout`, per the caller.
        unsafe { raw::dealloc_block(&self.provider, handle, self.layout) }
    }

    /// Move `value` into slot `offset` of `handle`.
    ///
    /// # Safety
    ///
    /// `offset < block_len` and the slot is unconstructed.
    pub unsafe fn construct(&self, handle: BlockHandle<T>, offset: usize, value: T) {
        debug_assert!(offset < self.block_len);
        // SAFETY: in-bounds unconstructed slot, per the caller.
        unsafe { raw::write(raw::slot_ptr(handle, offset), value) }
    }

    /// Run a fallible constructor and place its value at slot `offset`.
    ///
    /// The constructor runs before the slot is touched, so on `Err` the
    /// slot is exactly as it was.
    ///
    /// # Errors
    ///
    /// Returns whatever `make` returns.
    ///
    /// # Safety
    ///
    /// Same as [`construct`](Self::construct).
    pub unsafe fn construct_with<E, F>(
        &self,
        handle: BlockHandle<T>,
        offset: usize,
        make: F,
    ) -> Result<(), E>
    where
        F: FnOnce() -> Result<T, E>,
    {
        let value = make()?;
        // SAFETY: forwarded from the caller's contract.
        unsafe { self.construct(handle, offset, value) };
        Ok(())
    }

    /// Move the element out of slot `offset`.
    ///
    /// # Safety
    ///
    /// `offset < block_len`, the slot is live, and it is treated as
    /// unconstructed afterwards.
    pub unsafe fn take(&self, handle: BlockHandle<T>, offset: usize) -> T {
        debug_assert!(offset < self.block_len);
        // SAFETY: live slot, per the caller.
        unsafe { raw::read(raw::slot_ptr(handle, offset)) }
    }

    /// Destroy the element in slot `offset`.
    ///
    /// # Safety
    ///
    /// Same as [`take`](Self::take).
    pub unsafe fn destroy(&self, handle: BlockHandle<T>, offset: usize) {
        // SAFETY: forwarded from the caller's contract.
        unsafe { self.destroy_range(handle, offset..offset + 1) }
    }

    /// Destroy every element in `range` of one block.
    ///
    /// # Safety
    ///
    /// `range.end <= block_len` and every slot in `range` is live.
    pub unsafe fn destroy_range(&self, handle: BlockHandle<T>, range: Range<usize>) {
        debug_assert!(range.end <= self.block_len);
        if range.is_empty() {
            return;
        }
        // SAFETY: live run inside one block, per the caller.
        unsafe { raw::drop_run(raw::slot_ptr(handle, range.start), range.len()) }
    }

    /// Bitwise move of one element between slots.
    ///
    /// # Safety
    ///
    /// The source slot is live, the destination slot is unconstructed, both
    /// offsets are below `block_len`, and the source is treated as
    /// unconstructed afterwards.
    pub unsafe fn relocate(
        &self,
        src: (BlockHandle<T>, usize),
        dst: (BlockHandle<T>, usize),
    ) {
        debug_assert!(src.1 < self.block_len && dst.1 < self.block_len);
        // SAFETY: live source, vacant destination, per the caller.
        unsafe { raw::relocate(raw::slot_ptr(src.0, src.1), raw::slot_ptr(dst.0, dst.1)) }
    }

    /// Borrow the element in slot `offset`.
    ///
    /// # Safety
    ///
    /// The slot is live for all of `'a` and not mutated during `'a`.
    pub unsafe fn get<'a>(&self, handle: BlockHandle<T>, offset: usize) -> &'a T {
        debug_assert!(offset < self.block_len);
        // SAFETY: forwarded from the caller's contract.
        unsafe { raw::as_ref(raw::slot_ptr(handle, offset)) }
    }

    /// Mutably borrow the element in slot `offset`.
    ///
    /// # Safety
    ///
    /// The slot is live for all of `'a` and no other reference to it exists
    /// during `'a`.
    pub unsafe fn get_mut<'a>(&self, handle: BlockHandle<T>, offset: usize) -> &'a mut T {
        debug_assert!(offset < self.block_len);
        // SAFETY: forwarded from the caller's contract.
        unsafe { raw::as_mut(raw::slot_ptr(handle, offset)) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::Global;
    use std::cell::Cell;
    use std::rc::Rc;

    struct DropCounter(Rc<Cell<usize>>);

    impl Drop for DropCounter {
        fn drop(&mut self) {
            self.0.set(self.0.get() + 1);
        }
    }

    #[test]
    fn acquire_release_updates_stats() {
        let mut store: BlockStore<u32, Global> = BlockStore::new(Global, 16).unwrap();
        let h = store.acquire().unwrap();
        assert_eq!(store.stats().blocks_acquired, 1);
        unsafe { store.release(h) };
        assert_eq!(store.stats().blocks_released, 1);
        assert_eq!(store.stats().blocks_live(), 0);
    }

    #[test]
    fn construct_then_take_returns_value() {
        let mut store: BlockStore<String, Global> = BlockStore::new(Global, 4).unwrap();
        let h = store.acquire().unwrap();
        unsafe {
            store.construct(h, 3, "tail".to_string());
            assert_eq!(store.get(h, 3), "tail");
            store.get_mut(h, 3).push('!');
            assert_eq!(store.take(h, 3), "tail!");
            store.release(h);
        }
    }

    #[test]
    fn failed_constructor_leaves_slot_untouched() {
        let mut store: BlockStore<u64, Global> = BlockStore::new(Global, 4).unwrap();
        let h = store.acquire().unwrap();
        let result: Result<(), &str> = unsafe { store.construct_with(h, 0, || Err("boom")) };
        assert_eq!(result, Err("boom"));
        unsafe {
            store.construct_with::<(), _>(h, 0, || Ok(7)).unwrap();
            assert_eq!(*store.get(h, 0), 7);
            store.release(h);
        }
    }

    #[test]
    fn destroy_range_runs_each_destructor_once() {
        let drops = Rc::new(Cell::new(0));
        let mut store: BlockStore<DropCounter, Global> = BlockStore::new(Global, 8).unwrap();
        let h = store.acquire().unwrap();
        unsafe {
            for i in 2..6 {
                store.construct(h, i, DropCounter(drops.clone()));
            }
            store.destroy_range(h, 2..5);
            assert_eq!(drops.get(), 3);
            store.destroy(h, 5);
            assert_eq!(drops.get(), 4);
            store.release(h);
        }
    }

    #[test]
    fn relocate_moves_across_blocks() {
        let mut store: BlockStore<Vec<u8>, Global> = BlockStore::new(Global, 2).unwrap();
        let a = store.acquire().unwrap();
        let b = store.acquire().unwrap();
        unsafe {
            store.construct(a, 1, vec![1, 2, 3]);
            store.relocate((a, 1), (b, 0));
            assert_eq!(store.take(b, 0), vec![1, 2, 3]);
            store.release(a);
            store.release(b);
        }
    }

    #[test]
    fn zero_sized_blocks_skip_the_provider() {
        let mut store: BlockStore<(), Global> = BlockStore::new(Global, 512).unwrap();
        assert_eq!(store.block_layout().size(), 0);
        let h = store.acquire().unwrap();
        unsafe {
            store.construct(h, 100, ());
            store.destroy(h, 100);
            store.release(h);
        }
    }

    #[test]
    fn oversized_block_is_capacity_overflow() {
        let result = BlockStore::<u64, Global>::new(Global, usize::MAX / 4);
        assert!(matches!(result, Err(DequeError::CapacityOverflow)));
    }
}
