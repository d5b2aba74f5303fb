//! The block map: an index of block handles with slack at both ends.
//!
//! [`BlockMap`] owns a slot array of `Option<BlockHandle<T>>` and the
//! contiguous in-use node range `[first, last]`. Every slot in the in-use
//! range holds a block. Slots outside it are slack: either empty, or
//! caching an owned block with no live elements, ready to be claimed by
//! the next boundary crossing at that slot.
//!
//! Growth never touches element data. When one end runs out of slack the
//! map either recenters the in-use range inside the existing array or
//! moves the handles into a larger array, and reports the node shift so
//! the owner can rebase its positions.

#![allow(unsafe_code)]

use segdeque_core::{DequeError, MapStats};
use smallvec::SmallVec;

use crate::handle::BlockHandle;
use crate::provider::MemoryProvider;
use crate::store::BlockStore;

/// A block staged for attachment at one end of the in-use range.
///
/// Obtained from [`BlockMap::claim_back`] / [`BlockMap::claim_front`];
/// must be handed back through the matching `commit_*` or `unclaim_*`.
#[must_use]
#[derive(Debug)]
pub struct Claim<T> {
    handle: BlockHandle<T>,
    fresh: bool,
}

impl<T> Claim<T> {
    /// The staged block.
    pub fn handle(&self) -> BlockHandle<T> {
        self.handle
    }

    /// Whether the block came from the provider rather than the slack cache.
    pub fn is_fresh(&self) -> bool {
        self.fresh
    }
}

/// Index array of block handles with a centered in-use range.
pub struct BlockMap<T> {
    /// One entry per map slot. Length is the map size.
    slots: Vec<Option<BlockHandle<T>>>,
    /// First in-use node (inclusive).
    first: usize,
    /// Last in-use node (inclusive).
    last: usize,
    stats: MapStats,
}

impl<T> BlockMap<T> {
    /// An unallocated map. Holds no slots until [`with_blocks`](Self::with_blocks).
    pub const fn new() -> Self {
        Self {
            slots: Vec::new(),
            first: 0,
            last: 0,
            stats: MapStats {
                blocks_acquired: 0,
                blocks_released: 0,
                blocks_reused: 0,
                map_recenters: 0,
                map_reallocations: 0,
            },
        }
    }

    /// Allocate a map for `n_blocks` blocks and acquire all of them.
    ///
    /// The map has `max(min_map_size, n_blocks + 2)` slots with the blocks
    /// centered, so both ends start with slack. Only the first block is in
    /// use; the others are cached in the slots directly after it, ready for
    /// back pushes.
    ///
    /// # Errors
    ///
    /// Returns [`DequeError::AllocationFailed`] if the slot array or any
    /// block cannot be allocated. Blocks acquired before the failure are
    /// released first.
    pub fn with_blocks<P: MemoryProvider>(
        n_blocks: usize,
        min_map_size: usize,
        store: &mut BlockStore<T, P>,
    ) -> Result<Self, DequeError> {
        let n_blocks = n_blocks.max(1);
        let size = n_blocks
            .checked_add(2)
            .ok_or(DequeError::CapacityOverflow)?
            .max(min_map_size);
        let mut slots = alloc_slots(size)?;
        let first = (size - n_blocks) / 2;

        for node in first..first + n_blocks {
            match store.acquire() {
                Ok(handle) => slots[node] = Some(handle),
                Err(err) => {
                    for handle in slots.iter_mut().filter_map(Option::take) {
                        // SAFETY: freshly acquired, never constructed into.
                        unsafe { store.release(handle) };
                    }
                    return Err(err);
                }
            }
        }

        Ok(Self {
            slots,
            first,
            last: first,
            stats: MapStats::default(),
        })
    }

    /// Whether the slot array exists.
    pub fn is_allocated(&self) -> bool {
        !self.slots.is_empty()
    }

    /// Number of slots in the map.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether the map has no slots.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// First in-use node.
    pub fn first(&self) -> usize {
        self.first
    }

    /// Last in-use node.
    pub fn last(&self) -> usize {
        self.last
    }

    /// Number of in-use nodes (0 when unallocated).
    pub fn in_use(&self) -> usize {
        if self.is_allocated() {
            self.last - self.first + 1
        } else {
            0
        }
    }

    /// Free slots before the in-use range.
    pub fn slack_front(&self) -> usize {
        self.first
    }

    /// Free slots after the in-use range.
    pub fn slack_back(&self) -> usize {
        self.slots.len().saturating_sub(self.last + 1)
    }

    /// Blocks parked in slack slots.
    pub fn cached_blocks(&self) -> usize {
        self.slack_slots().filter(|slot| slot.is_some()).count()
    }

    /// Map growth and reuse counters.
    pub fn stats(&self) -> MapStats {
        self.stats
    }

    /// The whole slot array.
    pub fn slots(&self) -> &[Option<BlockHandle<T>>] {
        &self.slots
    }

    /// Block at an in-use node.
    ///
    /// # Panics
    ///
    /// Panics if `node` is outside the in-use range.
    pub fn handle(&self, node: usize) -> BlockHandle<T> {
        assert!(
            node >= self.first && node <= self.last,
            "node {node} outside in-use range {}..={}",
            self.first,
            self.last
        );
        self.slots[node].expect("in-use map slot holds a block")
    }

    /// Make sure `nodes_to_add` free slots exist on one side.
    ///
    /// Returns the shift applied to every node index (0 when the existing
    /// slack already suffices).
    ///
    /// # Errors
    ///
    /// Propagates failures from [`grow`](Self::grow); the map is unchanged.
    ///
    /// # Panics
    ///
    /// Panics if the map is unallocated.
    pub fn reserve(&mut self, nodes_to_add: usize, at_front: bool) -> Result<isize, DequeError> {
        assert!(self.is_allocated(), "reserve on an unallocated block map");
        let available = if at_front {
            self.slack_front()
        } else {
            self.slack_back()
        };
        if nodes_to_add <= available {
            return Ok(0);
        }
        self.grow(nodes_to_add, at_front)
    }

    /// Grow so that `nodes_to_add` slots are free on the requested side.
    ///
    /// If the array has more than twice the needed node count, the in-use
    /// handles are shifted toward the center of the existing array.
    /// Otherwise the handles move to an array of
    /// `len + max(len, nodes_to_add) + 2` slots. Either way the in-use range
    /// ends up centered with `nodes_to_add` extra slots on the requested
    /// side, cached slack blocks are kept, and element data stays put.
    ///
    /// Returns the signed shift applied to every in-use node index.
    ///
    /// # Errors
    ///
    /// Returns [`DequeError::CapacityOverflow`] if the new size overflows,
    /// or [`DequeError::AllocationFailed`] if the new array cannot be
    /// allocated. The map is unchanged on error.
    ///
    /// # Panics
    ///
    /// Panics if the map is unallocated: there is no in-use range to move.
    pub fn grow(&mut self, nodes_to_add: usize, at_front: bool) -> Result<isize, DequeError> {
        assert!(self.is_allocated(), "grow on an unallocated block map");
        let old_nodes = self.in_use();
        let new_nodes = old_nodes
            .checked_add(nodes_to_add)
            .ok_or(DequeError::CapacityOverflow)?;
        let size = self.slots.len();
        let front_bias = if at_front { nodes_to_add } else { 0 };

        let new_first = if new_nodes
            .checked_mul(2)
            .is_some_and(|needed| size > needed)
        {
            let new_first = (size - new_nodes) / 2 + front_bias;
            let new_last = new_first + old_nodes - 1;
            if new_first < self.first {
                self.slots[new_first..=self.last].rotate_left(self.first - new_first);
            } else if new_first > self.first {
                self.slots[self.first..=new_last].rotate_right(new_first - self.first);
            }
            self.stats.map_recenters += 1;
            log::trace!(
                "block map recentered: {old_nodes} nodes moved from slot {} to {new_first} of {size}",
                self.first
            );
            new_first
        } else {
            let new_size = size
                .checked_add(size.max(nodes_to_add))
                .and_then(|n| n.checked_add(2))
                .ok_or(DequeError::CapacityOverflow)?;
            let mut new_slots = alloc_slots(new_size)?;
            let new_first = (new_size - new_nodes) / 2 + front_bias;
            new_slots[new_first..new_first + old_nodes]
                .copy_from_slice(&self.slots[self.first..=self.last]);

            // Cached blocks move into the new slack, nearest slots first.
            let spare: SmallVec<[BlockHandle<T>; 8]> =
                self.slack_slots().flatten().copied().collect();
            let (front, rest) = new_slots.split_at_mut(new_first);
            let back = &mut rest[old_nodes..];
            let mut spare = spare.into_iter();
            for slot in front.iter_mut().rev().chain(back.iter_mut()) {
                match spare.next() {
                    Some(handle) => *slot = Some(handle),
                    None => break,
                }
            }
            debug_assert!(spare.next().is_none(), "new slack holds every cached block");

            self.slots = new_slots;
            self.stats.map_reallocations += 1;
            log::debug!("block map reallocated: {size} -> {new_size} slots, {old_nodes} nodes in use");
            new_first
        };

        let shift = new_first as isize - self.first as isize;
        self.first = new_first;
        self.last = new_first + old_nodes - 1;
        Ok(shift)
    }

    /// Stage a block for the slot just after the in-use range.
    ///
    /// A cached block in that slot is reused; otherwise one is acquired.
    /// Call [`reserve`](Self::reserve) first.
    ///
    /// # Errors
    ///
    /// Returns [`DequeError::AllocationFailed`] if a fresh block is needed
    /// and the provider refuses.
    pub fn claim_back<P: MemoryProvider>(
        &mut self,
        store: &mut BlockStore<T, P>,
    ) -> Result<Claim<T>, DequeError> {
        debug_assert!(self.slack_back() >= 1, "reserve(1, false) before claim_back");
        let node = self.last + 1;
        claim_slot(&mut self.slots[node], store)
    }

    /// Stage a block for the slot just before the in-use range.
    ///
    /// # Errors
    ///
    /// Same as [`claim_back`](Self::claim_back).
    pub fn claim_front<P: MemoryProvider>(
        &mut self,
        store: &mut BlockStore<T, P>,
    ) -> Result<Claim<T>, DequeError> {
        debug_assert!(self.slack_front() >= 1, "reserve(1, true) before claim_front");
        let node = self.first - 1;
        claim_slot(&mut self.slots[node], store)
    }

    /// Extend the in-use range by one node at the back.
    pub fn commit_back(&mut self, claim: Claim<T>) {
        self.last += 1;
        self.commit_at(self.last, claim);
    }

    /// Extend the in-use range by one node at the front.
    pub fn commit_front(&mut self, claim: Claim<T>) {
        self.first -= 1;
        self.commit_at(self.first, claim);
    }

    /// Undo a [`claim_back`](Self::claim_back): fresh blocks are released,
    /// reused ones go back to the cache.
    pub fn unclaim_back<P: MemoryProvider>(&mut self, claim: Claim<T>, store: &mut BlockStore<T, P>) {
        let node = self.last + 1;
        unclaim_slot(&mut self.slots[node], claim, store);
    }

    /// Undo a [`claim_front`](Self::claim_front).
    pub fn unclaim_front<P: MemoryProvider>(
        &mut self,
        claim: Claim<T>,
        store: &mut BlockStore<T, P>,
    ) {
        let node = self.first - 1;
        unclaim_slot(&mut self.slots[node], claim, store);
    }

    /// Drop the last in-use node and release its block.
    ///
    /// # Safety
    ///
    /// The last block holds no live elements and more than one node is in
    /// use.
    pub unsafe fn release_back<P: MemoryProvider>(&mut self, store: &mut BlockStore<T, P>) {
        debug_assert!(self.last > self.first);
        let handle = self.slots[self.last].take();
        self.last -= 1;
        if let Some(handle) = handle {
            // SAFETY: empty block, per the caller.
            unsafe { store.release(handle) };
        }
    }

    /// Drop the first in-use node and release its block.
    ///
    /// # Safety
    ///
    /// The first block holds no live elements and more than one node is in
    /// use.
    pub unsafe fn release_front<P: MemoryProvider>(&mut self, store: &mut BlockStore<T, P>) {
        debug_assert!(self.last > self.first);
        let handle = self.slots[self.first].take();
        self.first += 1;
        if let Some(handle) = handle {
            // SAFETY: empty block, per the caller.
            unsafe { store.release(handle) };
        }
    }

    /// Shrink the in-use range to its first node. The other blocks stay in
    /// their slots as cached slack.
    ///
    /// The owner must have destroyed every element in the dropped nodes.
    pub fn collapse(&mut self) {
        self.last = self.first;
    }

    /// Release every cached slack block. In-use blocks are not touched.
    pub fn release_slack<P: MemoryProvider>(&mut self, store: &mut BlockStore<T, P>) {
        let (first, last) = (self.first, self.last);
        for (node, slot) in self.slots.iter_mut().enumerate() {
            if node >= first && node <= last {
                continue;
            }
            if let Some(handle) = slot.take() {
                // SAFETY: slack blocks never hold live elements.
                unsafe { store.release(handle) };
            }
        }
    }

    /// Release every block and free the slot array.
    ///
    /// # Safety
    ///
    /// No block in the map holds live elements.
    pub unsafe fn release_all<P: MemoryProvider>(&mut self, store: &mut BlockStore<T, P>) {
        for handle in self.slots.drain(..).flatten() {
            // SAFETY: every block is empty, per the caller.
            unsafe { store.release(handle) };
        }
        self.slots = Vec::new();
        self.first = 0;
        self.last = 0;
    }

    fn commit_at(&mut self, node: usize, claim: Claim<T>) {
        debug_assert!(self.slots[node].is_none());
        if !claim.fresh {
            self.stats.blocks_reused += 1;
        }
        self.slots[node] = Some(claim.handle);
    }

    fn slack_slots(&self) -> impl Iterator<Item = &Option<BlockHandle<T>>> {
        let end = if self.is_allocated() { self.last + 1 } else { 0 };
        self.slots[..self.first]
            .iter()
            .chain(self.slots[end..].iter())
    }
}

impl<T> Default for BlockMap<T> {
    fn default() -> Self {
        Self::new()
    }
}

fn alloc_slots<T>(size: usize) -> Result<Vec<Option<BlockHandle<T>>>, DequeError> {
    let mut slots = Vec::new();
    slots
        .try_reserve_exact(size)
        .map_err(|_| DequeError::AllocationFailed {
            bytes: size.saturating_mul(std::mem::size_of::<Option<BlockHandle<T>>>()),
        })?;
    slots.resize(size, None);
    Ok(slots)
}

fn claim_slot<T, P: MemoryProvider>(
    slot: &mut Option<BlockHandle<T>>,
    store: &mut BlockStore<T, P>,
) -> Result<Claim<T>, DequeError> {
    match slot.take() {
        Some(handle) => Ok(Claim {
            handle,
            fresh: false,
        }),
        None => Ok(Claim {
            handle: store.acquire()?,
            fresh: true,
        }),
    }
}

fn unclaim_slot<T, P: MemoryProvider>(
    slot: &mut Option<BlockHandle<T>>,
    claim: Claim<T>,
    store: &mut BlockStore<T, P>,
) {
    if claim.fresh {
        // SAFETY: a staged block is never constructed into before commit.
        unsafe { store.release(claim.handle) };
    } else {
        *slot = Some(claim.handle);
    }
}
