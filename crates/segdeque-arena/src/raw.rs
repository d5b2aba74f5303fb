//! Low-level primitives for block memory and in-place element lifetimes.
//!
//! Every function here is a thin wrapper over one `std::ptr` or
//! `std::alloc` operation, each with a `// SAFETY:` note stating what the
//! caller guarantees. [`BlockStore`](crate::BlockStore) is the only caller.

#![allow(unsafe_code)]

use std::alloc::Layout;
use std::ptr::{self, NonNull};

use segdeque_core::DequeError;

use crate::handle::BlockHandle;
use crate::provider::MemoryProvider;

// A handle is a unique owner of its block's slots, so it may cross threads
// exactly when the elements may.
unsafe impl<T: Send> Send for BlockHandle<T> {}
unsafe impl<T: Sync> Sync for BlockHandle<T> {}

/// Layout of one block of `len` slots.
pub(crate) fn block_layout<T>(len: usize) -> Result<Layout, DequeError> {
    Layout::array::<T>(len).map_err(|_| DequeError::CapacityOverflow)
}

/// Obtain raw storage for one block. Zero-sized layouts never reach the
/// provider.
pub(crate) fn alloc_block<T, P: MemoryProvider>(
    provider: &P,
    layout: Layout,
) -> Result<BlockHandle<T>, DequeError> {
    if layout.size() == 0 {
        return Ok(BlockHandle::new(NonNull::dangling()));
    }
    if layout.size() > provider.max_bytes() {
        return Err(DequeError::AllocationFailed {
            bytes: layout.size(),
        });
    }
    let raw = provider.allocate(layout)?;
    Ok(BlockHandle::new(raw.cast::<T>()))
}

/// Return a block's storage to its provider.
///
/// # Safety
///
/// `handle` came from [`alloc_block`] with the same provider and layout,
/// holds no live elements, and is not used again.
pub(crate) unsafe fn dealloc_block<T, P: MemoryProvider>(
    provider: &P,
    handle: BlockHandle<T>,
    layout: Layout,
) {
    if layout.size() == 0 {
        return;
    }
    // SAFETY: the caller guarantees the handle/layout pairing.
    unsafe { provider.deallocate(handle.base.cast::<u8>(), layout) }
}

/// Pointer to slot `offset` of a block. Computing it is safe; using it is not.
#[inline]
pub(crate) fn slot_ptr<T>(handle: BlockHandle<T>, offset: usize) -> *mut T {
    handle.base.as_ptr().wrapping_add(offset)
}

/// Move `value` into an unconstructed slot.
///
/// # Safety
///
/// `slot` is in bounds of a live block and holds no live element.
#[inline]
pub(crate) unsafe fn write<T>(slot: *mut T, value: T) {
    // SAFETY: in-bounds, unconstructed slot per the caller.
    unsafe { ptr::write(slot, value) }
}

/// Move the element out of a slot, leaving it unconstructed.
///
/// # Safety
///
/// `slot` holds a live element that is not read again.
#[inline]
pub(crate) unsafe fn read<T>(slot: *mut T) -> T {
    // SAFETY: live slot per the caller; ownership moves to the return value.
    unsafe { ptr::read(slot) }
}

/// Run the destructors of `len` consecutive live elements starting at `first`.
///
/// # Safety
///
/// All `len` slots hold live elements that are not used again.
#[inline]
pub(crate) unsafe fn drop_run<T>(first: *mut T, len: usize) {
    // SAFETY: the run is live and exclusively owned per the caller.
    unsafe { ptr::drop_in_place(ptr::slice_from_raw_parts_mut(first, len)) }
}

/// Bitwise move of one element from `src` to `dst`.
///
/// # Safety
///
/// `src` holds a live element, `dst` is an unconstructed in-bounds slot,
/// and after the call `src` is treated as unconstructed.
#[inline]
pub(crate) unsafe fn relocate<T>(src: *mut T, dst: *mut T) {
    // SAFETY: distinct slots of the same `T` per the caller.
    unsafe { ptr::copy_nonoverlapping(src, dst, 1) }
}

/// Shared reference to a live element.
///
/// # Safety
///
/// `slot` holds a live element that outlives `'a` and is not mutated
/// during `'a`.
#[inline]
pub(crate) unsafe fn as_ref<'a, T>(slot: *mut T) -> &'a T {
    // SAFETY: live, unaliased-for-writes slot per the caller.
    unsafe { &*slot }
}

/// Exclusive reference to a live element.
///
/// # Safety
///
/// `slot` holds a live element that outlives `'a` and no other reference
/// to it exists during `'a`.
#[inline]
pub(crate) unsafe fn as_mut<'a, T>(slot: *mut T) -> &'a mut T {
    // SAFETY: live, exclusively borrowed slot per the caller.
    unsafe { &mut *slot }
}
