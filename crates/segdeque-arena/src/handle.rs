//! Opaque block handles.
//!
//! A [`BlockHandle`] names one storage block. It is `Copy` so the block
//! map can shuffle handles freely; ownership of the block itself belongs
//! to whichever map slot holds the handle.

use std::fmt;
use std::marker::PhantomData;
use std::ptr::NonNull;

/// Identifier of a storage block holding up to `block_len` elements of `T`.
///
/// Handles carry no length; the [`BlockStore`](crate::BlockStore) that
/// issued them knows the block length.
#[must_use]
pub struct BlockHandle<T> {
    /// Start of the block's slot array.
    pub(crate) base: NonNull<T>,
    pub(crate) _marker: PhantomData<T>,
}

impl<T> BlockHandle<T> {
    pub(crate) fn new(base: NonNull<T>) -> Self {
        Self {
            base,
            _marker: PhantomData,
        }
    }

    /// Address of the first slot. Stable for the life of the block.
    pub fn addr(&self) -> usize {
        self.base.as_ptr() as usize
    }
}

impl<T> Clone for BlockHandle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for BlockHandle<T> {}

impl<T> PartialEq for BlockHandle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.base == other.base
    }
}

impl<T> Eq for BlockHandle<T> {}

impl<T> fmt::Debug for BlockHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BlockHandle({:#x})", self.addr())
    }
}
