//! Pluggable memory providers.
//!
//! A [`MemoryProvider`] decides how raw block memory is obtained and
//! returned. The container captures one provider at construction and uses
//! it for its whole lifetime; copies ask the source provider what the copy
//! should use via [`MemoryProvider::select_on_copy`].

#![allow(unsafe_code)]

use std::alloc::Layout;
use std::ptr::NonNull;

use segdeque_core::DequeError;

/// Source of raw memory for storage blocks.
///
/// Implementations must return memory that satisfies the requested
/// layout, or an error. They are never asked for zero-sized layouts.
pub trait MemoryProvider: Clone {
    /// Allocate memory for `layout`.
    ///
    /// # Errors
    ///
    /// Returns [`DequeError::AllocationFailed`] if no memory is available.
    fn allocate(&self, layout: Layout) -> Result<NonNull<u8>, DequeError>;

    /// Return memory previously obtained from [`allocate`](Self::allocate).
    ///
    /// # Safety
    ///
    /// `ptr` must have been returned by `allocate` on this provider (or a
    /// clone that shares its backing state) with the same `layout`, and
    /// must not be used afterwards.
    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout);

    /// The provider a copy of the owning container should use.
    ///
    /// Defaults to propagating a clone of `self`.
    fn select_on_copy(&self) -> Self {
        self.clone()
    }

    /// Upper bound on a single allocation in bytes.
    fn max_bytes(&self) -> usize {
        isize::MAX as usize
    }
}

/// The process-wide allocator from `std::alloc`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Global;

impl MemoryProvider for Global {
    fn allocate(&self, layout: Layout) -> Result<NonNull<u8>, DequeError> {
        debug_assert!(layout.size() > 0, "providers never see zero-sized layouts");
        // SAFETY: callers never request zero-sized layouts.
        let ptr = unsafe { std::alloc::alloc(layout) };
        NonNull::new(ptr).ok_or(DequeError::AllocationFailed {
            bytes: layout.size(),
        })
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        // SAFETY: forwarded from the caller's contract.
        unsafe { std::alloc::dealloc(ptr.as_ptr(), layout) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn global_round_trip() {
        let layout = Layout::array::<u64>(16).unwrap();
        let ptr = Global.allocate(layout).unwrap();
        assert_eq!(ptr.as_ptr() as usize % layout.align(), 0);
        unsafe { Global.deallocate(ptr, layout) };
    }

    #[test]
    fn select_on_copy_propagates_by_default() {
        assert_eq!(Global.select_on_copy(), Global);
    }

    #[test]
    fn max_bytes_is_isize_max() {
        assert_eq!(Global.max_bytes(), isize::MAX as usize);
    }
}
