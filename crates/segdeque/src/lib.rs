//! segdeque: a segmented double-ended, random-access sequence container.
//!
//! Elements live in fixed-size blocks indexed by a block map, so pushes
//! and pops at either end are amortized O(1), indexing is O(1), and
//! growing the map never moves an element.
//!
//! # Quick start
//!
//! ```rust
//! use segdeque::prelude::*;
//!
//! let mut d = SegDeque::new();
//! d.push_back(1).unwrap();
//! d.push_back(2).unwrap();
//! d.push_front(0).unwrap();
//! assert_eq!(d.iter().copied().collect::<Vec<_>>(), [0, 1, 2]);
//!
//! let at = (d.begin() + 2).index();
//! d.insert(at, 9).unwrap();
//! assert_eq!(d.erase(0), Ok(0));
//! assert_eq!(d, SegDeque::from([1, 9, 2]));
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `segdeque-core` | `DequeError`, `DequeConfig`, `MapStats` |
//! | [`arena`] | `segdeque-arena` | Memory providers, block store, block map |
//! | [`cursor`] | this crate | `Position`, `Cursor` |
//! | [`iter`] | this crate | `Iter`, `IterMut`, `IntoIter` |
//!
//! # Safety
//!
//! `unsafe` is denied crate-wide and allowed only in `deque.rs` and
//! `iter.rs`, which hand out references to slots the block store manages.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_code)]

mod cmp;
pub mod cursor;
mod deque;
pub mod iter;

pub use cmp::swap;
pub use cursor::{Cursor, Position};
pub use deque::SegDeque;

/// Block store, block map, and memory providers (`segdeque-arena`).
///
/// Implement [`arena::MemoryProvider`] to control where blocks come from.
pub use segdeque_arena as arena;

/// Error, configuration, and statistics types (`segdeque-core`).
pub use segdeque_core as types;

/// Convenience re-exports for common usage.
///
/// ```rust
/// use segdeque::prelude::*;
/// ```
pub mod prelude {
    pub use crate::cursor::{Cursor, Position};
    pub use crate::deque::SegDeque;
    pub use segdeque_arena::{Global, MemoryProvider};
    pub use segdeque_core::{DequeConfig, DequeError, MapStats};
}
