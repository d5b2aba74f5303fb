//! Segmented storage for the segdeque container.
//!
//! Two layers live here, each depending only on the one below it:
//!
//! ```text
//! BlockMap (index of block handles, in-use node range, growth policy)
//! └── BlockStore (acquire/release blocks, placement construct/destroy)
//!     └── MemoryProvider (pluggable raw memory; `Global` by default)
//! ```
//!
//! The map only ever moves [`BlockHandle`]s. Element data never moves when
//! the map grows, so element addresses are stable across map regrowth.
//!
//! # Safety
//!
//! This crate denies `unsafe` everywhere except `raw.rs`, which holds
//! every raw pointer operation, and the modules that call into it
//! (`store.rs`, `map.rs`) or implement the `MemoryProvider` contract.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_code)]

pub mod handle;
pub mod map;
pub mod provider;
mod raw;
pub mod store;

pub use handle::BlockHandle;
pub use map::{BlockMap, Claim};
pub use provider::{Global, MemoryProvider};
pub use store::BlockStore;
