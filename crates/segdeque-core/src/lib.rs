//! Core types for the segdeque workspace.
//!
//! This is the leaf crate with zero internal dependencies. It defines the
//! pieces every other layer shares: the error enum, the validated
//! container configuration, and the block/map statistics counters.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod stats;

pub use config::DequeConfig;
pub use error::DequeError;
pub use stats::MapStats;
