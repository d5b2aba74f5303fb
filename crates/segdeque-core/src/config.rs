//! Container configuration parameters.

use crate::error::DequeError;

/// Configuration for a segmented deque.
///
/// Controls block sizing and the minimum size of the block map.
/// Validated at construction; immutable for the container's lifetime.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DequeConfig {
    /// Target size of one storage block in bytes.
    ///
    /// Default: 512. The number of elements per block is
    /// `max(1, block_bytes / size_of::<T>())`, so a block holds at least
    /// one element no matter how large `T` is.
    pub block_bytes: usize,

    /// Minimum number of slots in the block map.
    ///
    /// Default: 8. Must be at least 3 so a freshly created map has one
    /// in-use node with slack on both sides.
    pub min_map_size: usize,
}

impl DequeConfig {
    /// Default block size in bytes.
    pub const DEFAULT_BLOCK_BYTES: usize = 512;

    /// Default minimum map size.
    pub const DEFAULT_MIN_MAP_SIZE: usize = 8;

    /// Create a config with default values.
    pub const fn new() -> Self {
        Self {
            block_bytes: Self::DEFAULT_BLOCK_BYTES,
            min_map_size: Self::DEFAULT_MIN_MAP_SIZE,
        }
    }

    /// Set the block size in bytes.
    pub const fn block_bytes(mut self, bytes: usize) -> Self {
        self.block_bytes = bytes;
        self
    }

    /// Set the minimum map size.
    pub const fn min_map_size(mut self, slots: usize) -> Self {
        self.min_map_size = slots;
        self
    }

    /// Check structural invariants.
    ///
    /// # Errors
    ///
    /// Returns [`DequeError::InvalidConfig`] if `block_bytes` is zero or
    /// `min_map_size` is below 3.
    pub fn validate(&self) -> Result<(), DequeError> {
        if self.block_bytes == 0 {
            return Err(DequeError::InvalidConfig {
                reason: "block_bytes must be at least 1".into(),
            });
        }
        if self.min_map_size < 3 {
            return Err(DequeError::InvalidConfig {
                reason: format!("min_map_size must be at least 3, got {}", self.min_map_size),
            });
        }
        Ok(())
    }

    /// Number of `T` elements that fit in one block.
    ///
    /// Zero-sized types get `block_bytes` slots per block.
    pub fn block_len<T>(&self) -> usize {
        match std::mem::size_of::<T>() {
            0 => self.block_bytes.max(1),
            size => (self.block_bytes / size).max(1),
        }
    }
}

impl Default for DequeConfig {
    fn default() -> Self {
        Self::new()
    }
}
