//! Storage statistics for a segmented deque.
//!
//! [`MapStats`] counts block traffic and map growth events, so tests and
//! benchmarks can observe how often the slow paths run.

/// Cumulative counters for block and map activity.
///
/// The block store bumps the block counters; the block map bumps the
/// recenter/reallocation counters. Counters never reset while the
/// container lives; `clone()` starts a fresh set.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MapStats {
    /// Blocks obtained from the memory provider.
    pub blocks_acquired: u64,
    /// Blocks handed back to the memory provider.
    pub blocks_released: u64,
    /// Boundary crossings satisfied by a cached slack block.
    pub blocks_reused: u64,
    /// Map growths handled by shifting handles inside the existing array.
    pub map_recenters: u64,
    /// Map growths that required a larger array.
    pub map_reallocations: u64,
}

impl MapStats {
    /// Blocks currently held (acquired and not yet released).
    pub fn blocks_live(&self) -> u64 {
        self.blocks_acquired - self.blocks_released
    }
}
