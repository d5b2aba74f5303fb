//! Benchmark workloads for the segdeque container.
//!
//! Provides seeded, reproducible operation streams:
//!
//! - [`mixed_workload`]: random pushes and pops at both ends
//! - [`random_indices`]: uniformly distributed lookups
//! - [`apply_to_segdeque`] / [`apply_to_vecdeque`]: replay a stream

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use std::collections::VecDeque;

use rand_chacha::rand_core::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use segdeque::SegDeque;

/// One end operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    /// Append a value.
    PushBack(u64),
    /// Prepend a value.
    PushFront(u64),
    /// Remove from the back.
    PopBack,
    /// Remove from the front.
    PopFront,
}

/// `len` random end operations, biased 60/40 toward pushes so the
/// container keeps growing.
pub fn mixed_workload(seed: u64, len: usize) -> Vec<Step> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..len)
        .map(|_| {
            let roll = rng.next_u32() % 10;
            let value = rng.next_u64();
            match roll {
                0..=2 => Step::PushBack(value),
                3..=5 => Step::PushFront(value),
                6 | 7 => Step::PopBack,
                _ => Step::PopFront,
            }
        })
        .collect()
}

/// `count` indices uniformly drawn from `0..len`.
pub fn random_indices(seed: u64, len: usize, count: usize) -> Vec<usize> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..count)
        .map(|_| (rng.next_u64() % len.max(1) as u64) as usize)
        .collect()
}

/// Replay `steps` on a [`SegDeque`]. Returns the final length.
pub fn apply_to_segdeque(deque: &mut SegDeque<u64>, steps: &[Step]) -> usize {
    for step in steps {
        match *step {
            Step::PushBack(v) => deque.push_back(v).expect("global allocator"),
            Step::PushFront(v) => deque.push_front(v).expect("global allocator"),
            Step::PopBack => {
                deque.pop_back();
            }
            Step::PopFront => {
                deque.pop_front();
            }
        }
    }
    deque.len()
}

/// Replay `steps` on a [`VecDeque`]. Returns the final length.
pub fn apply_to_vecdeque(deque: &mut VecDeque<u64>, steps: &[Step]) -> usize {
    for step in steps {
        match *step {
            Step::PushBack(v) => deque.push_back(v),
            Step::PushFront(v) => deque.push_front(v),
            Step::PopBack => {
                deque.pop_back();
            }
            Step::PopFront => {
                deque.pop_front();
            }
        }
    }
    deque.len()
}
