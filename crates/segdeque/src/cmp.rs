//! Comparison, hashing, formatting, and the free `swap`.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use segdeque_arena::MemoryProvider;

use crate::deque::SegDeque;

impl<T: PartialEq, P: MemoryProvider, Q: MemoryProvider> PartialEq<SegDeque<T, Q>>
    for SegDeque<T, P>
{
    fn eq(&self, other: &SegDeque<T, Q>) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}

impl<T: Eq, P: MemoryProvider> Eq for SegDeque<T, P> {}

impl<T: PartialOrd, P: MemoryProvider> PartialOrd for SegDeque<T, P> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.iter().partial_cmp(other.iter())
    }
}

impl<T: Ord, P: MemoryProvider> Ord for SegDeque<T, P> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.iter().cmp(other.iter())
    }
}

impl<T: Hash, P: MemoryProvider> Hash for SegDeque<T, P> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_usize(self.len());
        for item in self {
            item.hash(state);
        }
    }
}

impl<T: fmt::Debug, P: MemoryProvider> fmt::Debug for SegDeque<T, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

/// Exchange the contents of two deques in O(1).
pub fn swap<T, P: MemoryProvider>(a: &mut SegDeque<T, P>, b: &mut SegDeque<T, P>) {
    a.swap(b);
}
