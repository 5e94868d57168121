//! Engine facade the stress drivers operate through

use ordset_core::{Key, SumValue};
use ordset_engines::{HarrisList, LeafTree, RangeSumTree};

/// A concurrent set of integer keys.
///
/// The tree-backed implementations store the key as its own value, so one
/// conservation tally works for every engine: the sum of present keys.
pub trait ConcurrentSet: Sync {
    fn insert(&self, key: Key) -> bool;
    fn remove(&self, key: Key) -> bool;
    fn contains(&self, key: Key) -> bool;

    /// Sequential element-count walk; only valid once every worker has
    /// joined.
    fn quiescent_len(&self) -> usize;

    /// Sequential walk over the tracked quantity (keys for the list,
    /// values for the trees); only valid once every worker has joined.
    fn quiescent_sum(&self) -> SumValue;
}

impl ConcurrentSet for HarrisList {
    fn insert(&self, key: Key) -> bool {
        HarrisList::insert(self, key)
    }

    fn remove(&self, key: Key) -> bool {
        HarrisList::remove(self, key)
    }

    fn contains(&self, key: Key) -> bool {
        HarrisList::contains(self, key)
    }

    fn quiescent_len(&self) -> usize {
        self.len()
    }

    fn quiescent_sum(&self) -> SumValue {
        self.key_sum()
    }
}

impl ConcurrentSet for LeafTree {
    fn insert(&self, key: Key) -> bool {
        LeafTree::insert(self, key, key)
    }

    fn remove(&self, key: Key) -> bool {
        LeafTree::remove(self, key)
    }

    fn contains(&self, key: Key) -> bool {
        LeafTree::contains(self, key)
    }

    fn quiescent_len(&self) -> usize {
        self.len()
    }

    fn quiescent_sum(&self) -> SumValue {
        self.value_sum()
    }
}

impl ConcurrentSet for RangeSumTree {
    fn insert(&self, key: Key) -> bool {
        RangeSumTree::insert(self, key, key)
    }

    fn remove(&self, key: Key) -> bool {
        RangeSumTree::remove(self, key)
    }

    fn contains(&self, key: Key) -> bool {
        RangeSumTree::contains(self, key)
    }

    fn quiescent_len(&self) -> usize {
        self.len()
    }

    fn quiescent_sum(&self) -> SumValue {
        self.value_sum()
    }
}
