//! Node variants for the leaf-oriented trees

use crossbeam::epoch::Atomic;
use ordset_core::{Key, Value};
use parking_lot::Mutex;
use std::sync::atomic::AtomicBool;

/// Routing bound of an internal node.
///
/// The root carries `Unbounded`, so every user key routes into its single
/// populated child slot and `i64::MAX` stays a legal key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Pivot {
    Key(Key),
    Unbounded,
}

impl Pivot {
    /// Child slot for `key`: slot 0 holds keys below the pivot, slot 1 the
    /// rest.
    pub(crate) fn dir(self, key: Key) -> usize {
        match self {
            Pivot::Key(pivot) if key < pivot => 0,
            Pivot::Key(_) => 1,
            Pivot::Unbounded => 0,
        }
    }
}

/// A tree node: a routing internal or a key-carrying leaf, plus the
/// one-way `removed` latch shared by both variants.
pub(crate) struct Node {
    /// Latched under the structural lock just before the node is unlinked
    /// from its parent; never cleared.
    pub(crate) removed: AtomicBool,
    pub(crate) kind: NodeKind,
}

pub(crate) enum NodeKind {
    Leaf(Leaf),
    Internal(Internal),
}

pub(crate) struct Leaf {
    pub(crate) key: Key,
    pub(crate) value: Value,
}

pub(crate) struct Internal {
    pub(crate) pivot: Pivot,
    /// Serializes structural edits of the child slots.
    pub(crate) lock: Mutex<()>,
    pub(crate) children: [Atomic<Node>; 2],
}

impl Node {
    pub(crate) fn leaf(key: Key, value: Value) -> Self {
        Node {
            removed: AtomicBool::new(false),
            kind: NodeKind::Leaf(Leaf { key, value }),
        }
    }

    pub(crate) fn internal(pivot: Pivot, children: [Atomic<Node>; 2]) -> Self {
        Node {
            removed: AtomicBool::new(false),
            kind: NodeKind::Internal(Internal {
                pivot,
                lock: Mutex::new(()),
                children,
            }),
        }
    }
}
