//! Fine-grained-locked external binary search tree
//!
//! Insert locks the leaf's parent; remove locks grandparent then parent
//! and swings the grandparent's slot to the surviving sibling. Every
//! lock acquisition is followed by revalidation: the locked node must not
//! be `removed` and the child slot must still hold what the lock-free
//! walk saw. Traversals hold an epoch guard, so detached nodes can be
//! retired immediately after the splice.

use crossbeam::epoch::{self, Atomic, Guard, Owned, Shared};
use ordset_core::{Key, SumValue, Value};
use std::ptr;
use std::sync::atomic::Ordering;

use super::node::{Internal, Leaf, Node, NodeKind, Pivot};

fn internal_of<'g>(node: Shared<'g, Node>) -> &'g Internal {
    match &unsafe { node.deref() }.kind {
        NodeKind::Internal(int) => int,
        NodeKind::Leaf(_) => unreachable!("walks stop at leaves"),
    }
}

fn leaf_of<'g>(node: Shared<'g, Node>) -> Option<&'g Leaf> {
    unsafe { node.as_ref() }.and_then(|n| match &n.kind {
        NodeKind::Leaf(leaf) => Some(leaf),
        NodeKind::Internal(_) => None,
    })
}

/// Position returned by the locate walk: `p.children[p_dir]` held `leaf`
/// at the moment of the last load, and `gp.children[gp_dir]` held `p`.
/// `gp` is null while the tree holds at most one element, and `leaf` is
/// null only in the empty tree.
struct Position<'g> {
    gp: Shared<'g, Node>,
    gp_dir: usize,
    p: Shared<'g, Node>,
    p_dir: usize,
    leaf: Shared<'g, Node>,
}

/// A concurrent set of integer keys with per-key values, stored as an
/// external BST under a pivotless root.
pub struct LeafTree {
    root: Atomic<Node>,
}

impl LeafTree {
    /// Creates an empty tree.
    pub fn new() -> Self {
        LeafTree {
            root: Atomic::new(Node::internal(
                Pivot::Unbounded,
                [Atomic::null(), Atomic::null()],
            )),
        }
    }

    fn locate<'g>(&self, key: Key, guard: &'g Guard) -> Position<'g> {
        let mut gp = Shared::null();
        let mut gp_dir = 0;
        let mut p = self.root.load(Ordering::Acquire, guard);
        let mut p_dir = 0;
        let mut cur = internal_of(p).children[p_dir].load(Ordering::Acquire, guard);

        while let Some(node) = unsafe { cur.as_ref() } {
            let int = match &node.kind {
                NodeKind::Internal(int) => int,
                NodeKind::Leaf(_) => break,
            };
            gp = p;
            gp_dir = p_dir;
            p = cur;
            p_dir = int.pivot.dir(key);
            cur = int.children[p_dir].load(Ordering::Acquire, guard);
        }

        Position {
            gp,
            gp_dir,
            p,
            p_dir,
            leaf: cur,
        }
    }

    /// Inserts `key` with `value`. Returns `true` if the key was absent.
    ///
    /// Linearizes at the store that publishes the new leaf (or its new
    /// parent internal) into the locked slot.
    pub fn insert(&self, key: Key, value: Value) -> bool {
        let guard = &epoch::pin();
        loop {
            let pos = self.locate(key, guard);
            if let Some(leaf) = leaf_of(pos.leaf) {
                if leaf.key == key {
                    return false;
                }
            }

            let parent = internal_of(pos.p);
            let _parent_lock = parent.lock.lock();
            let parent_gone = unsafe { pos.p.deref() }.removed.load(Ordering::Acquire);
            if parent_gone
                || parent.children[pos.p_dir].load(Ordering::Acquire, guard) != pos.leaf
            {
                continue;
            }

            match leaf_of(pos.leaf) {
                None => {
                    // Empty tree: the root's slot takes the first leaf
                    // directly.
                    parent.children[pos.p_dir]
                        .store(Owned::new(Node::leaf(key, value)), Ordering::Release);
                }
                Some(leaf) => {
                    let new_leaf = Owned::new(Node::leaf(key, value)).into_shared(guard);
                    let replacement = if leaf.key < key {
                        Node::internal(
                            Pivot::Key(key),
                            [Atomic::from(pos.leaf), Atomic::from(new_leaf)],
                        )
                    } else {
                        Node::internal(
                            Pivot::Key(leaf.key),
                            [Atomic::from(new_leaf), Atomic::from(pos.leaf)],
                        )
                    };
                    parent.children[pos.p_dir]
                        .store(Owned::new(replacement), Ordering::Release);
                }
            }
            return true;
        }
    }

    /// Removes `key`. Returns `true` if a live leaf held it.
    ///
    /// Linearizes at the store that swings the grandparent's slot to the
    /// sibling (or empties the root's slot).
    pub fn remove(&self, key: Key) -> bool {
        let guard = &epoch::pin();
        let mut target: *const Node = ptr::null();

        loop {
            let pos = self.locate(key, guard);
            match leaf_of(pos.leaf) {
                Some(leaf) if leaf.key == key => {}
                _ => return false,
            }
            // A different leaf under the same key means the one this call
            // first aimed at was removed and the key re-inserted; that
            // delete already happened.
            if !target.is_null() && target != pos.leaf.as_raw() {
                return false;
            }
            target = pos.leaf.as_raw();

            if pos.gp.is_null() {
                // Singleton: the leaf hangs directly off the root, which is
                // never removed itself.
                let root = internal_of(pos.p);
                let _root_lock = root.lock.lock();
                if root.children[pos.p_dir].load(Ordering::Acquire, guard) != pos.leaf {
                    continue;
                }
                unsafe { pos.leaf.deref() }
                    .removed
                    .store(true, Ordering::Release);
                root.children[pos.p_dir].store(Shared::<Node>::null(), Ordering::Release);
                unsafe { guard.defer_destroy(pos.leaf) };
                return true;
            }

            let grandparent = internal_of(pos.gp);
            let parent = internal_of(pos.p);
            let _gp_lock = grandparent.lock.lock();
            let _p_lock = parent.lock.lock();

            let gp_gone = unsafe { pos.gp.deref() }.removed.load(Ordering::Acquire);
            if gp_gone
                || grandparent.children[pos.gp_dir].load(Ordering::Acquire, guard) != pos.p
            {
                continue;
            }
            let sibling = parent.children[1 - pos.p_dir].load(Ordering::Acquire, guard);
            if parent.children[pos.p_dir].load(Ordering::Acquire, guard) != pos.leaf {
                continue;
            }

            unsafe { pos.p.deref() }.removed.store(true, Ordering::Release);
            unsafe { pos.leaf.deref() }
                .removed
                .store(true, Ordering::Release);
            grandparent.children[pos.gp_dir].store(sibling, Ordering::Release);
            unsafe {
                guard.defer_destroy(pos.p);
                guard.defer_destroy(pos.leaf);
            }
            return true;
        }
    }

    /// Returns `true` iff a live leaf holds `key`.
    ///
    /// Linearizes at the last child load of the walk.
    pub fn contains(&self, key: Key) -> bool {
        let guard = &epoch::pin();
        let root = internal_of(self.root.load(Ordering::Acquire, guard));
        let mut cur = root.children[0].load(Ordering::Acquire, guard);

        loop {
            let node = match unsafe { cur.as_ref() } {
                Some(node) => node,
                None => return false,
            };
            match &node.kind {
                NodeKind::Leaf(leaf) => {
                    return leaf.key == key && !node.removed.load(Ordering::Acquire);
                }
                NodeKind::Internal(int) => {
                    cur = int.children[int.pivot.dir(key)].load(Ordering::Acquire, guard);
                }
            }
        }
    }

    /// Looks up the value stored under `key`.
    pub fn get(&self, key: Key) -> Option<Value> {
        let guard = &epoch::pin();
        let root = internal_of(self.root.load(Ordering::Acquire, guard));
        let mut cur = root.children[0].load(Ordering::Acquire, guard);

        loop {
            let node = unsafe { cur.as_ref() }?;
            match &node.kind {
                NodeKind::Leaf(leaf) => {
                    return (leaf.key == key && !node.removed.load(Ordering::Acquire))
                        .then_some(leaf.value);
                }
                NodeKind::Internal(int) => {
                    cur = int.children[int.pivot.dir(key)].load(Ordering::Acquire, guard);
                }
            }
        }
    }

    /// Number of leaves. Sequential helper: only meaningful while no other
    /// thread is operating on the tree.
    pub fn len(&self) -> usize {
        let guard = &epoch::pin();
        let mut count = 0;
        self.walk_leaves(guard, |_| count += 1);
        count
    }

    /// Returns `true` if the tree holds no leaves. Sequential helper.
    pub fn is_empty(&self) -> bool {
        let guard = &epoch::pin();
        internal_of(self.root.load(Ordering::Acquire, guard)).children[0]
            .load(Ordering::Acquire, guard)
            .is_null()
    }

    /// Sum of all leaf values. Sequential helper, like [`len`](Self::len).
    pub fn value_sum(&self) -> SumValue {
        let guard = &epoch::pin();
        let mut sum = 0;
        self.walk_leaves(guard, |leaf| sum += leaf.value);
        sum
    }

    fn walk_leaves<F: FnMut(&Leaf)>(&self, guard: &Guard, mut visit: F) {
        let root = internal_of(self.root.load(Ordering::Acquire, guard));
        let mut stack = vec![root.children[0].load(Ordering::Acquire, guard)];
        while let Some(cur) = stack.pop() {
            match unsafe { cur.as_ref() } {
                None => {}
                Some(node) => match &node.kind {
                    NodeKind::Leaf(leaf) => visit(leaf),
                    NodeKind::Internal(int) => {
                        stack.push(int.children[0].load(Ordering::Acquire, guard));
                        stack.push(int.children[1].load(Ordering::Acquire, guard));
                    }
                },
            }
        }
    }
}

impl Default for LeafTree {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for LeafTree {
    fn drop(&mut self) {
        unsafe {
            let guard = epoch::unprotected();
            let mut stack = vec![self.root.load(Ordering::Relaxed, guard)];
            while let Some(cur) = stack.pop() {
                if cur.is_null() {
                    continue;
                }
                if let NodeKind::Internal(int) = &cur.deref().kind {
                    stack.push(int.children[0].load(Ordering::Relaxed, guard));
                    stack.push(int.children[1].load(Ordering::Relaxed, guard));
                }
                drop(cur.into_owned());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn grow_and_shrink() {
        let tree = LeafTree::new();

        assert!(tree.insert(10, 100));
        assert!(tree.insert(5, 50));
        assert!(tree.insert(20, 200));
        assert!(!tree.insert(10, 999));

        assert!(tree.contains(5));
        assert!(tree.contains(10));
        assert!(tree.contains(20));
        assert!(!tree.contains(15));
        assert_eq!(tree.get(20), Some(200));
        assert_eq!(tree.get(15), None);

        assert!(tree.remove(10));
        assert!(!tree.remove(10));
        assert!(!tree.contains(10));
        assert_eq!(tree.len(), 2);
        assert_eq!(tree.value_sum(), 250);
    }

    #[test]
    fn empty_and_singleton_edges() {
        let tree = LeafTree::new();
        assert!(tree.is_empty());
        assert!(!tree.contains(1));
        assert!(!tree.remove(1));

        assert!(tree.insert(1, 10));
        assert_eq!(tree.len(), 1);
        assert!(tree.remove(1));
        assert!(tree.is_empty());

        // The tree is usable again after draining to empty.
        assert!(tree.insert(2, 20));
        assert!(tree.contains(2));
        assert_eq!(tree.value_sum(), 20);
    }

    #[test]
    fn max_key_is_legal() {
        let tree = LeafTree::new();
        assert!(tree.insert(i64::MAX, 1));
        assert!(tree.insert(i64::MIN, 2));
        assert!(tree.contains(i64::MAX));
        assert!(tree.contains(i64::MIN));
        assert!(tree.remove(i64::MAX));
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn descending_and_ascending_runs() {
        let tree = LeafTree::new();
        for k in (0..100).rev() {
            assert!(tree.insert(k, k * 2));
        }
        for k in 100..200 {
            assert!(tree.insert(k, k * 2));
        }
        assert_eq!(tree.len(), 200);
        for k in 0..200 {
            assert!(tree.contains(k));
            assert!(tree.remove(k));
        }
        assert!(tree.is_empty());
    }

    #[test]
    fn concurrent_disjoint_inserts_and_removes() {
        const THREADS: i64 = 8;
        const PER_THREAD: i64 = 2_000;

        let tree = Arc::new(LeafTree::new());
        let mut handles = Vec::new();
        for t in 0..THREADS {
            let tree = Arc::clone(&tree);
            handles.push(thread::spawn(move || {
                for i in 0..PER_THREAD {
                    let k = i * THREADS + t;
                    assert!(tree.insert(k, k));
                }
                for i in 0..PER_THREAD / 2 {
                    let k = i * THREADS + t;
                    assert!(tree.remove(k));
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(tree.len(), (THREADS * PER_THREAD / 2) as usize);
    }

    #[test]
    fn concurrent_contention_on_small_key_space() {
        let tree = Arc::new(LeafTree::new());
        let mut handles = Vec::new();
        for t in 0..4 {
            let tree = Arc::clone(&tree);
            handles.push(thread::spawn(move || {
                let mut net = 0i64;
                for i in 0..2_000 {
                    let k = (i * 7 + t) % 16;
                    if tree.insert(k, k) {
                        net += 1;
                    }
                    if tree.remove((i * 5 + t) % 16) {
                        net -= 1;
                    }
                }
                net
            }));
        }
        let net: i64 = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(tree.len() as i64, net);
    }
}
