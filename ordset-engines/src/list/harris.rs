//! Lock-free sorted linked set with two-phase deletion
//!
//! Traversals walk from the head sentinel and physically excise any
//! marked (logically deleted) nodes they pass. `remove` first marks the
//! victim's outgoing edge, which is the operation's linearization point,
//! and then attempts the unlink itself; if that compare-exchange loses a
//! race, a later traversal finishes the job.
//!
//! Nodes excised from the chain are deliberately not reclaimed while the
//! list is alive: a racing traversal may still hold a reference to them,
//! and excisions of overlapping chains may complete on more than one
//! thread. `Drop` frees whatever is still reachable from the head.

use crossbeam::epoch::{self, Atomic, Guard, Owned, Shared};
use ordset_core::{Key, SumValue};
use std::sync::atomic::Ordering;

use super::link::Link;

struct Node {
    /// Immutable after publication. Never read on the sentinels.
    key: Key,
    next: Link<Node>,
}

impl Node {
    fn new(key: Key) -> Self {
        Node {
            key,
            next: Link::null(),
        }
    }
}

/// A lock-free sorted set of integer keys.
///
/// The chain runs from a head sentinel to a tail sentinel; both live for
/// the lifetime of the set and are never returned as matches. Between
/// them, the keys of unmarked nodes are strictly increasing.
pub struct HarrisList {
    head: Atomic<Node>,
    tail: Atomic<Node>,
}

impl HarrisList {
    /// Creates an empty set.
    pub fn new() -> Self {
        let guard = &epoch::pin();
        let tail = Atomic::new(Node::new(Key::default()));
        let tail_ref = tail.load(Ordering::Relaxed, guard);
        let head = Atomic::new(Node {
            key: Key::default(),
            next: Link::to(tail_ref),
        });
        HarrisList { head, tail }
    }

    /// Finds the boundary pair for `key`: `right` is the tail or the first
    /// unmarked node with `key` at or above the argument, and `left` is the
    /// unmarked node whose link held `right` at the moment of return. Any
    /// marked nodes found between them have been excised along the way.
    fn search<'g>(
        &self,
        key: Key,
        guard: &'g Guard,
    ) -> (Shared<'g, Node>, Shared<'g, Node>) {
        let head = self.head.load(Ordering::Acquire, guard);
        let tail = self.tail.load(Ordering::Acquire, guard);

        loop {
            let mut t = head;
            let (mut t_next, mut t_marked) = unsafe { t.deref() }.next.load(guard);
            let mut left = t;
            let mut left_next = t_next;

            // Walk to the right boundary, remembering the last node whose
            // outgoing edge was unmarked when we looked at it.
            loop {
                if !t_marked {
                    left = t;
                    left_next = t_next;
                }
                t = t_next;
                if t == tail {
                    break;
                }
                let (next, marked) = unsafe { t.deref() }.next.load(guard);
                let keep_walking = marked || unsafe { t.deref() }.key < key;
                t_next = next;
                t_marked = marked;
                if !keep_walking {
                    break;
                }
            }
            let right = t;

            if left_next == right {
                // Already adjacent; a freshly marked right would make the
                // pair stale, so check once more before handing it out.
                if right != tail && unsafe { right.deref() }.next.load(guard).1 {
                    continue;
                }
                return (left, right);
            }

            // Excise the marked run between left and right in one swing.
            let excised = unsafe { left.deref() }.next.compare_and_set(
                (left_next, false),
                (right, false),
                guard,
            );
            if excised {
                if right != tail && unsafe { right.deref() }.next.load(guard).1 {
                    continue;
                }
                return (left, right);
            }
        }
    }

    /// Inserts `key`. Returns `true` if it was absent and is now present.
    ///
    /// Linearizes at the compare-exchange that publishes the new node.
    pub fn insert(&self, key: Key) -> bool {
        let guard = &epoch::pin();
        let tail = self.tail.load(Ordering::Acquire, guard);
        let mut node = Owned::new(Node::new(key));

        loop {
            let (left, right) = self.search(key, guard);
            if right != tail && unsafe { right.deref() }.key == key {
                return false;
            }

            node.next.store(right, false);
            match unsafe { left.deref() }
                .next
                .compare_and_set_owned((right, false), node, guard)
            {
                Ok(()) => return true,
                Err(lost) => node = lost,
            }
        }
    }

    /// Removes `key`. Returns `true` if it was present and is now absent.
    ///
    /// Linearizes at the compare-exchange that sets the mark on the
    /// victim's outgoing edge; the unlink afterwards is best-effort.
    pub fn remove(&self, key: Key) -> bool {
        let guard = &epoch::pin();
        let tail = self.tail.load(Ordering::Acquire, guard);

        let (left, right, succ) = loop {
            let (left, right) = self.search(key, guard);
            if right == tail || unsafe { right.deref() }.key != key {
                return false;
            }

            let (succ, marked) = unsafe { right.deref() }.next.load(guard);
            if marked {
                // Another remover beat us to this node; look again.
                continue;
            }
            let logically_deleted = unsafe { right.deref() }.next.compare_and_set(
                (succ, false),
                (succ, true),
                guard,
            );
            if logically_deleted {
                break (left, right, succ);
            }
        };

        let unlinked = unsafe { left.deref() }.next.compare_and_set(
            (right, false),
            (succ, false),
            guard,
        );
        if !unlinked {
            // Hand the physical unlink to the next traversal.
            let _ = self.search(key, guard);
        }
        true
    }

    /// Returns `true` iff `key` is present.
    pub fn contains(&self, key: Key) -> bool {
        let guard = &epoch::pin();
        let tail = self.tail.load(Ordering::Acquire, guard);
        let (_, right) = self.search(key, guard);
        right != tail && unsafe { right.deref() }.key == key
    }

    /// Counts the elements by walking the chain.
    ///
    /// Sequential helper: the count is only meaningful while no other
    /// thread is operating on the set.
    pub fn len(&self) -> usize {
        let guard = &epoch::pin();
        let tail = self.tail.load(Ordering::Acquire, guard);
        let head = self.head.load(Ordering::Acquire, guard);

        let mut count = 0;
        let mut cur = unsafe { head.deref() }.next.load(guard).0;
        while cur != tail {
            count += 1;
            cur = unsafe { cur.deref() }.next.load(guard).0;
        }
        count
    }

    /// Returns `true` if the set holds no elements. Sequential helper,
    /// like [`len`](Self::len).
    pub fn is_empty(&self) -> bool {
        let guard = &epoch::pin();
        let tail = self.tail.load(Ordering::Acquire, guard);
        let head = self.head.load(Ordering::Acquire, guard);
        unsafe { head.deref() }.next.load(guard).0 == tail
    }

    /// Sums the keys by walking the chain. Sequential helper, like
    /// [`len`](Self::len).
    pub fn key_sum(&self) -> SumValue {
        let guard = &epoch::pin();
        let tail = self.tail.load(Ordering::Acquire, guard);
        let head = self.head.load(Ordering::Acquire, guard);

        let mut sum = 0;
        let mut cur = unsafe { head.deref() }.next.load(guard).0;
        while cur != tail {
            sum += unsafe { cur.deref() }.key;
            cur = unsafe { cur.deref() }.next.load(guard).0;
        }
        sum
    }
}

impl Default for HarrisList {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for HarrisList {
    fn drop(&mut self) {
        // Frees the sentinels and every node still linked between them.
        // Nodes already excised by `search` are leaked by design.
        unsafe {
            let guard = epoch::unprotected();
            let mut cur = self.head.load(Ordering::Relaxed, guard);
            while !cur.is_null() {
                let next = cur.deref().next.load(guard).0;
                drop(cur.into_owned());
                cur = next;
            }
        }
    }
}
