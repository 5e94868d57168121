//! Marked-pointer link cell
//!
//! A single-word atomic holding a successor pointer together with a
//! "logically deleted" mark. The mark is the low tag bit of the pointer;
//! callers never see the encoding, only `(pointer, mark)` pairs.

use crossbeam::epoch::{Atomic, Guard, Owned, Shared};
use std::sync::atomic::Ordering;

/// Tag bit carrying the logical-deletion mark.
const MARK: usize = 1;

fn tag_of(marked: bool) -> usize {
    if marked {
        MARK
    } else {
        0
    }
}

/// An atomic successor link whose low bit marks the owning node as
/// logically deleted.
pub(super) struct Link<T> {
    cell: Atomic<T>,
}

impl<T> Link<T> {
    /// A link with no successor (the tail sentinel's outgoing edge).
    pub(super) fn null() -> Self {
        Link {
            cell: Atomic::null(),
        }
    }

    /// An unmarked link to `succ`.
    pub(super) fn to(succ: Shared<'_, T>) -> Self {
        Link {
            cell: Atomic::from(succ),
        }
    }

    /// Loads the successor and the mark as one atomic read.
    pub(super) fn load<'g>(&self, guard: &'g Guard) -> (Shared<'g, T>, bool) {
        let raw = self.cell.load(Ordering::Acquire, guard);
        (raw.with_tag(0), raw.tag() == MARK)
    }

    /// Unconditionally points this link at `succ`. Only sound while the
    /// owning node is unpublished.
    pub(super) fn store(&self, succ: Shared<'_, T>, marked: bool) {
        self.cell.store(succ.with_tag(tag_of(marked)), Ordering::Release);
    }

    /// Full-word compare-exchange: succeeds only when both the pointer and
    /// the mark match `expected`, and installs both halves of `new`.
    pub(super) fn compare_and_set(
        &self,
        expected: (Shared<'_, T>, bool),
        new: (Shared<'_, T>, bool),
        guard: &Guard,
    ) -> bool {
        self.cell
            .compare_exchange(
                expected.0.with_tag(tag_of(expected.1)),
                new.0.with_tag(tag_of(new.1)),
                Ordering::AcqRel,
                Ordering::Acquire,
                guard,
            )
            .is_ok()
    }

    /// The publishing compare-exchange: installs a freshly allocated,
    /// unmarked node. On failure the allocation is handed back so the
    /// caller can retry without reallocating.
    pub(super) fn compare_and_set_owned(
        &self,
        expected: (Shared<'_, T>, bool),
        new: Owned<T>,
        guard: &Guard,
    ) -> Result<(), Owned<T>> {
        self.cell
            .compare_exchange(
                expected.0.with_tag(tag_of(expected.1)),
                new,
                Ordering::AcqRel,
                Ordering::Acquire,
                guard,
            )
            .map(|_| ())
            .map_err(|e| e.new)
    }
}
