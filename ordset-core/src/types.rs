//! Core types used throughout the ordset workspace

use serde::{Deserialize, Serialize};

/// A key held by a set engine. The full `i64` domain is legal; the
/// engines reserve no sentinel values.
pub type Key = i64;

/// The value attached to a tree leaf. The linked set stores bare keys.
pub type Value = i64;

/// The integer type aggregates and conservation tallies are carried in.
pub type SumValue = i64;

/// The kind of mutation a workload step performs on a set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OpKind {
    /// Insert a key (and, for the trees, its value)
    Insert,
    /// Remove a key
    Remove,
}
