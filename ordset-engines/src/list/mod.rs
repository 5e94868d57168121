//! Lock-free sorted linked set
//!
//! A singly-linked sorted list with head/tail sentinels. Deletion is
//! two-phase: a node is first marked on its outgoing edge (logical
//! delete), then unlinked by whichever traversal reaches it next
//! (physical delete). The marked-pointer cell lives in [`link`]; the
//! set algorithm lives in [`harris`].

mod harris;
mod link;

pub use harris::HarrisList;
