//! Error types for the ordset workspace
//!
//! The set engines themselves are infallible on legal input and report
//! presence/absence through `bool` returns; errors here surface harness
//! misconfiguration.

use thiserror::Error;

/// The main error type for ordset operations
#[derive(Error, Debug)]
pub enum Error {
    /// A workload configuration field is invalid
    #[error("invalid workload: {0}")]
    InvalidWorkload(String),

    /// A key range is empty or reversed
    #[error("invalid key range: {lo}..={hi}")]
    InvalidRange {
        /// Lower bound of the rejected range
        lo: i64,
        /// Upper bound of the rejected range
        hi: i64,
    },
}

/// A specialized Result type for ordset operations
pub type Result<T> = std::result::Result<T, Error>;
