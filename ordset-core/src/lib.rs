//! Core types for the ordset workspace
//!
//! This crate contains the fundamental types shared by the concurrent
//! set engines and the stress harness:
//!
//! - Common error handling with [`Error`] and [`Result`]
//! - Basic data types like [`Key`], [`Value`], and [`OpKind`]
//!
//! # Example
//!
//! ```
//! use ordset_core::{Key, OpKind};
//!
//! let key: Key = 42;
//! let op = OpKind::Insert;
//! assert_ne!(op, OpKind::Remove);
//! ```

pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::*;
