//! Core types for mvccdb
//!
//! This crate defines the foundational types shared by the staging engine:
//! - TxnId: Identifier of one speculative execution context
//! - TxnScope: A transaction, or the Final Store itself (the reserved sentinel)
//! - StagingKey: Canonical collection key derived from raw key bytes
//! - VersionedValue: One key's value, write intent, and version stamp
//! - Error: Error type hierarchy

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod types;
pub mod value;

pub use error::{Error, KeyConflict, Result};
pub use types::{StagingKey, TxnId, TxnScope};
pub use value::VersionedValue;
