//! Error types for mvccdb
//!
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.
//! The staging engine itself has a single failure, `StagingKeyConflict`; the
//! remaining variants belong to configuration loading.

use crate::types::{StagingKey, TxnId};
use std::io;
use thiserror::Error;

/// Result type alias for mvccdb operations
pub type Result<T> = std::result::Result<T, Error>;

/// One key that failed merge validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyConflict {
    /// The conflicting key
    pub key: StagingKey,
    /// Baseline version the committing transaction observed
    pub baseline: u64,
    /// Current Final Store version (`None` if the key has no Final Store entry)
    pub current: Option<u64>,
    /// Owner of the current Final Store revision
    pub holder: Option<TxnId>,
}

/// Error types for mvccdb
#[derive(Debug, Error)]
pub enum Error {
    /// A written key's baseline no longer matches the Final Store
    ///
    /// Every conflicting key of the transaction is listed, not just the first.
    #[error("staging table key conflict for {tid} on {} key(s)", conflicts.len())]
    StagingKeyConflict {
        /// Transaction whose merge was rejected
        tid: TxnId,
        /// All conflicting keys
        conflicts: Vec<KeyConflict>,
    },

    /// Configuration could not be parsed or is invalid
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// I/O error while reading or writing configuration
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),
}

impl Error {
    /// Check if this is a staging key conflict
    pub fn is_conflict(&self) -> bool {
        matches!(self, Error::StagingKeyConflict { .. })
    }

    /// Conflicting keys, empty for non-conflict errors
    pub fn conflicts(&self) -> &[KeyConflict] {
        match self {
            Error::StagingKeyConflict { conflicts, .. } => conflicts,
            _ => &[],
        }
    }
}
