//! Identifier and key types
//!
//! - TxnId: Opaque token identifying one speculative execution context
//! - TxnScope: Where a staging operation is directed
//! - StagingKey: Collection key used by every staging map

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of one speculative execution context
///
/// Every staging call site uses this single type. Equality and hashing are
/// all the engine needs; the numeric payload is assigned by the caller
/// (typically the scheduler that owns the transaction batch).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TxnId(u64);

impl TxnId {
    /// Create a TxnId from its raw value
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the raw value of this TxnId
    pub const fn as_u64(&self) -> u64 {
        self.0
    }
}

impl From<u64> for TxnId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for TxnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "txn:{}", self.0)
    }
}

/// Target of a staging operation
///
/// `Final` is the reserved "no transaction" sentinel: operations addressed to
/// it bypass staging and act on the Final Store directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TxnScope {
    /// Operate directly on the Final Store
    Final,
    /// Operate on the private view of one transaction
    Txn(TxnId),
}

impl TxnScope {
    /// The transaction this scope addresses, if any
    pub fn txn_id(&self) -> Option<TxnId> {
        match self {
            TxnScope::Final => None,
            TxnScope::Txn(tid) => Some(*tid),
        }
    }

    /// Check if this is the Final Store sentinel
    pub fn is_final(&self) -> bool {
        matches!(self, TxnScope::Final)
    }
}

impl From<TxnId> for TxnScope {
    fn from(tid: TxnId) -> Self {
        TxnScope::Txn(tid)
    }
}

impl From<Option<TxnId>> for TxnScope {
    fn from(tid: Option<TxnId>) -> Self {
        tid.map_or(TxnScope::Final, TxnScope::Txn)
    }
}

impl fmt::Display for TxnScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TxnScope::Final => write!(f, "final"),
            TxnScope::Txn(tid) => write!(f, "{}", tid),
        }
    }
}

/// Collection key used by the Final Store and every transaction view
///
/// Encoding from raw key bytes is the identity over the bytes, which makes it
/// deterministic and injective for the lifetime of a staging table. Display
/// renders lowercase hex for diagnostics.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StagingKey(Vec<u8>);

impl StagingKey {
    /// Encode raw key bytes into a staging key
    pub fn encode(raw: &[u8]) -> Self {
        Self(raw.to_vec())
    }

    /// Raw key bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Consume the key, returning the raw bytes
    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    /// Lowercase hex rendering of the raw bytes
    pub fn to_hex(&self) -> String {
        self.to_string()
    }
}

impl From<&[u8]> for StagingKey {
    fn from(raw: &[u8]) -> Self {
        Self::encode(raw)
    }
}

impl From<Vec<u8>> for StagingKey {
    fn from(raw: Vec<u8>) -> Self {
        Self(raw)
    }
}

impl From<&str> for StagingKey {
    fn from(raw: &str) -> Self {
        Self::encode(raw.as_bytes())
    }
}

impl fmt::Display for StagingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

impl fmt::Debug for StagingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StagingKey({})", self)
    }
}
