//! Transaction views and write sets
//!
//! A `TransactionView` is one transaction's private overlay: every key the
//! transaction has touched, materialized once from the Final Store and then
//! read or written only by that transaction. Entries are kept in key order so
//! that validation, conflict reports, and dependency lists are deterministic.

use mvccdb_core::{StagingKey, TxnId, VersionedValue};
use std::collections::BTreeMap;

/// Private staged state of one transaction
#[derive(Debug, Clone)]
pub struct TransactionView {
    tid: TxnId,
    entries: BTreeMap<StagingKey, VersionedValue>,
}

impl TransactionView {
    /// Create an empty view for `tid`
    pub fn new(tid: TxnId) -> Self {
        Self {
            tid,
            entries: BTreeMap::new(),
        }
    }

    /// Owning transaction
    pub fn tid(&self) -> TxnId {
        self.tid
    }

    /// Staged entry for `key`
    pub fn get(&self, key: &StagingKey) -> Option<&VersionedValue> {
        self.entries.get(key)
    }

    /// Mutable staged entry for `key`
    pub fn get_mut(&mut self, key: &StagingKey) -> Option<&mut VersionedValue> {
        self.entries.get_mut(key)
    }

    /// Insert `value` unless the key is already staged
    ///
    /// Returns the entry that is staged after the call. If another call for the
    /// same transaction won a race to materialize the key, its entry is kept
    /// and `value` is discarded, so a transaction never holds two versions of
    /// one key.
    pub fn insert_if_absent(&mut self, value: VersionedValue) -> &mut VersionedValue {
        self.entries.entry(value.key().clone()).or_insert(value)
    }

    /// Number of staged keys
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if no key is staged
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over staged entries in key order
    pub fn iter(&self) -> impl Iterator<Item = &VersionedValue> {
        self.entries.values()
    }

    /// Snapshot of the entries carrying write intent
    pub fn write_set(&self) -> WriteSet {
        WriteSet {
            tid: self.tid,
            entries: self.entries.values().filter(|v| v.is_dirty()).cloned().collect(),
        }
    }
}

/// Snapshot of a transaction's pending writes, in key order
///
/// Taken from the view before the Final Store lock is acquired, so that merge
/// never holds the view registry and the Final Store at the same time.
#[derive(Debug, Clone)]
pub struct WriteSet {
    tid: TxnId,
    entries: Vec<VersionedValue>,
}

impl WriteSet {
    /// Empty write set for `tid`
    pub fn empty(tid: TxnId) -> Self {
        Self {
            tid,
            entries: Vec::new(),
        }
    }

    /// Transaction that staged these writes
    pub fn tid(&self) -> TxnId {
        self.tid
    }

    /// Number of pending writes
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if there is nothing to merge
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over pending writes in key order
    pub fn iter(&self) -> impl Iterator<Item = &VersionedValue> {
        self.entries.iter()
    }

    /// Keys written, in order
    pub fn keys(&self) -> Vec<StagingKey> {
        self.entries.iter().map(|v| v.key().clone()).collect()
    }
}
