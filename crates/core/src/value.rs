//! Versioned value records
//!
//! A `VersionedValue` captures one revision of one key: its value, whether a
//! transaction intends to write it, and the version stamp it was derived at.
//!
//! # Version Stamps
//!
//! - `old` (baseline): the Final Store version the owner observed
//! - `new` (assigned): the version this record becomes once committed
//!
//! A record derived from an existing revision always has `new == old + 1`.
//! A fresh Final Store baseline for a never-seen key is `old == new == 0`.
//!
//! Records published to the Final Store are never edited afterwards. A
//! transaction only mutates its own private copy, and commit installs a new
//! clone rather than handing over that copy.

use crate::types::{StagingKey, TxnId};
use serde::{Deserialize, Serialize};

/// One key's value, write intent, and version stamp
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionedValue {
    key: StagingKey,
    value: Option<Vec<u8>>,
    old: u64,
    new: u64,
    dirty: bool,
    deleted: bool,
    owner: Option<TxnId>,
}

impl VersionedValue {
    /// Create the version-0 baseline for a key with no committed revision
    ///
    /// Baselines carry no value and no owner.
    pub fn baseline(key: StagingKey) -> Self {
        Self {
            key,
            value: None,
            old: 0,
            new: 0,
            dirty: false,
            deleted: false,
            owner: None,
        }
    }

    /// Derive the next revision of this record for `owner`
    ///
    /// The derived record copies the value, takes this record's assigned
    /// version as its baseline, and is assigned the version after it. Write
    /// intent and deletion start cleared.
    pub fn derive_for(&self, owner: Option<TxnId>) -> Self {
        Self {
            key: self.key.clone(),
            value: self.value.clone(),
            old: self.new,
            new: self.new + 1,
            dirty: false,
            deleted: false,
            owner,
        }
    }

    /// Commit-ready copy of this record: identical except write intent is cleared
    pub fn clone_for_final(&self) -> Self {
        Self {
            dirty: false,
            ..self.clone()
        }
    }

    /// Stage a write of `value`
    ///
    /// `dirty` marks the record as a pending write. A write supersedes an
    /// earlier delete of the same key within the transaction.
    pub fn stage_write(&mut self, value: Vec<u8>, dirty: bool) {
        self.value = Some(value);
        self.dirty = dirty;
        self.deleted = false;
    }

    /// Stage a delete; always marks the record as a pending write
    pub fn stage_delete(&mut self) {
        self.deleted = true;
        self.dirty = true;
    }

    /// Key of this record
    pub fn key(&self) -> &StagingKey {
        &self.key
    }

    /// Stored value, regardless of the deletion flag
    pub fn value(&self) -> Option<&[u8]> {
        self.value.as_deref()
    }

    /// Value as seen by a reader: `None` once deleted
    pub fn live_value(&self) -> Option<&[u8]> {
        if self.deleted {
            None
        } else {
            self.value()
        }
    }

    /// Baseline version ("old")
    pub fn old_version(&self) -> u64 {
        self.old
    }

    /// Assigned version ("new")
    pub fn new_version(&self) -> u64 {
        self.new
    }

    /// Whether this record is a pending write
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Whether this record deletes its key
    pub fn is_deleted(&self) -> bool {
        self.deleted
    }

    /// Transaction that produced this revision, if any
    pub fn owner(&self) -> Option<TxnId> {
        self.owner
    }
}
