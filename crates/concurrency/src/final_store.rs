//! Final Store: the authoritative version of each key
//!
//! Holds the latest committed `VersionedValue` per key for the lifetime of
//! one staging session. Entries are created on first-ever write access to a
//! key and replaced, never removed, by successful merges.
//!
//! The store itself is not synchronized; `StagingTable` keeps it behind a
//! single mutex, which is the Final Store critical section.

use mvccdb_core::{StagingKey, VersionedValue};
use rustc_hash::FxHashMap;

/// Authoritative key → latest committed revision mapping
#[derive(Debug, Default)]
pub struct FinalStore {
    values: FxHashMap<StagingKey, VersionedValue>,
}

impl FinalStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store with pre-allocated capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            values: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
        }
    }

    /// Current entry for `key`, without creating one
    pub fn get(&self, key: &StagingKey) -> Option<&VersionedValue> {
        self.values.get(key)
    }

    /// Assigned version of the current entry for `key`
    pub fn version_of(&self, key: &StagingKey) -> Option<u64> {
        self.values.get(key).map(VersionedValue::new_version)
    }

    /// Current entry for `key`, creating the version-0 baseline if absent
    pub fn baseline(&mut self, key: &StagingKey) -> &VersionedValue {
        self.values
            .entry(key.clone())
            .or_insert_with(|| VersionedValue::baseline(key.clone()))
    }

    /// Current entry for `key`; creates a baseline only when `create` is set
    ///
    /// Lookups that do not permit creation leave the store untouched.
    pub fn baseline_or_create(&mut self, key: &StagingKey, create: bool) -> Option<&VersionedValue> {
        if create {
            Some(self.baseline(key))
        } else {
            self.get(key)
        }
    }

    /// Replace the entry for the value's key
    ///
    /// Only the merge path and direct Final-scope writes install values.
    pub(crate) fn install(&mut self, value: VersionedValue) {
        self.values.insert(value.key().clone(), value);
    }

    /// Number of keys
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if the store is empty
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate over all entries in unspecified order
    pub fn iter(&self) -> impl Iterator<Item = &VersionedValue> {
        self.values.values()
    }

    /// Copy of all entries, sorted by key
    pub fn sorted_values(&self) -> Vec<VersionedValue> {
        let mut values: Vec<VersionedValue> = self.values.values().cloned().collect();
        values.sort_by(|a, b| a.key().cmp(b.key()));
        values
    }

    /// Consume the store, returning all entries sorted by key
    pub fn into_sorted_values(self) -> Vec<VersionedValue> {
        let mut values: Vec<VersionedValue> = self.values.into_values().collect();
        values.sort_by(|a, b| a.key().cmp(b.key()));
        values
    }
}
