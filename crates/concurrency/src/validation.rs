//! Write-set validation for OCC
//!
//! Key rules:
//! - Only entries with write intent are validated; pure reads never conflict
//! - A write is valid iff its baseline equals the Final Store's assigned version
//! - Every conflicting key is collected, not just the first
//! - The owner of each superseded revision is recorded as a dependency

use crate::config::MissingBaselinePolicy;
use crate::final_store::FinalStore;
use crate::view::WriteSet;
use mvccdb_core::{KeyConflict, StagingKey, TxnId};

/// Result of validating one write set against the Final Store
///
/// Accumulates conflicts, dependencies, and anomalies. A merge installs
/// writes only if `is_valid()` returns true.
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    /// All conflicts detected during validation
    pub conflicts: Vec<KeyConflict>,
    /// Owners of the Final Store revisions this write set supersedes
    ///
    /// In key order, without duplicates. Revisions with no owner (baselines
    /// created outside any transaction) are not dependencies.
    pub dependents: Vec<TxnId>,
    /// Written keys that have no Final Store entry at all
    pub missing: Vec<StagingKey>,
}

impl ValidationResult {
    /// Create a successful validation result (no conflicts)
    pub fn ok() -> Self {
        Self::default()
    }

    /// Check if validation passed (no conflicts)
    pub fn is_valid(&self) -> bool {
        self.conflicts.is_empty()
    }

    /// Get the number of conflicts
    pub fn conflict_count(&self) -> usize {
        self.conflicts.len()
    }

    /// Check if `key` was skipped because it had no Final Store entry
    pub fn is_missing(&self, key: &StagingKey) -> bool {
        self.missing.iter().any(|k| k == key)
    }

    fn record_dependent(&mut self, owner: Option<TxnId>) {
        if let Some(tid) = owner {
            if !self.dependents.contains(&tid) {
                self.dependents.push(tid);
            }
        }
    }
}

/// Validate a write set against the current Final Store state
///
/// For each pending write:
/// - Final Store entry absent: recorded in `missing`; under
///   `MissingBaselinePolicy::Conflict` also recorded as a conflict
/// - baseline == Final Store assigned version: owner recorded as a dependency
/// - otherwise: recorded as a conflict
///
/// Must be called inside the Final Store critical section, together with the
/// install step, for the result to mean anything.
pub fn validate_write_set(
    write_set: &WriteSet,
    store: &FinalStore,
    policy: MissingBaselinePolicy,
) -> ValidationResult {
    let mut result = ValidationResult::ok();

    for staged in write_set.iter() {
        // Entries in a write set always carry intent; re-check anyway
        if !staged.is_dirty() {
            continue;
        }

        let Some(current) = store.get(staged.key()) else {
            result.missing.push(staged.key().clone());
            if policy == MissingBaselinePolicy::Conflict {
                result.conflicts.push(KeyConflict {
                    key: staged.key().clone(),
                    baseline: staged.old_version(),
                    current: None,
                    holder: None,
                });
            }
            continue;
        };

        if staged.old_version() != current.new_version() {
            result.conflicts.push(KeyConflict {
                key: staged.key().clone(),
                baseline: staged.old_version(),
                current: Some(current.new_version()),
                holder: current.owner(),
            });
            continue;
        }

        result.record_dependent(current.owner());
    }

    result
}
