//! Merge (commit) of a write set into the Final Store
//!
//! ## Merge Sequence
//!
//! ```text
//! 1. validate_write_set() - Check every pending write against the Final Store
//! 2. IF conflicts: install nothing, report every conflicting key
//! 3. ELSE: install clone_for_final() of every validated write
//! 4. Return dependent transaction ids
//! ```
//!
//! Validating every key before installing any is what makes a merge
//! all-or-nothing. `merge_write_set` does no locking and no logging; callers
//! run it inside the Final Store critical section and report afterwards.

use crate::config::MissingBaselinePolicy;
use crate::final_store::FinalStore;
use crate::validation::{validate_write_set, ValidationResult};
use crate::view::WriteSet;
use mvccdb_core::{Error, Result, TxnId};

/// Successful merge result
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeOutcome {
    /// Transactions this commit is serialized after, in key order
    pub dependents: Vec<TxnId>,
    /// Number of keys installed into the Final Store
    pub installed: usize,
}

impl MergeOutcome {
    /// Outcome of a merge that had nothing to do
    pub fn empty() -> Self {
        Self::default()
    }
}

/// Full record of one merge attempt
///
/// Carries the validation result alongside what was installed so that the
/// caller can emit diagnostics and update statistics after releasing the
/// Final Store lock.
#[derive(Debug, Clone)]
pub struct MergeReport {
    /// Transaction that attempted the merge
    pub tid: TxnId,
    /// Validation outcome
    pub validation: ValidationResult,
    /// Number of keys installed (0 if validation failed)
    pub installed: usize,
}

impl MergeReport {
    /// Check if the merge was applied
    pub fn committed(&self) -> bool {
        self.validation.is_valid()
    }

    /// Convert into the caller-facing result
    ///
    /// # Errors
    ///
    /// Returns `Error::StagingKeyConflict` listing every conflicting key if
    /// validation failed.
    pub fn into_result(self) -> Result<MergeOutcome> {
        if !self.validation.is_valid() {
            return Err(Error::StagingKeyConflict {
                tid: self.tid,
                conflicts: self.validation.conflicts,
            });
        }
        Ok(MergeOutcome {
            dependents: self.validation.dependents,
            installed: self.installed,
        })
    }
}

/// Validate `write_set` and, if it is conflict-free, install it
///
/// Keys skipped as missing (under `MissingBaselinePolicy::Skip`) are neither
/// validated nor installed.
pub fn merge_write_set(
    store: &mut FinalStore,
    write_set: &WriteSet,
    policy: MissingBaselinePolicy,
) -> MergeReport {
    let validation = validate_write_set(write_set, store, policy);

    let mut installed = 0;
    if validation.is_valid() {
        for staged in write_set.iter() {
            if !staged.is_dirty() || validation.is_missing(staged.key()) {
                continue;
            }
            store.install(staged.clone_for_final());
            installed += 1;
        }
    }

    MergeReport {
        tid: write_set.tid(),
        validation,
        installed,
    }
}
