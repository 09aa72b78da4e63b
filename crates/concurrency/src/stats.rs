//! Staging statistics
//!
//! Relaxed atomic counters; a snapshot is a consistent-enough view for
//! reporting, not a linearizable read.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Live counters owned by a `StagingTable`
#[derive(Debug, Default)]
pub struct StagingStats {
    materializations: AtomicU64,
    merges_committed: AtomicU64,
    merges_aborted: AtomicU64,
    keys_installed: AtomicU64,
    missing_baselines: AtomicU64,
    purges: AtomicU64,
}

/// Point-in-time copy of `StagingStats`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    /// Entries derived from the Final Store into a transaction view
    pub materializations: u64,
    /// Merges that installed their writes
    pub merges_committed: u64,
    /// Merges rejected with a key conflict
    pub merges_aborted: u64,
    /// Keys installed by committed merges
    pub keys_installed: u64,
    /// Written keys found without a Final Store entry
    pub missing_baselines: u64,
    /// Transaction views discarded by purge
    pub purges: u64,
}

impl StagingStats {
    pub(crate) fn record_materialization(&self) {
        self.materializations.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_commit(&self, installed: usize) {
        self.merges_committed.fetch_add(1, Ordering::Relaxed);
        self.keys_installed
            .fetch_add(installed as u64, Ordering::Relaxed);
    }

    pub(crate) fn record_abort(&self) {
        self.merges_aborted.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_missing(&self, count: usize) {
        self.missing_baselines
            .fetch_add(count as u64, Ordering::Relaxed);
    }

    pub(crate) fn record_purge(&self) {
        self.purges.fetch_add(1, Ordering::Relaxed);
    }

    /// Copy the current counter values
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            materializations: self.materializations.load(Ordering::Relaxed),
            merges_committed: self.merges_committed.load(Ordering::Relaxed),
            merges_aborted: self.merges_aborted.load(Ordering::Relaxed),
            keys_installed: self.keys_installed.load(Ordering::Relaxed),
            missing_baselines: self.missing_baselines.load(Ordering::Relaxed),
            purges: self.purges.load(Ordering::Relaxed),
        }
    }
}
