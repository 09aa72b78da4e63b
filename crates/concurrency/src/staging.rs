//! Staging table: per-transaction views over a shared Final Store
//!
//! Transactions read and write through `get`/`put`/`del` with their `TxnId`.
//! The first access to a key materializes it from the Final Store and caches
//! it in the transaction's private view; every later access returns that same
//! entry (read-your-writes, one version per key per transaction).
//! `merge_to_final` validates the view's writes and installs them atomically.
//!
//! # Locking
//!
//! - View registry (`DashMap`): held only to locate, create, or update one
//!   transaction's view
//! - Final Store (`Mutex`): held to read or create a baseline, for the whole of
//!   a merge, and for the lifetime of a `FinalStoreGuard`
//!
//! The two are never held at the same time by any operation of this type, so
//! there is no lock ordering to get wrong. Diagnostics are emitted after the
//! Final Store lock is released, including for merges applied through a
//! `FinalStoreGuard`, whose diagnostics are emitted when it is dropped.
//!
//! The Final Store mutex is not reentrant. A thread holding a
//! `FinalStoreGuard` must not call anything else on the table that locks the
//! Final Store (first access to a key, `merge_to_final`, the `final_*`
//! accessors); doing so deadlocks, and panics instead in debug builds.

use crate::config::StagingConfig;
use crate::diagnostics::{DiagnosticsSink, TracingDiagnostics};
use crate::final_store::FinalStore;
use crate::merge::{merge_write_set, MergeOutcome, MergeReport};
use crate::stats::{StagingStats, StatsSnapshot};
use crate::view::{TransactionView, WriteSet};
use dashmap::DashMap;
use mvccdb_core::{Result, StagingKey, TxnId, TxnScope, VersionedValue};
use parking_lot::{Mutex, MutexGuard};
use std::sync::Arc;
use std::thread::{self, ThreadId};
use tracing::trace;

/// Staged views of many transactions plus the Final Store they commit into
///
/// One table lives for one batch (e.g. one block's transactions). Once the
/// batch completes, `into_final_values` hands the committed state to the next
/// stage.
#[derive(Debug)]
pub struct StagingTable {
    views: DashMap<TxnId, TransactionView>,
    final_store: Mutex<FinalStore>,
    config: StagingConfig,
    diagnostics: Arc<dyn DiagnosticsSink>,
    stats: StagingStats,
    /// Thread currently holding a `FinalStoreGuard`, if any
    guard_holder: Mutex<Option<ThreadId>>,
}

impl StagingTable {
    /// Create a table with default configuration
    pub fn new() -> Self {
        Self::with_config(StagingConfig::default())
    }

    /// Create a table with the given configuration
    pub fn with_config(config: StagingConfig) -> Self {
        Self {
            views: DashMap::with_capacity(config.expected_transactions),
            final_store: Mutex::new(FinalStore::with_capacity(config.final_capacity)),
            config,
            diagnostics: Arc::new(TracingDiagnostics),
            stats: StagingStats::default(),
            guard_holder: Mutex::new(None),
        }
    }

    /// Replace the diagnostics sink
    pub fn with_diagnostics(mut self, sink: Arc<dyn DiagnosticsSink>) -> Self {
        self.diagnostics = sink;
        self
    }

    /// Active configuration
    pub fn config(&self) -> &StagingConfig {
        &self.config
    }

    // ========================================================================
    // Staged access
    // ========================================================================

    /// Read `key` in `scope`
    ///
    /// For a transaction, returns its staged entry, materializing it from the
    /// Final Store on first access. Never creates a Final Store entry: if the
    /// key has never been written, returns `None` and nothing is cached.
    ///
    /// For `TxnScope::Final`, returns the committed entry.
    pub fn get(&self, scope: impl Into<TxnScope>, key: &[u8]) -> Option<VersionedValue> {
        let key = StagingKey::encode(key);
        let scope: TxnScope = scope.into();
        match scope {
            TxnScope::Final => self.lock_store().get(&key).cloned(),
            TxnScope::Txn(tid) => self.read_staged(tid, &key),
        }
    }

    /// Write `value` to `key` in `scope`
    ///
    /// `dirty` is the write intent; pass `true` for genuine writes. Creates a
    /// version-0 Final Store baseline if the key has never been seen.
    ///
    /// For `TxnScope::Final`, the write is installed directly as the next
    /// committed revision and that revision is returned.
    pub fn put(
        &self,
        scope: impl Into<TxnScope>,
        key: &[u8],
        value: impl Into<Vec<u8>>,
        dirty: bool,
    ) -> VersionedValue {
        let key = StagingKey::encode(key);
        let value = value.into();
        let scope: TxnScope = scope.into();
        match scope {
            TxnScope::Final => self.write_final(&key, |vv| vv.stage_write(value, dirty)),
            TxnScope::Txn(tid) => self.write_staged(tid, &key, |vv| vv.stage_write(value, dirty)),
        }
    }

    /// Delete `key` in `scope`
    ///
    /// Marks the entry deleted and dirty. Creates a version-0 Final Store
    /// baseline if the key has never been seen.
    pub fn del(&self, scope: impl Into<TxnScope>, key: &[u8]) -> VersionedValue {
        let key = StagingKey::encode(key);
        let scope: TxnScope = scope.into();
        match scope {
            TxnScope::Final => self.write_final(&key, VersionedValue::stage_delete),
            TxnScope::Txn(tid) => self.write_staged(tid, &key, VersionedValue::stage_delete),
        }
    }

    /// Discard a transaction's entire view
    ///
    /// Safe at any time, including concurrently with a merge of the same
    /// transaction. Never touches the Final Store, so values already merged
    /// stay merged. No-op for `TxnScope::Final`.
    pub fn purge(&self, scope: impl Into<TxnScope>) {
        let scope: TxnScope = scope.into();
        let TxnScope::Txn(tid) = scope else {
            return;
        };
        if let Some((_, view)) = self.views.remove(&tid) {
            self.stats.record_purge();
            trace!(tid = %tid, keys = view.len(), "Purged transaction view");
        }
    }

    // ========================================================================
    // Merge
    // ========================================================================

    /// Validate and install a transaction's writes
    ///
    /// Runs validation and installation in one Final Store critical section.
    /// Pure reads are never validated. Merging does not purge the view.
    ///
    /// # Returns
    /// - `Ok(MergeOutcome)` with the transactions this commit is serialized after
    /// - `Err(Error::StagingKeyConflict)` listing every conflicting key; nothing
    ///   is installed
    ///
    /// `TxnScope::Final` has nothing staged and always succeeds.
    pub fn merge_to_final(&self, scope: impl Into<TxnScope>) -> Result<MergeOutcome> {
        let scope: TxnScope = scope.into();
        let TxnScope::Txn(tid) = scope else {
            return Ok(MergeOutcome::empty());
        };

        let write_set = self.write_set(tid);
        let report = {
            let mut store = self.lock_store();
            merge_write_set(&mut store, &write_set, self.config.missing_baseline)
        };
        self.report(&report);
        report.into_result()
    }

    /// Snapshot of a transaction's pending writes
    ///
    /// Empty if the transaction has no view.
    pub fn write_set(&self, tid: TxnId) -> WriteSet {
        self.views
            .get(&tid)
            .map(|view| view.write_set())
            .unwrap_or_else(|| WriteSet::empty(tid))
    }

    /// Take exclusive access to the Final Store
    ///
    /// Blocks every merge and every first-time materialization until the guard
    /// is dropped. While holding the guard, the same thread must not call
    /// `get`/`put`/`del` for keys its transaction has not yet staged, nor
    /// `merge_to_final` or the `final_*` accessors: those need the Final Store
    /// lock and would deadlock (debug builds panic instead). Collect write sets
    /// with `write_set` and merge them through the guard.
    pub fn lock_final(&self) -> FinalStoreGuard<'_> {
        let store = self.final_store.lock();
        *self.guard_holder.lock() = Some(thread::current().id());
        FinalStoreGuard {
            store,
            release: GuardRelease {
                table: self,
                pending: Vec::new(),
            },
        }
    }

    // ========================================================================
    // Introspection
    // ========================================================================

    /// Committed entry for `key`
    pub fn final_get(&self, key: &[u8]) -> Option<VersionedValue> {
        self.get(TxnScope::Final, key)
    }

    /// Committed version of `key`
    pub fn final_version(&self, key: &[u8]) -> Option<u64> {
        self.lock_store().version_of(&StagingKey::encode(key))
    }

    /// Number of keys in the Final Store
    pub fn final_len(&self) -> usize {
        self.lock_store().len()
    }

    /// Check if `tid` has a view
    pub fn has_view(&self, tid: TxnId) -> bool {
        self.views.contains_key(&tid)
    }

    /// Number of keys staged by `tid`
    pub fn view_len(&self, tid: TxnId) -> usize {
        self.views.get(&tid).map_or(0, |view| view.len())
    }

    /// Transactions with a view, sorted
    pub fn active_transactions(&self) -> Vec<TxnId> {
        let mut tids: Vec<TxnId> = self.views.iter().map(|entry| *entry.key()).collect();
        tids.sort();
        tids
    }

    /// Current statistics
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Copy of the committed state, sorted by key
    pub fn final_values(&self) -> Vec<VersionedValue> {
        self.lock_store().sorted_values()
    }

    /// Consume the table, returning the committed state sorted by key
    pub fn into_final_values(self) -> Vec<VersionedValue> {
        self.final_store.into_inner().into_sorted_values()
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn read_staged(&self, tid: TxnId, key: &StagingKey) -> Option<VersionedValue> {
        if let Some(view) = self.views.get(&tid) {
            if let Some(entry) = view.get(key) {
                return Some(entry.clone());
            }
        }

        let derived = self
            .lock_store()
            .baseline_or_create(key, false)
            .map(|current| current.derive_for(Some(tid)))?;
        Some(self.stage(tid, derived, |_| {}))
    }

    fn write_staged<F>(&self, tid: TxnId, key: &StagingKey, apply: F) -> VersionedValue
    where
        F: FnOnce(&mut VersionedValue),
    {
        if let Some(mut view) = self.views.get_mut(&tid) {
            if let Some(entry) = view.get_mut(key) {
                apply(entry);
                return entry.clone();
            }
        }

        let derived = self.lock_store().baseline(key).derive_for(Some(tid));
        self.stage(tid, derived, apply)
    }

    /// Cache a freshly derived entry in `tid`'s view and apply `apply` to
    /// whichever entry ends up staged
    fn stage<F>(&self, tid: TxnId, derived: VersionedValue, apply: F) -> VersionedValue
    where
        F: FnOnce(&mut VersionedValue),
    {
        let mut view = self
            .views
            .entry(tid)
            .or_insert_with(|| TransactionView::new(tid));

        // A racing call for the same tid may have staged the key first
        if view.get(derived.key()).is_none() {
            self.stats.record_materialization();
            trace!(
                tid = %tid,
                key = %derived.key(),
                old = derived.old_version(),
                new = derived.new_version(),
                "Materialized from final store"
            );
        }

        let entry = view.insert_if_absent(derived);
        apply(entry);
        entry.clone()
    }

    fn write_final<F>(&self, key: &StagingKey, apply: F) -> VersionedValue
    where
        F: FnOnce(&mut VersionedValue),
    {
        let committed = {
            let mut store = self.lock_store();
            let mut next = store.baseline(key).derive_for(None);
            apply(&mut next);
            let committed = next.clone_for_final();
            store.install(committed.clone());
            committed
        };
        trace!(key = %key, version = committed.new_version(), "Wrote directly to final store");
        committed
    }

    /// Lock the Final Store for a single operation
    fn lock_store(&self) -> MutexGuard<'_, FinalStore> {
        if cfg!(debug_assertions) {
            let holder = *self.guard_holder.lock();
            assert_ne!(
                holder,
                Some(thread::current().id()),
                "final store locked again by the thread holding its FinalStoreGuard"
            );
        }
        self.final_store.lock()
    }

    fn report(&self, report: &MergeReport) {
        self.record(report);
        self.emit(report);
    }

    fn record(&self, report: &MergeReport) {
        if !report.validation.missing.is_empty() {
            self.stats.record_missing(report.validation.missing.len());
        }
        if report.committed() {
            self.stats.record_commit(report.installed);
        } else {
            self.stats.record_abort();
        }
    }

    /// Forward a merge report to the diagnostics sink; never called with the
    /// Final Store locked
    fn emit(&self, report: &MergeReport) {
        for key in &report.validation.missing {
            self.diagnostics.missing_baseline(report.tid, key);
        }

        if report.committed() {
            self.diagnostics
                .merge_committed(report.tid, report.installed, &report.validation.dependents);
        } else {
            self.diagnostics
                .merge_conflict(report.tid, &report.validation.conflicts);
        }
    }
}

impl Default for StagingTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Scoped exclusive access to the Final Store
///
/// Released when dropped, on every exit path. Lets a caller apply several
/// merges, or read several keys, with no other merge or materialization
/// interleaved.
pub struct FinalStoreGuard<'a> {
    // Fields drop in declaration order: the lock is released before
    // `release` emits the pending diagnostics.
    store: MutexGuard<'a, FinalStore>,
    release: GuardRelease<'a>,
}

impl<'a> FinalStoreGuard<'a> {
    /// Committed entry for `key`
    pub fn get(&self, key: &[u8]) -> Option<&VersionedValue> {
        self.store.get(&StagingKey::encode(key))
    }

    /// Committed version of `key`
    pub fn version_of(&self, key: &[u8]) -> Option<u64> {
        self.store.version_of(&StagingKey::encode(key))
    }

    /// Number of keys in the Final Store
    pub fn len(&self) -> usize {
        self.store.len()
    }

    /// Check if the Final Store is empty
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Read-only view of the whole store
    pub fn store(&self) -> &FinalStore {
        &self.store
    }

    /// Validate and install a write set under this guard
    ///
    /// Same semantics as `StagingTable::merge_to_final`. Statistics are
    /// updated immediately; diagnostics for this merge are emitted once the
    /// guard is dropped.
    pub fn merge(&mut self, write_set: &WriteSet) -> Result<MergeOutcome> {
        let table = self.release.table;
        let report = merge_write_set(&mut self.store, write_set, table.config.missing_baseline);
        table.record(&report);
        let result = report.clone().into_result();
        self.release.pending.push(report);
        result
    }
}

/// Unlock-time bookkeeping of a `FinalStoreGuard`
struct GuardRelease<'a> {
    table: &'a StagingTable,
    pending: Vec<MergeReport>,
}

impl Drop for GuardRelease<'_> {
    fn drop(&mut self) {
        {
            let mut holder = self.table.guard_holder.lock();
            if *holder == Some(thread::current().id()) {
                *holder = None;
            }
        }
        for report in self.pending.drain(..) {
            self.table.emit(&report);
        }
    }
}
