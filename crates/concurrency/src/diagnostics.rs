//! Advisory diagnostics channel
//!
//! The staging table reports anomalies and conflicts through an injected
//! `DiagnosticsSink`. Sinks are fire-and-forget: they must not block, and
//! nothing they do can change the outcome of the operation being reported.

use mvccdb_core::{KeyConflict, StagingKey, TxnId};
use std::fmt;
use tracing::{debug, trace, warn};

/// Receiver of advisory staging events
pub trait DiagnosticsSink: Send + Sync + fmt::Debug {
    /// A written key had no Final Store entry during merge validation
    fn missing_baseline(&self, tid: TxnId, key: &StagingKey);

    /// A merge was rejected; `conflicts` lists every conflicting key
    fn merge_conflict(&self, tid: TxnId, conflicts: &[KeyConflict]);

    /// A merge was applied
    fn merge_committed(&self, tid: TxnId, installed: usize, dependents: &[TxnId]) {
        let _ = (tid, installed, dependents);
    }
}

/// Default sink: forwards events to `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingDiagnostics;

impl DiagnosticsSink for TracingDiagnostics {
    fn missing_baseline(&self, tid: TxnId, key: &StagingKey) {
        warn!(tid = %tid, key = %key, "Key should be in final store");
    }

    fn merge_conflict(&self, tid: TxnId, conflicts: &[KeyConflict]) {
        let keys: Vec<String> = conflicts.iter().map(|c| c.key.to_string()).collect();
        debug!(tid = %tid, conflict_keys = ?keys, "Merge validation failed");
    }

    fn merge_committed(&self, tid: TxnId, installed: usize, dependents: &[TxnId]) {
        trace!(tid = %tid, installed, dependents = ?dependents, "Merged to final");
    }
}
