//! Concurrency layer for mvccdb
//!
//! This crate implements optimistic concurrency control (OCC) over a
//! versioned key-value state:
//! - StagingTable: Per-transaction staged views over a shared Final Store
//! - Snapshot isolation: each transaction sees one version per key
//! - Conflict detection at merge time (write-set validation)
//! - All-or-nothing installation of a transaction's writes
//!
//! Transactions never block each other outside two short critical sections
//! (locating a transaction's view, reading a Final Store baseline) and the
//! merge itself, which is serialized against the Final Store.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod diagnostics;
pub mod final_store;
pub mod merge;
pub mod staging;
pub mod stats;
pub mod validation;
pub mod view;

pub use config::{MissingBaselinePolicy, StagingConfig, CONFIG_FILE_NAME};
pub use diagnostics::{DiagnosticsSink, TracingDiagnostics};
pub use final_store::FinalStore;
pub use merge::{merge_write_set, MergeOutcome, MergeReport};
pub use staging::{FinalStoreGuard, StagingTable};
pub use stats::{StagingStats, StatsSnapshot};
pub use validation::{validate_write_set, ValidationResult};
pub use view::{TransactionView, WriteSet};

pub use mvccdb_core::{Error, KeyConflict, Result, StagingKey, TxnId, TxnScope, VersionedValue};
