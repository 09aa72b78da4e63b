//! mvccdb - Optimistic concurrency control staging over a versioned key-value state
//!
//! Concurrently executing transactions each stage their reads and writes in a
//! private view. At commit, a transaction's writes are validated against the
//! shared Final Store and installed all-or-nothing; a transaction whose
//! baselines went stale is rejected with every conflicting key.
//!
//! # Quick Start
//!
//! ```
//! use mvccdb::{StagingTable, TxnId, TxnScope};
//!
//! let table = StagingTable::new();
//! table.put(TxnScope::Final, b"balance", b"100".to_vec(), true);
//!
//! let (t1, t2) = (TxnId::new(1), TxnId::new(2));
//! table.put(t1, b"balance", b"90".to_vec(), true);
//! table.put(t2, b"balance", b"80".to_vec(), true);
//!
//! assert!(table.merge_to_final(t1).is_ok());
//! assert!(table.merge_to_final(t2).unwrap_err().is_conflict());
//! assert_eq!(table.final_version(b"balance"), Some(2));
//! ```
//!
//! # Architecture
//!
//! - `mvccdb-core`: keys, transaction ids, versioned values, errors
//! - `mvccdb-concurrency`: the staging table, merge validation, configuration
//!   and diagnostics

pub use mvccdb_concurrency::*;
