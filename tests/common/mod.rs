//! Shared test utilities for the integration test suites.
//!
//! Import via `mod common;` from any test's main.rs.

#![allow(dead_code)]

use mvccdb::{StagingTable, TxnId};
use std::collections::BTreeMap;
use std::sync::Once;

static INIT_TRACING: Once = Once::new();

/// Route `tracing` output through the test harness (visible with --nocapture)
pub fn init_tracing() {
    INIT_TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .with_max_level(tracing::Level::DEBUG)
            .try_init();
    });
}

pub fn txn(n: u64) -> TxnId {
    TxnId::new(n)
}

/// Committed state as `key -> (live value, version)`
pub fn committed_state(table: &StagingTable) -> BTreeMap<Vec<u8>, (Option<Vec<u8>>, u64)> {
    table
        .final_values()
        .into_iter()
        .map(|v| {
            (
                v.key().as_bytes().to_vec(),
                (v.live_value().map(<[u8]>::to_vec), v.new_version()),
            )
        })
        .collect()
}
