//! Staging Table Integration Tests
//!
//! End-to-end behavior of the public `mvccdb` API: staged access, merge
//! validation, dependency reporting and scheduler-style batch execution.

#[path = "../common/mod.rs"]
mod common;

mod block_execution;
mod dependencies;
