//! Dependency reporting and serial replay
//!
//! A successful merge returns the owners of the Final Store revisions it
//! replaced. Ordering committed transactions by those edges reproduces the
//! committed state on a fresh table.

use crate::common::*;
use mvccdb::{StagingTable, TxnId, TxnScope};
use std::collections::{BTreeMap, BTreeSet};

/// Order transactions so that each comes after everything it depends on
fn replay_order(deps: &BTreeMap<TxnId, Vec<TxnId>>) -> Vec<TxnId> {
    let mut remaining: BTreeMap<TxnId, BTreeSet<TxnId>> = deps
        .iter()
        .map(|(tid, on)| (*tid, on.iter().copied().collect()))
        .collect();
    let mut order = Vec::with_capacity(remaining.len());

    while !remaining.is_empty() {
        let ready: Vec<TxnId> = remaining
            .iter()
            .filter(|(_, on)| on.is_empty())
            .map(|(tid, _)| *tid)
            .collect();
        assert!(!ready.is_empty(), "dependency cycle among {:?}", remaining.keys());

        for tid in ready {
            remaining.remove(&tid);
            for on in remaining.values_mut() {
                on.remove(&tid);
            }
            order.push(tid);
        }
    }
    order
}

#[test]
fn first_writer_has_no_dependents() {
    let table = StagingTable::new();
    table.put(txn(1), b"K", b"v".to_vec(), true);
    assert!(table.merge_to_final(txn(1)).unwrap().dependents.is_empty());
}

#[test]
fn direct_final_writes_are_not_dependents() {
    let table = StagingTable::new();
    table.put(TxnScope::Final, b"K", b"seed".to_vec(), true);
    table.put(txn(1), b"K", b"v".to_vec(), true);
    assert!(table.merge_to_final(txn(1)).unwrap().dependents.is_empty());
}

#[test]
fn chained_writers_depend_on_their_predecessor() {
    let table = StagingTable::new();

    table.put(txn(1), b"a", b"1".to_vec(), true);
    table.merge_to_final(txn(1)).unwrap();

    table.put(txn(2), b"a", b"2".to_vec(), true);
    table.put(txn(2), b"b", b"2".to_vec(), true);
    assert_eq!(table.merge_to_final(txn(2)).unwrap().dependents, vec![txn(1)]);

    table.put(txn(3), b"b", b"3".to_vec(), true);
    table.put(txn(3), b"c", b"3".to_vec(), true);
    assert_eq!(table.merge_to_final(txn(3)).unwrap().dependents, vec![txn(2)]);
}

#[test]
fn dependents_are_reported_once_in_key_order() {
    let table = StagingTable::new();
    table.put(txn(9), b"b", b"9".to_vec(), true);
    table.merge_to_final(txn(9)).unwrap();
    table.put(txn(5), b"a", b"5".to_vec(), true);
    table.put(txn(5), b"c", b"5".to_vec(), true);
    table.merge_to_final(txn(5)).unwrap();

    let tid = txn(10);
    for key in [&b"c"[..], &b"b"[..], &b"a"[..]] {
        table.put(tid, key, b"10".to_vec(), true);
    }
    let outcome = table.merge_to_final(tid).unwrap();
    assert_eq!(outcome.dependents, vec![txn(5), txn(9)]);
}

#[test]
fn replay_in_dependency_order_reproduces_committed_state() {
    let table = StagingTable::new();
    let mut deps = BTreeMap::new();
    let mut writes: BTreeMap<TxnId, Vec<(&str, Vec<u8>)>> = BTreeMap::new();

    // Interleaved execution: several transactions stage concurrently, some
    // lose and are retried under a new id
    let plan: [(u64, &[&str]); 6] = [
        (1, &["x"]),
        (2, &["x", "y"]),
        (3, &["y"]),
        (4, &["z"]),
        (5, &["x", "z"]),
        (6, &["y", "z"]),
    ];

    for round in plan.chunks(2) {
        for (n, keys) in round {
            for key in keys.iter() {
                table.put(txn(*n), key.as_bytes(), n.to_le_bytes().to_vec(), true);
            }
        }
        for (n, keys) in round {
            let tid = txn(*n);
            match table.merge_to_final(tid) {
                Ok(outcome) => {
                    deps.insert(tid, outcome.dependents);
                    writes.insert(
                        tid,
                        keys.iter().map(|k| (*k, n.to_le_bytes().to_vec())).collect(),
                    );
                }
                Err(e) => assert!(e.is_conflict()),
            }
            table.purge(tid);
        }
    }
    assert!(deps.len() < plan.len(), "expected at least one conflict");

    let replayed = StagingTable::new();
    for tid in replay_order(&deps) {
        for (key, value) in &writes[&tid] {
            replayed.put(tid, key.as_bytes(), value.clone(), true);
        }
        let outcome = replayed.merge_to_final(tid).unwrap();
        assert_eq!(outcome.dependents, deps[&tid]);
        replayed.purge(tid);
    }

    assert_eq!(committed_state(&replayed), committed_state(&table));
}
