//! Scheduler-style batch execution
//!
//! Worker threads execute randomly generated transactions against one table,
//! retrying each under a fresh id until it commits. The dependency lists
//! returned by the successful merges are enough to replay the batch serially
//! on a fresh table and arrive at the same committed state.

use crate::common::*;
use mvccdb::{StagingTable, TxnId};
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;

const KEY_SPACE: u64 = 8;

/// A transaction body: keys to read, then keys to write
#[derive(Debug, Clone)]
struct Body {
    reads: Vec<Vec<u8>>,
    writes: Vec<Vec<u8>>,
}

#[derive(Debug, Clone)]
struct Committed {
    tid: TxnId,
    writes: Vec<Vec<u8>>,
    dependents: Vec<TxnId>,
}

fn random_body(rng: &mut StdRng) -> Body {
    let key = |rng: &mut StdRng| format!("acct_{}", rng.gen_range(0..KEY_SPACE)).into_bytes();
    let reads = (0..rng.gen_range(0..3)).map(|_| key(rng)).collect();
    let mut writes: Vec<Vec<u8>> = (0..rng.gen_range(1..4)).map(|_| key(rng)).collect();
    writes.sort();
    writes.dedup();
    Body { reads, writes }
}

/// Run `body` until it commits; returns the committing id and its dependents
fn execute(table: &StagingTable, ids: &AtomicU64, body: &Body) -> (TxnId, Vec<TxnId>, usize) {
    let mut attempts = 0;
    loop {
        attempts += 1;
        let tid = TxnId::new(ids.fetch_add(1, Ordering::SeqCst));
        for key in &body.reads {
            table.get(tid, key);
        }
        for key in &body.writes {
            table.put(tid, key, tid.as_u64().to_le_bytes().to_vec(), true);
        }

        let result = table.merge_to_final(tid);
        table.purge(tid);
        match result {
            Ok(outcome) => return (tid, outcome.dependents, attempts),
            Err(e) => assert!(e.is_conflict(), "unexpected error: {}", e),
        }
    }
}

fn replay_order(committed: &[Committed]) -> Vec<&Committed> {
    let by_tid: BTreeMap<TxnId, &Committed> = committed.iter().map(|c| (c.tid, c)).collect();
    let mut remaining: BTreeMap<TxnId, BTreeSet<TxnId>> = committed
        .iter()
        .map(|c| (c.tid, c.dependents.iter().copied().collect()))
        .collect();
    let mut order = Vec::with_capacity(committed.len());

    while !remaining.is_empty() {
        let ready: Vec<TxnId> = remaining
            .iter()
            .filter(|(_, on)| on.is_empty())
            .map(|(tid, _)| *tid)
            .collect();
        assert!(!ready.is_empty(), "dependency cycle");
        for tid in ready {
            remaining.remove(&tid);
            for on in remaining.values_mut() {
                on.remove(&tid);
            }
            order.push(by_tid[&tid]);
        }
    }
    order
}

#[test]
fn concurrent_batch_replays_serially() {
    init_tracing();

    let table = Arc::new(StagingTable::new());
    let ids = Arc::new(AtomicU64::new(1));
    let committed: Arc<Mutex<Vec<Committed>>> = Arc::new(Mutex::new(Vec::new()));
    let num_threads = 6;
    let txns_per_thread = 40;
    let barrier = Arc::new(Barrier::new(num_threads));

    let handles: Vec<_> = (0..num_threads)
        .map(|thread_id| {
            let table = Arc::clone(&table);
            let ids = Arc::clone(&ids);
            let committed = Arc::clone(&committed);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let mut rng = StdRng::seed_from_u64(0xB10C + thread_id as u64);
                barrier.wait();
                for _ in 0..txns_per_thread {
                    let body = random_body(&mut rng);
                    let (tid, dependents, _) = execute(&table, &ids, &body);
                    committed.lock().push(Committed {
                        tid,
                        writes: body.writes,
                        dependents,
                    });
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    let committed = committed.lock().clone();
    assert_eq!(committed.len(), num_threads * txns_per_thread);
    assert!(table.active_transactions().is_empty());

    let replayed = StagingTable::new();
    for entry in replay_order(&committed) {
        for key in &entry.writes {
            replayed.put(entry.tid, key, entry.tid.as_u64().to_le_bytes().to_vec(), true);
        }
        let outcome = replayed.merge_to_final(entry.tid).unwrap();
        assert_eq!(outcome.dependents, entry.dependents, "replay of {}", entry.tid);
        replayed.purge(entry.tid);
    }

    assert_eq!(committed_state(&replayed), committed_state(&table));
}

#[test]
fn every_committed_write_is_counted_in_versions() {
    let table = StagingTable::new();
    let ids = AtomicU64::new(1);
    let mut rng = StdRng::seed_from_u64(7);
    let mut writes_per_key: BTreeMap<Vec<u8>, u64> = BTreeMap::new();

    for _ in 0..100 {
        let body = random_body(&mut rng);
        let (_, _, attempts) = execute(&table, &ids, &body);
        // Single-threaded: nothing can interfere
        assert_eq!(attempts, 1);
        for key in body.writes {
            *writes_per_key.entry(key).or_insert(0) += 1;
        }
    }

    for (key, (_, version)) in committed_state(&table) {
        assert_eq!(version, writes_per_key.get(&key).copied().unwrap_or(0));
    }
    assert_eq!(table.stats().merges_aborted, 0);
}
