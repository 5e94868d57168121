//! End-to-end scenarios for the lock-free linked set.

use ordset_engines::HarrisList;
use ordset_harness::{conserved, run_mixed, ConcurrentSet, WorkloadConfig};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::atomic::{AtomicUsize, Ordering};

#[test]
fn basic_insert_contains_remove() {
    let set = HarrisList::new();

    assert!(set.insert(1));
    assert!(set.insert(2));
    assert!(set.insert(3));

    assert!(set.contains(1));
    assert!(set.contains(2));
    assert!(set.contains(3));
    assert!(!set.contains(4));

    assert!(set.remove(2));
    assert!(!set.contains(2));
    assert_eq!(set.len(), 2);
}

#[test]
fn duplicate_insert_wins_once_across_threads() {
    let set = HarrisList::new();
    let wins = AtomicUsize::new(0);

    crossbeam::thread::scope(|scope| {
        for _ in 0..2 {
            scope.spawn(|_| {
                for _ in 0..1_000 {
                    if set.insert(42) {
                        wins.fetch_add(1, Ordering::Relaxed);
                    }
                    assert!(set.contains(42));
                }
            });
        }
    })
    .unwrap();

    // No removes ran, so exactly one insert out of 2000 may have won.
    assert_eq!(wins.load(Ordering::Relaxed), 1);
    assert!(set.contains(42));
    assert_eq!(set.len(), 1);
}

#[test]
fn disjoint_heavy_insert() {
    const THREADS: i64 = 8;
    const PER_THREAD: i64 = 2_000;

    let set = HarrisList::new();
    crossbeam::thread::scope(|scope| {
        for t in 0..THREADS {
            let set = &set;
            scope.spawn(move |_| {
                for i in 0..PER_THREAD {
                    assert!(set.insert(i * THREADS + t));
                }
            });
        }
    })
    .unwrap();

    assert_eq!(set.len(), (THREADS * PER_THREAD) as usize);
    for k in 0..THREADS * PER_THREAD {
        assert!(set.contains(k));
    }
    assert!(!set.contains(THREADS * PER_THREAD));
    assert!(!set.contains(-1));
}

// The full-size version of the scenario above; linear-walk inserts make
// it minutes of work, so it only runs on demand.
#[test]
#[ignore = "long-running: 480k inserts into a linked list"]
fn disjoint_heavy_insert_full_size() {
    const THREADS: i64 = 16;
    const PER_THREAD: i64 = 30_000;

    let set = HarrisList::new();
    crossbeam::thread::scope(|scope| {
        for t in 0..THREADS {
            let set = &set;
            scope.spawn(move |_| {
                for i in 0..PER_THREAD {
                    assert!(set.insert(i * THREADS + t));
                }
            });
        }
    })
    .unwrap();

    assert_eq!(set.len(), (THREADS * PER_THREAD) as usize);
}

#[test]
fn remove_on_empty_set_is_a_noop() {
    let set = HarrisList::new();
    let mut rng = StdRng::seed_from_u64(0x5EED);
    for _ in 0..1_000 {
        let k: i64 = rng.gen_range(-1_000_000..=1_000_000);
        assert!(!set.remove(k));
        assert!(!set.contains(k));
    }
    assert!(set.is_empty());
}

#[test]
fn mixed_traffic_conserves_count_and_sum() {
    let set = HarrisList::new();
    let config = WorkloadConfig {
        workers: 8,
        ops_per_worker: 5_000,
        key_lo: 10,
        key_hi: 500,
        insert_pct: 50,
        seed: 0xFEED,
    };

    let report = run_mixed(&set, &config).unwrap();
    assert_eq!(report.attempted, 40_000);
    assert!(
        conserved(&set, &report),
        "tallied ({}, {}) but walked ({}, {})",
        report.net_count,
        report.net_sum,
        set.quiescent_len(),
        set.quiescent_sum()
    );
}

#[test]
fn insert_heavy_then_remove_heavy() {
    let set = HarrisList::new();
    let grow = WorkloadConfig {
        workers: 4,
        ops_per_worker: 2_500,
        key_lo: 1,
        key_hi: 400,
        insert_pct: 90,
        seed: 1,
    };
    let shrink = WorkloadConfig {
        insert_pct: 10,
        seed: 2,
        ..grow.clone()
    };

    let mut tally = run_mixed(&set, &grow).unwrap();
    tally.merge(run_mixed(&set, &shrink).unwrap());
    assert!(conserved(&set, &tally));
}
