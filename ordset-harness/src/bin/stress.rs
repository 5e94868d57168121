//! Escalating stress rounds against all three engines
//!
//! Each round: an insert-only warmup, then mixed insert/remove traffic
//! from several workers, then conservation checks against the quiescent
//! walks. Run with `RUST_LOG=debug` for per-worker progress.

use log::info;
use ordset_engines::{HarrisList, LeafTree, RangeSumTree};
use ordset_harness::{conserved, prefill, run_mixed, ConcurrentSet, WorkloadConfig};

struct Round {
    name: &'static str,
    config: WorkloadConfig,
    prefill: usize,
}

fn drive<S: ConcurrentSet>(engine: &str, set: &S, round: &Round) {
    info!(
        "{engine} / {}: {} workers x {} ops over [{}, {}]",
        round.name,
        round.config.workers,
        round.config.ops_per_worker,
        round.config.key_lo,
        round.config.key_hi
    );

    let mut tally = prefill(set, &round.config, round.prefill).expect("prefill failed");
    tally.merge(run_mixed(set, &round.config).expect("stress run failed"));

    assert!(
        conserved(set, &tally),
        "{engine} / {}: conservation violated: tallied ({}, {}), walked ({}, {})",
        round.name,
        tally.net_count,
        tally.net_sum,
        set.quiescent_len(),
        set.quiescent_sum()
    );
    info!(
        "{engine} / {}: ok, {} elements after {} attempts",
        round.name,
        set.quiescent_len(),
        tally.attempted
    );
}

fn rounds() -> Vec<Round> {
    vec![
        Round {
            name: "smoke",
            config: WorkloadConfig {
                workers: 2,
                ops_per_worker: 250,
                key_lo: 10,
                key_hi: 500,
                insert_pct: 50,
                seed: 0xA11CE,
            },
            prefill: 100,
        },
        Round {
            name: "contended",
            config: WorkloadConfig {
                workers: 8,
                ops_per_worker: 625,
                key_lo: 10,
                key_hi: 500,
                insert_pct: 50,
                seed: 0xB0B,
            },
            prefill: 100,
        },
        Round {
            name: "sustained",
            config: WorkloadConfig {
                workers: 8,
                ops_per_worker: 6_250,
                key_lo: 10,
                key_hi: 10_000,
                insert_pct: 50,
                seed: 0xCAFE,
            },
            prefill: 5_000,
        },
    ]
}

fn main() {
    env_logger::init();

    for round in rounds() {
        drive("harris-list", &HarrisList::new(), &round);
        drive("leaf-tree", &LeafTree::new(), &round);
        drive("range-sum-tree", &RangeSumTree::new(), &round);
    }

    // The range engine additionally answers range queries; spot-check one
    // against the quiescent walk.
    let tree = RangeSumTree::new();
    for k in 1..=1_000 {
        tree.insert(k, k);
    }
    assert_eq!(tree.sum(1, 1_000), tree.value_sum());
    info!("range spot-check: ok");

    info!("all rounds passed");
}
