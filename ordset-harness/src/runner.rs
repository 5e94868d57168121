//! Multi-worker stress drivers

use crate::set::ConcurrentSet;
use crate::workload::WorkloadConfig;
use log::debug;
use ordset_core::{Error, OpKind, Result, SumValue};

/// Workers log a progress line this often.
const PROGRESS_EVERY: usize = 5_000;

/// Net effect of a driver run, tallied per worker and merged.
///
/// `net_count` gains 1 per successful insert and loses 1 per successful
/// remove; `net_sum` does the same weighted by key. Once every worker has
/// joined, both must match the quiescent walks.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct StressReport {
    pub net_count: i64,
    pub net_sum: SumValue,
    pub attempted: usize,
}

impl StressReport {
    /// Folds another report (e.g. a prefill pass) into this one.
    pub fn merge(&mut self, other: StressReport) {
        self.net_count += other.net_count;
        self.net_sum += other.net_sum;
        self.attempted += other.attempted;
    }
}

/// Inserts keys from the config's range until `target` distinct keys are
/// present. Single-threaded warmup before a mixed run.
pub fn prefill<S: ConcurrentSet>(
    set: &S,
    config: &WorkloadConfig,
    target: usize,
) -> Result<StressReport> {
    config.validate()?;
    if (target as u64) > config.key_span() {
        return Err(Error::InvalidWorkload(format!(
            "prefill target {target} exceeds the {} distinct keys in range",
            config.key_span()
        )));
    }

    // One stream past the workers' ids, so the fill is decorrelated from
    // every worker.
    let mut ops = config.generator_for(config.workers);
    let mut report = StressReport::default();
    while report.net_count < target as i64 {
        let key = ops.next_key();
        if set.insert(key) {
            report.net_count += 1;
            report.net_sum += key;
        }
        report.attempted += 1;
    }
    debug!(
        "prefill: {} keys present after {} attempts",
        report.net_count, report.attempted
    );
    Ok(report)
}

/// Runs `config.workers` threads of mixed insert/remove traffic against
/// `set` and returns the merged tallies.
pub fn run_mixed<S: ConcurrentSet>(set: &S, config: &WorkloadConfig) -> Result<StressReport> {
    config.validate()?;

    let report = crossbeam::thread::scope(|scope| {
        let mut handles = Vec::with_capacity(config.workers);
        for worker in 0..config.workers {
            let mut ops = config.generator_for(worker);
            handles.push(scope.spawn(move |_| {
                let mut local = StressReport::default();
                for i in 0..config.ops_per_worker {
                    if i > 0 && i % PROGRESS_EVERY == 0 {
                        debug!("worker {worker}: {i}/{} ops", config.ops_per_worker);
                    }
                    let op = ops.next_op();
                    match op.kind {
                        OpKind::Insert => {
                            if set.insert(op.key) {
                                local.net_count += 1;
                                local.net_sum += op.key;
                            }
                        }
                        OpKind::Remove => {
                            if set.remove(op.key) {
                                local.net_count -= 1;
                                local.net_sum -= op.key;
                            }
                        }
                    }
                    local.attempted += 1;
                }
                local
            }));
        }

        let mut merged = StressReport::default();
        for handle in handles {
            merged.merge(handle.join().expect("stress worker panicked"));
        }
        merged
    })
    .expect("stress scope panicked");

    Ok(report)
}

/// Checks the conservation invariants: the quiescent walks must agree
/// with the workers' merged tallies.
pub fn conserved<S: ConcurrentSet>(set: &S, report: &StressReport) -> bool {
    set.quiescent_len() as i64 == report.net_count && set.quiescent_sum() == report.net_sum
}
