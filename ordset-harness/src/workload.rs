//! Seeded pseudo-random operation streams

use ordset_core::{Error, Key, OpKind, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// One step of a generated workload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkloadOp {
    pub kind: OpKind,
    pub key: Key,
}

/// Tunables for a stress run.
///
/// # Example
///
/// ```
/// use ordset_harness::WorkloadConfig;
///
/// let config = WorkloadConfig {
///     workers: 8,
///     ops_per_worker: 50_000,
///     key_lo: 10,
///     key_hi: 10_000,
///     insert_pct: 50,
///     ..Default::default()
/// };
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct WorkloadConfig {
    /// Number of worker threads
    pub workers: usize,

    /// Operations each worker performs
    pub ops_per_worker: usize,

    /// Inclusive lower bound of the key range
    pub key_lo: Key,

    /// Inclusive upper bound of the key range
    pub key_hi: Key,

    /// Percentage of operations that are inserts (the rest are removes)
    pub insert_pct: u32,

    /// Base seed; each worker derives its own decorrelated stream
    pub seed: u64,
}

impl Default for WorkloadConfig {
    fn default() -> Self {
        Self {
            workers: num_cpus::get(),
            ops_per_worker: 10_000,
            key_lo: 1,
            key_hi: 1 << 14,
            insert_pct: 50,
            seed: 0x0255_ED15,
        }
    }
}

impl WorkloadConfig {
    /// Checks the configuration for nonsense values.
    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(Error::InvalidWorkload("worker count is zero".into()));
        }
        if self.ops_per_worker == 0 {
            return Err(Error::InvalidWorkload(
                "operation count per worker is zero".into(),
            ));
        }
        if self.key_lo > self.key_hi {
            return Err(Error::InvalidRange {
                lo: self.key_lo,
                hi: self.key_hi,
            });
        }
        if self.insert_pct > 100 {
            return Err(Error::InvalidWorkload(format!(
                "insert percentage {} exceeds 100",
                self.insert_pct
            )));
        }
        Ok(())
    }

    /// Number of distinct keys the range can hold, saturating on the
    /// full-domain range.
    pub fn key_span(&self) -> u64 {
        self.key_hi.abs_diff(self.key_lo).saturating_add(1)
    }

    /// Generator for one worker. Distinct workers get decorrelated
    /// streams derived from the base seed.
    pub fn generator_for(&self, worker: usize) -> OpGenerator {
        let seed = self
            .seed
            .wrapping_mul(1000)
            .wrapping_add(worker as u64);
        OpGenerator::new(seed, self.key_lo, self.key_hi, self.insert_pct)
    }
}

/// An endless stream of insert/remove operations over a key range.
pub struct OpGenerator {
    rng: StdRng,
    lo: Key,
    hi: Key,
    insert_pct: u32,
}

impl OpGenerator {
    pub fn new(seed: u64, lo: Key, hi: Key, insert_pct: u32) -> Self {
        OpGenerator {
            rng: StdRng::seed_from_u64(seed),
            lo,
            hi,
            insert_pct,
        }
    }

    /// The next operation in the stream.
    pub fn next_op(&mut self) -> WorkloadOp {
        let kind = if self.rng.gen_range(0..100) < self.insert_pct {
            OpKind::Insert
        } else {
            OpKind::Remove
        };
        let key = self.rng.gen_range(self.lo..=self.hi);
        WorkloadOp { kind, key }
    }

    /// The next key in the stream, ignoring the operation mix. Used by
    /// insert-only prefill passes.
    pub fn next_key(&mut self) -> Key {
        self.rng.gen_range(self.lo..=self.hi)
    }
}

impl Iterator for OpGenerator {
    type Item = WorkloadOp;

    fn next(&mut self) -> Option<WorkloadOp> {
        Some(self.next_op())
    }
}
