//! Shared batch counters, mutated from concurrent item completions.
//!
//! The runner executes completions on a preemptive tokio runtime, so the
//! counters are plain atomics rather than a mutex-guarded struct. Readers
//! (progress bars) may observe intermediate states; only the end-of-run
//! snapshot is guaranteed consistent.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

#[derive(Debug, Default)]
struct Counters {
    concurrent: AtomicU64,
    attempted: AtomicU64,
    succeeded: AtomicU64,
    failed: AtomicU64,
}

/// Cloneable handle over the counters of one batch run.
#[derive(Debug, Clone, Default)]
pub struct StatsHandle {
    counters: Arc<Counters>,
}

/// Point-in-time view of the counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub concurrent: u64,
    pub attempted: u64,
    pub succeeded: u64,
    pub failed: u64,
}

impl StatsHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark one item as admitted: bumps both `concurrent` and `attempted`.
    pub fn begin_attempt(&self) {
        self.counters.concurrent.fetch_add(1, Ordering::Relaxed);
        self.counters.attempted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_success(&self) {
        self.counters.succeeded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failure(&self) {
        self.counters.failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Mark one item as completed: decrements `concurrent`.
    pub fn end_attempt(&self) {
        self.counters.concurrent.fetch_sub(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            concurrent: self.counters.concurrent.load(Ordering::Relaxed),
            attempted: self.counters.attempted.load(Ordering::Relaxed),
            succeeded: self.counters.succeeded.load(Ordering::Relaxed),
            failed: self.counters.failed.load(Ordering::Relaxed),
        }
    }
}

impl std::fmt::Display for StatsSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "attempted: {} (succeeded: {}, failed: {})",
            self.attempted, self.succeeded, self.failed
        )
    }
}
