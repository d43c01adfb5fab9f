//! Outcome counters for the task pool
//!
//! Task results are discarded by the pool; these counters are the only
//! record of what happened to them.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Live counters shared between the pool handle and its workers.
///
/// Uses atomic operations for thread-safe access without locks.
#[derive(Debug, Default)]
pub struct PoolStats {
    submitted: AtomicU64,
    rejected: AtomicU64,
    started: AtomicU64,
    succeeded: AtomicU64,
    failed: AtomicU64,
    panicked: AtomicU64,
}

/// Point-in-time copy of [`PoolStats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolStatsSnapshot {
    /// Tasks accepted into the queue
    pub submitted: u64,
    /// Submissions refused because the pool was closed
    pub rejected: u64,
    /// Tasks picked up by a worker
    pub started: u64,
    /// Tasks that returned `Ok`
    pub succeeded: u64,
    /// Tasks that returned `Err`
    pub failed: u64,
    /// Tasks that panicked
    pub panicked: u64,
}

impl PoolStatsSnapshot {
    /// Tasks that ran to an outcome, whatever it was
    pub fn finished(&self) -> u64 {
        self.succeeded + self.failed + self.panicked
    }

    /// Tasks accepted but not yet picked up by a worker
    pub fn queued(&self) -> u64 {
        self.submitted.saturating_sub(self.started)
    }

    /// Tasks currently executing on a worker
    pub fn running(&self) -> u64 {
        self.started.saturating_sub(self.finished())
    }
}

impl PoolStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn task_submitted(&self) {
        self.submitted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn task_rejected(&self) {
        self.rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn task_started(&self) {
        self.started.fetch_add(1, Ordering::Relaxed);
    }

    pub fn task_succeeded(&self) {
        self.succeeded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn task_failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn task_panicked(&self) {
        self.panicked.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> PoolStatsSnapshot {
        PoolStatsSnapshot {
            submitted: self.submitted.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            started: self.started.load(Ordering::Relaxed),
            succeeded: self.succeeded.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            panicked: self.panicked.load(Ordering::Relaxed),
        }
    }
}
