//! Thread-safe run statistics
//!
//! The scanner and every worker increment these counters concurrently; the
//! coordinator reads them after the completion barrier. Plain atomic
//! increments with relaxed ordering; no counter value is used to
//! synchronize anything else.

use std::sync::atomic::{AtomicU64, Ordering};

/// Monotonic counters for one run.
#[derive(Debug, Default)]
pub struct RunStatistics {
    total: AtomicU64,
    relevant: AtomicU64,
    accept: AtomicU64,
    reject: AtomicU64,
}

impl RunStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every non-directory entry the scanner visits.
    pub fn record_total(&self) {
        self.total.fetch_add(1, Ordering::Relaxed);
    }

    /// Entries whose MIME type is accepted and that enter the pipeline.
    pub fn record_relevant(&self) {
        self.relevant.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_accept(&self) {
        self.accept.fetch_add(1, Ordering::Relaxed);
    }

    /// Covers extraction failures and Incomplete classifications alike.
    pub fn record_reject(&self) {
        self.reject.fetch_add(1, Ordering::Relaxed);
    }

    /// Point-in-time view of the counters.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            total: self.total.load(Ordering::Relaxed),
            relevant: self.relevant.load(Ordering::Relaxed),
            accept: self.accept.load(Ordering::Relaxed),
            reject: self.reject.load(Ordering::Relaxed),
        }
    }
}

/// Counter values captured after (or during, best-effort) a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub total: u64,
    pub relevant: u64,
    pub accept: u64,
    pub reject: u64,
}
