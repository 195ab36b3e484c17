//! Execution metrics for the relay runtime.
//!
//! Lock-free atomic counters, safe to bump from any task. Use
//! [`MetricsSnapshot`] for a copyable view.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::Serialize;

/// Shared counters collected by [`crate::ToolOrchestrator`].
#[derive(Debug, Default)]
pub struct ExecutionMetrics {
    /// Calls that passed the chain guards.
    pub invocations: AtomicU64,
    /// Calls whose final outcome was a success.
    pub successes: AtomicU64,
    /// Calls that ended in a failure (returned or raised).
    pub failures: AtomicU64,
    /// Calls rejected by the recursion or chain-deadline guard.
    pub fatal_rejections: AtomicU64,
    /// Handlers abandoned at their deadline.
    pub timeouts: AtomicU64,
    /// Calls served from another identical call's result.
    pub dedup_hits: AtomicU64,
    /// Failures replaced by a recovery handler's outcome.
    pub recoveries: AtomicU64,
}

/// A point-in-time snapshot of [`ExecutionMetrics`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub invocations: u64,
    pub successes: u64,
    pub failures: u64,
    pub fatal_rejections: u64,
    pub timeouts: u64,
    pub dedup_hits: u64,
    pub recoveries: u64,
}

impl ExecutionMetrics {
    /// Creates zeroed metrics wrapped in an [`Arc`].
    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn record_invocation(&self) {
        self.invocations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_success(&self) {
        self.successes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failure(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_fatal_rejection(&self) {
        self.fatal_rejections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_timeout(&self) {
        self.timeouts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_dedup_hit(&self) {
        self.dedup_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_recovery(&self) {
        self.recoveries.fetch_add(1, Ordering::Relaxed);
    }

    /// Returns a point-in-time snapshot of all counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            invocations: self.invocations.load(Ordering::Relaxed),
            successes: self.successes.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            fatal_rejections: self.fatal_rejections.load(Ordering::Relaxed),
            timeouts: self.timeouts.load(Ordering::Relaxed),
            dedup_hits: self.dedup_hits.load(Ordering::Relaxed),
            recoveries: self.recoveries.load(Ordering::Relaxed),
        }
    }
}
