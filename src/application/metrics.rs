//! Observability metrics for admission control.
//!
//! Counts decisions and evictions so operators can see how often clients hit
//! their quota.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Metrics tracking admission statistics.
///
/// All metrics use atomic operations for thread-safe updates and reads.
/// Clones share the same counters.
#[derive(Debug, Clone)]
pub struct Metrics {
    inner: Arc<MetricsInner>,
}

#[derive(Debug, Default)]
struct MetricsInner {
    /// Requests admitted by the counter
    requests_allowed: AtomicU64,
    /// Requests rejected by the counter
    requests_rejected: AtomicU64,
    /// Requests admitted because limiting is disabled
    requests_bypassed: AtomicU64,
    /// Counters removed by idle or capacity eviction
    counters_evicted: AtomicU64,
}

impl Metrics {
    /// Create a new metrics tracker.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(MetricsInner::default()),
        }
    }

    pub(crate) fn record_allowed(&self) {
        self.inner.requests_allowed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_rejected(&self) {
        self.inner.requests_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_bypassed(&self) {
        self.inner.requests_bypassed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_eviction(&self) {
        self.record_evictions(1);
    }

    pub(crate) fn record_evictions(&self, count: u64) {
        self.inner
            .counters_evicted
            .fetch_add(count, Ordering::Relaxed);
    }

    /// Get the total number of requests admitted by the counter.
    pub fn requests_allowed(&self) -> u64 {
        self.inner.requests_allowed.load(Ordering::Relaxed)
    }

    /// Get the total number of requests rejected.
    pub fn requests_rejected(&self) -> u64 {
        self.inner.requests_rejected.load(Ordering::Relaxed)
    }

    /// Get the total number of requests admitted while limiting was disabled.
    pub fn requests_bypassed(&self) -> u64 {
        self.inner.requests_bypassed.load(Ordering::Relaxed)
    }

    /// Get the total number of counters evicted.
    pub fn counters_evicted(&self) -> u64 {
        self.inner.counters_evicted.load(Ordering::Relaxed)
    }

    /// Get a snapshot of all metrics.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            requests_allowed: self.requests_allowed(),
            requests_rejected: self.requests_rejected(),
            requests_bypassed: self.requests_bypassed(),
            counters_evicted: self.counters_evicted(),
        }
    }

    /// Reset all metrics to zero.
    pub fn reset(&self) {
        self.inner.requests_allowed.store(0, Ordering::Relaxed);
        self.inner.requests_rejected.store(0, Ordering::Relaxed);
        self.inner.requests_bypassed.store(0, Ordering::Relaxed);
        self.inner.counters_evicted.store(0, Ordering::Relaxed);
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// A point-in-time snapshot of metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub requests_allowed: u64,
    pub requests_rejected: u64,
    pub requests_bypassed: u64,
    pub counters_evicted: u64,
}

impl MetricsSnapshot {
    /// Ratio of rejected requests to all requests (0.0 to 1.0).
    ///
    /// Returns 0.0 if no requests have been processed.
    pub fn rejection_rate(&self) -> f64 {
        let total = self.total_requests();
        if total == 0 {
            0.0
        } else {
            self.requests_rejected as f64 / total as f64
        }
    }

    /// All requests seen, bypassed ones included.
    pub fn total_requests(&self) -> u64 {
        self.requests_allowed
            .saturating_add(self.requests_rejected)
            .saturating_add(self.requests_bypassed)
    }
}
