//! Dispatch metrics for observability

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for a single dispatcher
#[derive(Debug, Default)]
pub struct DispatchMetrics {
    /// Connections produced by prepare
    connection_count: AtomicU64,
    /// Targets no strategy accepted
    unmatched_count: AtomicU64,
    /// Targets whose message failed to render
    render_failure_count: AtomicU64,
    /// Connections delivered
    sent_count: AtomicU64,
    /// Connections whose delivery failed
    failure_count: AtomicU64,
    /// Completed send calls
    batch_count: AtomicU64,
}

impl DispatchMetrics {
    /// Create new metrics instance
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connection_count(&self) -> u64 {
        self.connection_count.load(Ordering::Relaxed)
    }

    pub fn inc_connection_count(&self) {
        self.connection_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn unmatched_count(&self) -> u64 {
        self.unmatched_count.load(Ordering::Relaxed)
    }

    pub fn inc_unmatched_count(&self) {
        self.unmatched_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn render_failure_count(&self) -> u64 {
        self.render_failure_count.load(Ordering::Relaxed)
    }

    pub fn inc_render_failure_count(&self) {
        self.render_failure_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn sent_count(&self) -> u64 {
        self.sent_count.load(Ordering::Relaxed)
    }

    pub fn inc_sent_count(&self) {
        self.sent_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn failure_count(&self) -> u64 {
        self.failure_count.load(Ordering::Relaxed)
    }

    pub fn inc_failure_count(&self) {
        self.failure_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn batch_count(&self) -> u64 {
        self.batch_count.load(Ordering::Relaxed)
    }

    pub fn inc_batch_count(&self) {
        self.batch_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Get snapshot of all metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            connection_count: self.connection_count(),
            unmatched_count: self.unmatched_count(),
            render_failure_count: self.render_failure_count(),
            sent_count: self.sent_count(),
            failure_count: self.failure_count(),
            batch_count: self.batch_count(),
        }
    }
}

/// Snapshot of dispatch metrics (for reporting)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub connection_count: u64,
    pub unmatched_count: u64,
    pub render_failure_count: u64,
    pub sent_count: u64,
    pub failure_count: u64,
    pub batch_count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_reflects_counters() {
        let metrics = DispatchMetrics::new();
        metrics.inc_connection_count();
        metrics.inc_connection_count();
        metrics.inc_unmatched_count();
        metrics.inc_sent_count();
        metrics.inc_failure_count();
        metrics.inc_batch_count();

        let snapshot = metrics.snapshot();
        assert_eq!(
            snapshot,
            MetricsSnapshot {
                connection_count: 2,
                unmatched_count: 1,
                render_failure_count: 0,
                sent_count: 1,
                failure_count: 1,
                batch_count: 1,
            }
        );
    }
}
