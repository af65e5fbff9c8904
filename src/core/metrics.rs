//! Logger metrics for observability
//!
//! Counters describing dispatch health: how many records were emitted,
//! how many sink deliveries succeeded or failed, and how often files rotated.

use std::sync::atomic::{AtomicU64, Ordering};

/// Metrics for logger observability
///
/// # Example
///
/// ```
/// use rust_log_loader::LoggerMetrics;
///
/// let metrics = LoggerMetrics::new();
///
/// metrics.record_emitted();
/// metrics.record_delivered();
/// metrics.record_failure();
///
/// assert_eq!(metrics.emitted(), 1);
/// assert_eq!(metrics.failure_rate(), 50.0);
/// ```
#[derive(Debug)]
pub struct LoggerMetrics {
    /// Records handed to the registry
    emitted: AtomicU64,

    /// Successful (record, sink) deliveries
    delivered: AtomicU64,

    /// (record, sink) pairs rejected by a level gate, filter or formatter
    filtered: AtomicU64,

    /// Sink formatting, write or panic failures
    failures: AtomicU64,

    /// Completed file rotations
    rotations: AtomicU64,

    /// Records written with values that had no JSON form
    serialization_warnings: AtomicU64,
}

impl LoggerMetrics {
    /// Create a new metrics instance with all counters at zero
    pub const fn new() -> Self {
        Self {
            emitted: AtomicU64::new(0),
            delivered: AtomicU64::new(0),
            filtered: AtomicU64::new(0),
            failures: AtomicU64::new(0),
            rotations: AtomicU64::new(0),
            serialization_warnings: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn emitted(&self) -> u64 {
        self.emitted.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn delivered(&self) -> u64 {
        self.delivered.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn filtered(&self) -> u64 {
        self.filtered.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn failures(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn rotations(&self) -> u64 {
        self.rotations.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn serialization_warnings(&self) -> u64 {
        self.serialization_warnings.load(Ordering::Relaxed)
    }

    /// Record an emitted record; returns the previous count
    #[inline]
    pub fn record_emitted(&self) -> u64 {
        self.emitted.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_delivered(&self) -> u64 {
        self.delivered.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_filtered(&self) -> u64 {
        self.filtered.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_failure(&self) -> u64 {
        self.failures.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_rotation(&self) -> u64 {
        self.rotations.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_serialization_warning(&self) -> u64 {
        self.serialization_warnings.fetch_add(1, Ordering::Relaxed)
    }

    /// Failed deliveries as a percentage of attempted ones (0.0 - 100.0)
    ///
    /// Returns 0.0 if nothing was delivered yet.
    pub fn failure_rate(&self) -> f64 {
        let failed = self.failures() as f64;
        let total = self.delivered() as f64 + failed;
        if total == 0.0 {
            0.0
        } else {
            (failed / total) * 100.0
        }
    }

    /// Reset all metrics to zero
    pub fn reset(&self) {
        self.emitted.store(0, Ordering::Relaxed);
        self.delivered.store(0, Ordering::Relaxed);
        self.filtered.store(0, Ordering::Relaxed);
        self.failures.store(0, Ordering::Relaxed);
        self.rotations.store(0, Ordering::Relaxed);
        self.serialization_warnings.store(0, Ordering::Relaxed);
    }
}

impl Default for LoggerMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for LoggerMetrics {
    /// Create a snapshot of the current metrics values
    fn clone(&self) -> Self {
        Self {
            emitted: AtomicU64::new(self.emitted()),
            delivered: AtomicU64::new(self.delivered()),
            filtered: AtomicU64::new(self.filtered()),
            failures: AtomicU64::new(self.failures()),
            rotations: AtomicU64::new(self.rotations()),
            serialization_warnings: AtomicU64::new(self.serialization_warnings()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_new() {
        let metrics = LoggerMetrics::new();
        assert_eq!(metrics.emitted(), 0);
        assert_eq!(metrics.delivered(), 0);
        assert_eq!(metrics.filtered(), 0);
        assert_eq!(metrics.failures(), 0);
        assert_eq!(metrics.rotations(), 0);
        assert_eq!(metrics.serialization_warnings(), 0);
    }

    #[test]
    fn test_metrics_record_returns_previous() {
        let metrics = LoggerMetrics::new();
        assert_eq!(metrics.record_failure(), 0);
        assert_eq!(metrics.failures(), 1);
        metrics.record_failure();
        assert_eq!(metrics.failures(), 2);
    }

    #[test]
    fn test_metrics_failure_rate() {
        let metrics = LoggerMetrics::new();
        assert_eq!(metrics.failure_rate(), 0.0);

        for _ in 0..100 {
            metrics.record_delivered();
        }
        assert_eq!(metrics.failure_rate(), 0.0);

        for _ in 0..10 {
            metrics.record_failure();
        }
        let rate = metrics.failure_rate();
        assert!(rate > 9.0 && rate < 10.0, "Failure rate was {}", rate);
    }

    #[test]
    fn test_metrics_reset() {
        let metrics = LoggerMetrics::new();
        metrics.record_emitted();
        metrics.record_rotation();
        metrics.record_serialization_warning();

        metrics.reset();

        assert_eq!(metrics.emitted(), 0);
        assert_eq!(metrics.rotations(), 0);
        assert_eq!(metrics.serialization_warnings(), 0);
    }

    #[test]
    fn test_metrics_clone_is_snapshot() {
        let metrics = LoggerMetrics::new();
        metrics.record_rotation();

        let snapshot = metrics.clone();
        metrics.record_rotation();

        assert_eq!(metrics.rotations(), 2);
        assert_eq!(snapshot.rotations(), 1);
    }
}
