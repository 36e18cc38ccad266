//! Dispatch metrics for observability
//!
//! Counters describing how events flowed through the registry: how many
//! were dispatched, how many appender writes were accepted, and how many
//! failed or panicked.

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for registry health
///
/// # Example
///
/// ```
/// use rust_log_dispatch::LoggerMetrics;
///
/// let metrics = LoggerMetrics::new();
///
/// metrics.record_dispatched();
/// metrics.record_accepted();
/// metrics.record_failure();
///
/// assert_eq!(metrics.events_dispatched(), 1);
/// assert_eq!(metrics.writes_accepted(), 1);
/// assert_eq!(metrics.failure_rate(), 50.0);
/// ```
#[derive(Debug)]
pub struct LoggerMetrics {
    /// Events handed to the dispatcher after level filtering
    events_dispatched: AtomicU64,

    /// Events that passed the category threshold but had no appender bound
    events_unrouted: AtomicU64,

    /// Individual appender writes that were accepted
    writes_accepted: AtomicU64,

    /// Individual appender writes that returned an error
    appender_failures: AtomicU64,

    /// Appender calls that panicked
    appender_panics: AtomicU64,
}

impl LoggerMetrics {
    /// Create a new metrics instance with all counters at zero
    pub const fn new() -> Self {
        Self {
            events_dispatched: AtomicU64::new(0),
            events_unrouted: AtomicU64::new(0),
            writes_accepted: AtomicU64::new(0),
            appender_failures: AtomicU64::new(0),
            appender_panics: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn events_dispatched(&self) -> u64 {
        self.events_dispatched.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn events_unrouted(&self) -> u64 {
        self.events_unrouted.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn writes_accepted(&self) -> u64 {
        self.writes_accepted.load(Ordering::Relaxed)
    }

    /// Writes rejected with an error, panics excluded
    #[inline]
    pub fn appender_failures(&self) -> u64 {
        self.appender_failures.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn appender_panics(&self) -> u64 {
        self.appender_panics.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn record_dispatched(&self) -> u64 {
        self.events_dispatched.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_unrouted(&self) -> u64 {
        self.events_unrouted.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_accepted(&self) -> u64 {
        self.writes_accepted.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_failure(&self) -> u64 {
        self.appender_failures.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_panic(&self) -> u64 {
        self.appender_panics.fetch_add(1, Ordering::Relaxed)
    }

    /// Share of appender writes that failed or panicked, as a percentage
    ///
    /// Returns 0.0 if no writes have been attempted.
    pub fn failure_rate(&self) -> f64 {
        let failed = (self.appender_failures() + self.appender_panics()) as f64;
        let total = self.writes_accepted() as f64 + failed;
        if total == 0.0 {
            0.0
        } else {
            (failed / total) * 100.0
        }
    }

    /// Reset all metrics to zero
    pub fn reset(&self) {
        self.events_dispatched.store(0, Ordering::Relaxed);
        self.events_unrouted.store(0, Ordering::Relaxed);
        self.writes_accepted.store(0, Ordering::Relaxed);
        self.appender_failures.store(0, Ordering::Relaxed);
        self.appender_panics.store(0, Ordering::Relaxed);
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
            events_dispatched: AtomicU64::new(self.events_dispatched()),
            events_unrouted: AtomicU64::new(self.events_unrouted()),
            writes_accepted: AtomicU64::new(self.writes_accepted()),
            appender_failures: AtomicU64::new(self.appender_failures()),
            appender_panics: AtomicU64::new(self.appender_panics()),
        }
    }
}
