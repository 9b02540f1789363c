//! Scheduler flush metrics
//!
//! Atomic counters for tracking flush activity.
//! All operations use relaxed ordering; values are eventually consistent.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::Serialize;

use crate::error::FlushError;
use crate::scheduler::FlushTrigger;

/// Metrics for the batch scheduler
///
/// # Thread Safety
///
/// All methods are safe to call from multiple threads concurrently.
#[derive(Debug, Default)]
pub struct FlushMetrics {
    /// Flushes started by the size trigger
    size_triggered: AtomicU64,

    /// Flushes started by the time trigger
    time_triggered: AtomicU64,

    /// Batches confirmed by the store
    batches_flushed: AtomicU64,

    /// Events confirmed by the store
    events_flushed: AtomicU64,

    /// Batches whose write failed (any cause)
    batches_failed: AtomicU64,

    /// Events lost in failed batches
    events_failed: AtomicU64,

    /// Failed writes caused by the write timeout
    timeouts: AtomicU64,

    /// Failed writes caused by a panic inside the store
    panics: AtomicU64,

    /// Total time spent in successful writes, nanoseconds
    flush_duration_ns: AtomicU64,

    /// Size of the most recent successful batch
    last_batch_size: AtomicU64,
}

impl FlushMetrics {
    /// Create new metrics instance with all counters at zero
    #[inline]
    pub const fn new() -> Self {
        Self {
            size_triggered: AtomicU64::new(0),
            time_triggered: AtomicU64::new(0),
            batches_flushed: AtomicU64::new(0),
            events_flushed: AtomicU64::new(0),
            batches_failed: AtomicU64::new(0),
            events_failed: AtomicU64::new(0),
            timeouts: AtomicU64::new(0),
            panics: AtomicU64::new(0),
            flush_duration_ns: AtomicU64::new(0),
            last_batch_size: AtomicU64::new(0),
        }
    }

    /// Record which trigger started a flush
    #[inline]
    pub fn record_trigger(&self, trigger: FlushTrigger) {
        let counter = match trigger {
            FlushTrigger::Size => &self.size_triggered,
            FlushTrigger::Time => &self.time_triggered,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a batch confirmed by the store
    #[inline]
    pub fn record_flushed(&self, event_count: u64, duration: Duration) {
        self.batches_flushed.fetch_add(1, Ordering::Relaxed);
        self.events_flushed.fetch_add(event_count, Ordering::Relaxed);
        self.flush_duration_ns
            .fetch_add(duration.as_nanos() as u64, Ordering::Relaxed);
        self.last_batch_size.store(event_count, Ordering::Relaxed);
    }

    /// Record a failed batch
    #[inline]
    pub fn record_failed(&self, event_count: u64, error: &FlushError) {
        self.batches_failed.fetch_add(1, Ordering::Relaxed);
        self.events_failed.fetch_add(event_count, Ordering::Relaxed);
        match error {
            FlushError::Timeout(_) => {
                self.timeouts.fetch_add(1, Ordering::Relaxed);
            }
            FlushError::Panic(_) => {
                self.panics.fetch_add(1, Ordering::Relaxed);
            }
            FlushError::Store(_) => {}
        }
    }

    /// Get a snapshot of all metrics
    pub fn snapshot(&self) -> FlushMetricsSnapshot {
        FlushMetricsSnapshot {
            size_triggered: self.size_triggered.load(Ordering::Relaxed),
            time_triggered: self.time_triggered.load(Ordering::Relaxed),
            batches_flushed: self.batches_flushed.load(Ordering::Relaxed),
            events_flushed: self.events_flushed.load(Ordering::Relaxed),
            batches_failed: self.batches_failed.load(Ordering::Relaxed),
            events_failed: self.events_failed.load(Ordering::Relaxed),
            timeouts: self.timeouts.load(Ordering::Relaxed),
            panics: self.panics.load(Ordering::Relaxed),
            flush_duration_ns: self.flush_duration_ns.load(Ordering::Relaxed),
            last_batch_size: self.last_batch_size.load(Ordering::Relaxed),
        }
    }

    /// Reset all metrics to zero
    pub fn reset(&self) {
        self.size_triggered.store(0, Ordering::Relaxed);
        self.time_triggered.store(0, Ordering::Relaxed);
        self.batches_flushed.store(0, Ordering::Relaxed);
        self.events_flushed.store(0, Ordering::Relaxed);
        self.batches_failed.store(0, Ordering::Relaxed);
        self.events_failed.store(0, Ordering::Relaxed);
        self.timeouts.store(0, Ordering::Relaxed);
        self.panics.store(0, Ordering::Relaxed);
        self.flush_duration_ns.store(0, Ordering::Relaxed);
        self.last_batch_size.store(0, Ordering::Relaxed);
    }
}

/// Point-in-time snapshot of flush metrics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct FlushMetricsSnapshot {
    pub size_triggered: u64,
    pub time_triggered: u64,
    pub batches_flushed: u64,
    pub events_flushed: u64,
    pub batches_failed: u64,
    pub events_failed: u64,
    pub timeouts: u64,
    pub panics: u64,
    pub flush_duration_ns: u64,
    pub last_batch_size: u64,
}

impl FlushMetricsSnapshot {
    /// Average duration of a successful write
    ///
    /// Returns None if nothing has been flushed.
    #[inline]
    pub fn avg_flush_duration(&self) -> Option<Duration> {
        if self.batches_flushed == 0 {
            None
        } else {
            Some(Duration::from_nanos(
                self.flush_duration_ns / self.batches_flushed,
            ))
        }
    }

    /// Calculate the difference from another snapshot
    ///
    /// `last_batch_size` is a gauge and is carried over unchanged.
    #[inline]
    pub fn diff(&self, previous: &FlushMetricsSnapshot) -> FlushMetricsSnapshot {
        FlushMetricsSnapshot {
            size_triggered: self.size_triggered.saturating_sub(previous.size_triggered),
            time_triggered: self.time_triggered.saturating_sub(previous.time_triggered),
            batches_flushed: self
                .batches_flushed
                .saturating_sub(previous.batches_flushed),
            events_flushed: self.events_flushed.saturating_sub(previous.events_flushed),
            batches_failed: self.batches_failed.saturating_sub(previous.batches_failed),
            events_failed: self.events_failed.saturating_sub(previous.events_failed),
            timeouts: self.timeouts.saturating_sub(previous.timeouts),
            panics: self.panics.saturating_sub(previous.panics),
            flush_duration_ns: self
                .flush_duration_ns
                .saturating_sub(previous.flush_duration_ns),
            last_batch_size: self.last_batch_size,
        }
    }
}

// ============================================================================
// Backpressure Tracker - Rate-limited logging for production visibility
// ============================================================================

/// Rate-limited logging of admission rejections
///
/// Aggregates rejected events and logs a summary every second instead of
/// one line per event, so a saturated buffer does not also flood the log.
///
/// # Thresholds
///
/// - >0 rejections/sec: WARN level
/// - >100 rejections/sec: ERROR level (storage cannot keep up)
pub struct BackpressureTracker {
    /// Rejections in current interval
    interval_drops: AtomicU64,
    /// Last log time (epoch milliseconds)
    last_log_ms: AtomicU64,
}

/// Log interval in milliseconds
const LOG_INTERVAL_MS: u64 = 1000;
/// Critical threshold - rejections/sec that triggers ERROR level
const CRITICAL_DROP_THRESHOLD: u64 = 100;

impl BackpressureTracker {
    /// Create a new tracker
    pub fn new() -> Self {
        Self {
            interval_drops: AtomicU64::new(0),
            last_log_ms: AtomicU64::new(Self::now_ms()),
        }
    }

    /// Record a rejected event and log a summary if the interval elapsed
    ///
    /// Returns true if a log was emitted.
    pub fn record_drop(&self, queue_capacity: usize) -> bool {
        self.interval_drops.fetch_add(1, Ordering::Relaxed);
        self.maybe_log(queue_capacity)
    }

    fn maybe_log(&self, queue_capacity: usize) -> bool {
        let now = Self::now_ms();
        let last = self.last_log_ms.load(Ordering::Relaxed);

        if now.saturating_sub(last) < LOG_INTERVAL_MS {
            return false;
        }

        // Claim the log slot so concurrent callers don't log twice
        if self
            .last_log_ms
            .compare_exchange(last, now, Ordering::SeqCst, Ordering::Relaxed)
            .is_err()
        {
            return false;
        }

        let drops = self.interval_drops.swap(0, Ordering::Relaxed);
        if drops == 0 {
            return false;
        }

        if drops > CRITICAL_DROP_THRESHOLD {
            tracing::error!(
                rejected_events = drops,
                capacity = queue_capacity,
                threshold = CRITICAL_DROP_THRESHOLD,
                "CRITICAL: buffer full - storage cannot keep up with ingestion"
            );
        } else {
            tracing::warn!(
                rejected_events = drops,
                capacity = queue_capacity,
                "backpressure: events rejected in last second"
            );
        }

        true
    }

    #[inline]
    fn now_ms() -> u64 {
        use std::time::{SystemTime, UNIX_EPOCH};
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }

    /// Get the current drop count (for testing)
    #[cfg(test)]
    pub fn current_drops(&self) -> u64 {
        self.interval_drops.load(Ordering::Relaxed)
    }
}

impl Default for BackpressureTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for BackpressureTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackpressureTracker")
            .field(
                "interval_drops",
                &self.interval_drops.load(Ordering::Relaxed),
            )
            .finish()
    }
}
