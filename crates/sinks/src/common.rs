//! Common types shared by all stores
//!
//! Errors and write metrics.

use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;

/// Result type for store operations
pub type Result<T> = std::result::Result<T, SinkError>;

/// Write metrics shared by all store types
#[derive(Debug, Default)]
pub struct SinkMetrics {
    /// Batches successfully written
    pub batches_written: AtomicU64,

    /// Events successfully written (sum of batch lengths)
    pub events_written: AtomicU64,

    /// Failed `write_batch` calls
    pub write_errors: AtomicU64,

    /// Events contained in failed batches
    pub events_failed: AtomicU64,
}

impl SinkMetrics {
    /// Create new metrics instance
    pub const fn new() -> Self {
        Self {
            batches_written: AtomicU64::new(0),
            events_written: AtomicU64::new(0),
            write_errors: AtomicU64::new(0),
            events_failed: AtomicU64::new(0),
        }
    }

    /// Record a successfully written batch
    #[inline]
    pub fn batch_written(&self, event_count: u64) {
        self.batches_written.fetch_add(1, Ordering::Relaxed);
        self.events_written.fetch_add(event_count, Ordering::Relaxed);
    }

    /// Record a failed batch
    #[inline]
    pub fn write_error(&self, event_count: u64) {
        self.write_errors.fetch_add(1, Ordering::Relaxed);
        self.events_failed.fetch_add(event_count, Ordering::Relaxed);
    }

    /// Get snapshot of all metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            batches_written: self.batches_written.load(Ordering::Relaxed),
            events_written: self.events_written.load(Ordering::Relaxed),
            write_errors: self.write_errors.load(Ordering::Relaxed),
            events_failed: self.events_failed.load(Ordering::Relaxed),
        }
    }

    /// Reset all metrics to zero
    pub fn reset(&self) {
        self.batches_written.store(0, Ordering::Relaxed);
        self.events_written.store(0, Ordering::Relaxed);
        self.write_errors.store(0, Ordering::Relaxed);
        self.events_failed.store(0, Ordering::Relaxed);
    }
}

/// Point-in-time snapshot of store metrics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub batches_written: u64,
    pub events_written: u64,
    pub write_errors: u64,
    pub events_failed: u64,
}

/// Store errors
#[derive(Debug, Error)]
pub enum SinkError {
    /// Store could not be opened
    #[error("failed to open store: {0}")]
    Init(String),

    /// Write attempted before `open` or after `close`
    #[error("store '{0}' is not open")]
    NotOpen(String),

    /// Failed to write data
    #[error("write failed: {0}")]
    Write(String),

    /// Underlying database error
    #[error("database error: {0}")]
    Database(#[from] turso::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Metadata could not be serialized
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl SinkError {
    /// Create an initialization error
    pub fn init(msg: impl Into<String>) -> Self {
        Self::Init(msg.into())
    }

    /// Create a not-open error for the named store
    pub fn not_open(store: impl Into<String>) -> Self {
        Self::NotOpen(store.into())
    }

    /// Create a write error
    pub fn write(msg: impl Into<String>) -> Self {
        Self::Write(msg.into())
    }
}

#[cfg(test)]
#[path = "common_test.rs"]
mod common_test;
