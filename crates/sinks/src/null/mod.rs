//! Null store - discards all events
//!
//! Used for benchmarking the gateway and scheduler without any storage I/O.
//! Every batch is counted and dropped.
//!
//! # Example
//!
//! ```toml
//! [storage]
//! type = "null"
//! ```

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use firehose_protocol::Event;

use crate::common::{MetricsSnapshot, Result, SinkError, SinkMetrics};
use crate::store::EventStore;

/// Store that accepts and discards every batch
#[derive(Debug)]
pub struct NullStore {
    name: String,
    open: AtomicBool,
    metrics: SinkMetrics,
}

impl NullStore {
    /// Create a new null store
    pub fn new() -> Self {
        Self::with_name("null")
    }

    /// Create a new null store with a custom name
    pub fn with_name(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            open: AtomicBool::new(false),
            metrics: SinkMetrics::new(),
        }
    }
}

impl Default for NullStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventStore for NullStore {
    fn name(&self) -> &str {
        &self.name
    }

    async fn open(&self) -> Result<()> {
        self.open.store(true, Ordering::Release);
        tracing::info!(store = %self.name, "null store opened, events will be discarded");
        Ok(())
    }

    async fn write_batch(&self, events: &[Event]) -> Result<usize> {
        if !self.open.load(Ordering::Acquire) {
            return Err(SinkError::not_open(&self.name));
        }
        self.metrics.batch_written(events.len() as u64);
        Ok(events.len())
    }

    async fn close(&self) -> Result<()> {
        self.open.store(false, Ordering::Release);

        let snapshot = self.metrics.snapshot();
        tracing::info!(
            store = %self.name,
            batches = snapshot.batches_written,
            events = snapshot.events_written,
            "null store closed"
        );
        Ok(())
    }

    fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }
}
