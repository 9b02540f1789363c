//! LifecycleController - startup and graceful shutdown of the pipeline
//!
//! Startup opens the store first and only starts the scheduler once the store
//! is usable. Shutdown runs a fixed sequence:
//!
//! 1. close the buffer (new admissions are rejected)
//! 2. stop the scheduler loop (an in-progress flush completes)
//! 3. drain the buffer with a single final write
//! 4. close the store
//!
//! Shutdown always runs to the end. A failed drain or store close is recorded
//! in the returned `ShutdownReport` rather than aborting the sequence.

use std::sync::Arc;
use std::time::{Duration, Instant};

use firehose_config::SchedulerConfig;
use firehose_sinks::EventStore;
use tracing::{error, info, warn};

use crate::buffer::{BufferStats, EventBuffer};
use crate::error::{PipelineError, Result};
use crate::metrics::{FlushMetrics, FlushMetricsSnapshot};
use crate::scheduler::{BatchScheduler, DrainOutcome, SchedulerState};

/// Owns the running pipeline: buffer, store and scheduler
pub struct LifecycleController {
    buffer: Arc<EventBuffer>,
    store: Arc<dyn EventStore>,
    scheduler: BatchScheduler,
    started_at: Instant,
}

/// What happened during shutdown
#[derive(Debug, Clone)]
pub struct ShutdownReport {
    /// Outcome of the final drain write
    pub drain: DrainOutcome,
    /// Buffer counters after the drain
    pub final_stats: BufferStats,
    /// Scheduler flush counters after the drain
    pub flush: FlushMetricsSnapshot,
    /// Error returned by the store's `close`, if any
    pub store_close_error: Option<String>,
    /// Time between startup and the end of shutdown
    pub uptime: Duration,
}

impl ShutdownReport {
    /// Events handed to the final write
    pub fn drained(&self) -> usize {
        self.drain.drained()
    }

    /// Drain succeeded and the store closed cleanly
    pub fn is_clean(&self) -> bool {
        self.drain.is_success() && self.store_close_error.is_none()
    }

    /// The drain failure as a pipeline error
    pub fn drain_error(&self) -> Option<PipelineError> {
        match &self.drain {
            DrainOutcome::Failed { events, reason } => Some(PipelineError::ShutdownFlushFailure {
                events: *events,
                reason: reason.clone(),
            }),
            _ => None,
        }
    }
}

impl LifecycleController {
    /// Open the store and start the scheduler
    ///
    /// # Errors
    ///
    /// - `StartupFailure` if the store cannot be opened; the scheduler is
    ///   never started
    /// - `InvalidConfig` if the scheduler configuration is rejected
    pub async fn start(
        buffer: Arc<EventBuffer>,
        store: Arc<dyn EventStore>,
        config: SchedulerConfig,
    ) -> Result<Self> {
        // Reject bad config before touching the store
        let mut scheduler = BatchScheduler::new(Arc::clone(&buffer), Arc::clone(&store), config)?;

        store
            .open()
            .await
            .map_err(|source| PipelineError::StartupFailure {
                store: store.name().to_string(),
                source,
            })?;
        info!(store = %store.name(), "store opened");

        scheduler.start()?;

        info!(capacity = buffer.capacity(), "pipeline started");

        Ok(Self {
            buffer,
            store,
            scheduler,
            started_at: Instant::now(),
        })
    }

    pub fn buffer(&self) -> &Arc<EventBuffer> {
        &self.buffer
    }

    pub fn store(&self) -> &Arc<dyn EventStore> {
        &self.store
    }

    pub fn scheduler_state(&self) -> SchedulerState {
        self.scheduler.state()
    }

    /// Flush metrics, shareable with reporters
    pub fn flush_metrics(&self) -> Arc<FlushMetrics> {
        self.scheduler.metrics()
    }

    pub fn uptime(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Run the shutdown sequence
    pub async fn shutdown(mut self) -> ShutdownReport {
        info!("pipeline shutting down");

        self.buffer.close();

        if let Err(e) = self.scheduler.stop().await {
            warn!(error = %e, "scheduler was not running at shutdown");
        }

        let drain = match self.scheduler.drain().await {
            Ok(outcome) => outcome,
            Err(e) => {
                // Only reachable if the scheduler never ran; nothing was extracted
                warn!(error = %e, "drain skipped");
                DrainOutcome::Empty
            }
        };

        let store_close_error = match self.store.close().await {
            Ok(()) => None,
            Err(e) => {
                error!(store = %self.store.name(), error = %e, "store close failed");
                Some(e.to_string())
            }
        };

        let report = ShutdownReport {
            drain,
            final_stats: self.buffer.stats(),
            flush: self.scheduler.metrics().snapshot(),
            store_close_error,
            uptime: self.started_at.elapsed(),
        };

        let stats = &report.final_stats;
        info!(
            drained = report.drained(),
            total_received = stats.total_received,
            total_processed = stats.total_processed,
            total_dropped = stats.total_dropped,
            total_failed = stats.total_failed,
            uptime_secs = report.uptime.as_secs(),
            clean = report.is_clean(),
            "pipeline stopped"
        );

        report
    }
}

impl std::fmt::Debug for LifecycleController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LifecycleController")
            .field("store", &self.store.name())
            .field("scheduler", &self.scheduler)
            .field("buffer", &self.buffer.stats())
            .finish()
    }
}

#[cfg(test)]
#[path = "lifecycle_test.rs"]
mod lifecycle_test;
