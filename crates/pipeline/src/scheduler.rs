//! BatchScheduler - decides when staged events are flushed to the store
//!
//! A single background task polls the buffer every `poll_interval` and
//! flushes when either trigger fires:
//!
//! - **size**: `queue_size >= max_batch_size` (checked first)
//! - **time**: `queue_size > 0` and `max_wait_interval` elapsed since the
//!   last flush attempt
//!
//! One flush moves at most `max_batch_size` events. A failed write (error,
//! timeout or panic inside the store) is logged and counted, its events are
//! not re-queued, and the loop pauses for `error_backoff` before resuming.
//! Store failures never end the loop.
//!
//! # State machine
//!
//! ```text
//! Stopped --start--> Running --stop--> Draining --drain--> Finished
//! ```

use std::any::Any;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use firehose_config::SchedulerConfig;
use firehose_protocol::Event;
use firehose_sinks::EventStore;
use futures_util::FutureExt;
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::buffer::EventBuffer;
use crate::error::{FlushError, PipelineError, Result};
use crate::metrics::FlushMetrics;

/// Scheduler lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    /// Created, loop not running
    Stopped,
    /// Loop polling the buffer
    Running,
    /// Loop stopped; waiting for the final drain
    Draining,
    /// Final drain attempted; terminal
    Finished,
}

impl SchedulerState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stopped => "stopped",
            Self::Running => "running",
            Self::Draining => "draining",
            Self::Finished => "finished",
        }
    }
}

impl fmt::Display for SchedulerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which condition started a flush
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushTrigger {
    Size,
    Time,
}

/// Evaluate the flush triggers
///
/// The size trigger wins when both conditions hold.
pub fn should_flush(
    queue_size: usize,
    max_batch_size: usize,
    since_last_flush: Duration,
    max_wait_interval: Duration,
) -> Option<FlushTrigger> {
    if queue_size >= max_batch_size {
        Some(FlushTrigger::Size)
    } else if queue_size > 0 && since_last_flush >= max_wait_interval {
        Some(FlushTrigger::Time)
    } else {
        None
    }
}

/// Result of the single drain attempt at shutdown
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DrainOutcome {
    /// Nothing was left to write
    Empty,
    /// All remaining events were written
    Flushed { events: usize },
    /// The drain write failed; these events are lost
    Failed { events: usize, reason: String },
}

impl DrainOutcome {
    /// Events handed to the final write
    pub fn drained(&self) -> usize {
        match self {
            Self::Empty => 0,
            Self::Flushed { events } | Self::Failed { events, .. } => *events,
        }
    }

    pub fn is_success(&self) -> bool {
        !matches!(self, Self::Failed { .. })
    }
}

/// State shared between the scheduler handle and its task
struct SchedulerShared {
    buffer: Arc<EventBuffer>,
    store: Arc<dyn EventStore>,
    config: SchedulerConfig,
    metrics: Arc<FlushMetrics>,
    state: Mutex<SchedulerState>,
}

/// Owner of the background flush loop
///
/// # Example
///
/// ```ignore
/// let mut scheduler = BatchScheduler::new(buffer, store, SchedulerConfig::default())?;
/// scheduler.start()?;
/// // ...
/// scheduler.stop().await?;
/// let outcome = scheduler.drain().await?;
/// ```
pub struct BatchScheduler {
    shared: Arc<SchedulerShared>,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl BatchScheduler {
    /// Create a stopped scheduler
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` for zero batch size or zero intervals.
    pub fn new(
        buffer: Arc<EventBuffer>,
        store: Arc<dyn EventStore>,
        config: SchedulerConfig,
    ) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            shared: Arc::new(SchedulerShared {
                buffer,
                store,
                config,
                metrics: Arc::new(FlushMetrics::new()),
                state: Mutex::new(SchedulerState::Stopped),
            }),
            cancel: CancellationToken::new(),
            task: None,
        })
    }

    /// Current state
    pub fn state(&self) -> SchedulerState {
        *self.shared.state.lock()
    }

    /// Flush metrics, shareable with reporters
    pub fn metrics(&self) -> Arc<FlushMetrics> {
        Arc::clone(&self.shared.metrics)
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.shared.config
    }

    /// Spawn the flush loop (`Stopped -> Running`)
    pub fn start(&mut self) -> Result<()> {
        self.shared.transition(SchedulerState::Stopped, SchedulerState::Running)?;

        let shared = Arc::clone(&self.shared);
        let cancel = self.cancel.clone();
        self.task = Some(tokio::spawn(async move { shared.run(cancel).await }));

        info!(
            store = %self.shared.store.name(),
            max_batch_size = self.shared.config.max_batch_size,
            max_wait_ms = self.shared.config.max_wait_interval.as_millis() as u64,
            poll_ms = self.shared.config.poll_interval.as_millis() as u64,
            "batch scheduler started"
        );
        Ok(())
    }

    /// Stop polling (`Running -> Draining`)
    ///
    /// A flush already in progress is allowed to finish; this waits for it.
    pub async fn stop(&mut self) -> Result<()> {
        self.shared.transition(SchedulerState::Running, SchedulerState::Draining)?;
        self.cancel.cancel();

        if let Some(task) = self.task.take()
            && let Err(e) = task.await
        {
            error!(error = %e, "batch scheduler task ended abnormally");
        }

        debug!("batch scheduler stopped polling");
        Ok(())
    }

    /// Write everything left in the buffer in one batch (`Draining -> Finished`)
    ///
    /// Exactly one `extract_batch(capacity)` and at most one write, bounded by
    /// `drain_timeout`.
    pub async fn drain(&mut self) -> Result<DrainOutcome> {
        let state = self.state();
        if state != SchedulerState::Draining {
            return Err(PipelineError::InvalidState {
                expected: SchedulerState::Draining.as_str(),
                actual: state.as_str(),
            });
        }

        let shared = &self.shared;
        let batch = shared.buffer.extract_batch(shared.buffer.capacity());

        let outcome = if batch.is_empty() {
            DrainOutcome::Empty
        } else {
            let events = batch.len();
            info!(events, "draining remaining events");

            match shared.write(&batch, shared.config.drain_timeout).await {
                Ok(_) => {
                    shared.buffer.mark_processed(events);
                    DrainOutcome::Flushed { events }
                }
                Err(e) => {
                    shared.buffer.mark_failed(events);
                    shared.metrics.record_failed(events as u64, &e);
                    error!(events, error = %e, kind = e.kind(), "shutdown flush failed, events lost");
                    DrainOutcome::Failed {
                        events,
                        reason: e.to_string(),
                    }
                }
            }
        };

        *shared.state.lock() = SchedulerState::Finished;
        Ok(outcome)
    }
}

impl Drop for BatchScheduler {
    fn drop(&mut self) {
        // An abandoned scheduler must not keep flushing in the background
        self.cancel.cancel();
    }
}

impl fmt::Debug for BatchScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BatchScheduler")
            .field("state", &self.state())
            .field("store", &self.shared.store.name())
            .field("config", &self.shared.config)
            .finish()
    }
}

impl SchedulerShared {
    fn transition(&self, from: SchedulerState, to: SchedulerState) -> Result<()> {
        let mut state = self.state.lock();
        if *state != from {
            return Err(PipelineError::InvalidState {
                expected: from.as_str(),
                actual: state.as_str(),
            });
        }
        *state = to;
        Ok(())
    }

    /// The polling loop; returns when cancelled
    async fn run(&self, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(self.config.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut last_flush = Instant::now();

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }

            let Some(trigger) = should_flush(
                self.buffer.len(),
                self.config.max_batch_size,
                last_flush.elapsed(),
                self.config.max_wait_interval,
            ) else {
                continue;
            };

            let result = self.flush(trigger).await;
            last_flush = Instant::now();

            if result.is_err() && !self.config.error_backoff.is_zero() {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => break,
                    _ = tokio::time::sleep(self.config.error_backoff) => {}
                }
            }
        }
    }

    /// One flush cycle: extract, write, settle the counters
    async fn flush(&self, trigger: FlushTrigger) -> std::result::Result<usize, FlushError> {
        let batch = self.buffer.extract_batch(self.config.max_batch_size);
        if batch.is_empty() {
            return Ok(0);
        }

        let events = batch.len();
        self.metrics.record_trigger(trigger);
        let started = Instant::now();

        match self.write(&batch, self.config.write_timeout).await {
            Ok(_) => {
                self.buffer.mark_processed(events);
                self.metrics.record_flushed(events as u64, started.elapsed());
                debug!(events, ?trigger, "batch flushed");
                Ok(events)
            }
            Err(e) => {
                self.buffer.mark_failed(events);
                self.metrics.record_failed(events as u64, &e);
                error!(
                    events,
                    ?trigger,
                    kind = e.kind(),
                    error = %e,
                    "batch flush failed, events dropped"
                );
                Err(e)
            }
        }
    }

    /// Hand a batch to the store with a deadline, containing panics
    async fn write(&self, batch: &[Event], timeout: Duration) -> std::result::Result<usize, FlushError> {
        let write = AssertUnwindSafe(self.store.write_batch(batch)).catch_unwind();

        let written = match tokio::time::timeout(timeout, write).await {
            Err(_) => return Err(FlushError::Timeout(timeout)),
            Ok(Err(panic)) => return Err(FlushError::Panic(panic_message(panic.as_ref()))),
            Ok(Ok(result)) => result?,
        };

        if written != batch.len() {
            warn!(
                store = %self.store.name(),
                expected = batch.len(),
                written,
                "store reported a partial count; treating batch as written"
            );
        }
        Ok(written)
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
#[path = "scheduler_test.rs"]
mod scheduler_test;
