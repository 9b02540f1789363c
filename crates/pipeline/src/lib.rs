//! Firehose - Pipeline
//!
//! The staging buffer and the batch scheduler that moves staged events into
//! an `EventStore`.
//!
//! # Architecture
//!
//! ```text
//! [HTTP handlers] --admit--> [EventBuffer] <--extract_batch-- [BatchScheduler] --write_batch--> [EventStore]
//!                            bounded FIFO      poll loop:         size | time
//!                            counters          mark_processed / mark_failed
//! ```
//!
//! # Key Design
//!
//! - **Never blocks ingestion**: `admit` is a short critical section; a full
//!   buffer rejects instead of waiting
//! - **Single writer**: only the scheduler task talks to the store
//! - **No retries**: a failed batch is counted and dropped, the loop backs off
//!   and carries on
//! - **Exact accounting**: every received event ends up processed, dropped,
//!   failed, queued or in flight
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use firehose_pipeline::{EventBuffer, LifecycleController, SchedulerConfig};
//! use firehose_sinks::SqliteStore;
//!
//! let buffer = Arc::new(EventBuffer::new(100_000));
//! let store = Arc::new(SqliteStore::new("events.db"));
//! let lifecycle = LifecycleController::start(buffer.clone(), store, SchedulerConfig::default()).await?;
//!
//! buffer.admit(event)?;
//!
//! let report = lifecycle.shutdown().await;
//! ```

mod buffer;
mod error;
mod lifecycle;
mod metrics;
mod reporter;
mod scheduler;

pub use buffer::{BufferStats, EventBuffer};
pub use error::{AdmitError, FlushError, PipelineError, Result};
pub use lifecycle::{LifecycleController, ShutdownReport};
pub use metrics::{BackpressureTracker, FlushMetrics, FlushMetricsSnapshot};
pub use reporter::{IntervalStats, StatsReporter, StatsSample, format_human};
pub use scheduler::{BatchScheduler, DrainOutcome, FlushTrigger, SchedulerState, should_flush};

// Re-export configuration types used to build the pipeline
pub use firehose_config::{BufferConfig, SchedulerConfig};
