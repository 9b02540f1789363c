//! Pipeline error types
//!
//! Errors for admission, flushing and lifecycle operations.

use std::time::Duration;

use firehose_config::ConfigError;
use firehose_sinks::SinkError;
use thiserror::Error;

/// Why an event was not admitted to the buffer
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum AdmitError {
    /// Buffer is full; the caller should retry later
    #[error("capacity exceeded ({capacity} events queued), retry later")]
    CapacityExceeded {
        /// Configured buffer capacity
        capacity: usize,
    },

    /// Buffer no longer admits events (shutdown in progress)
    #[error("buffer closed, service is shutting down")]
    Closed,
}

/// Why a single batch write did not succeed
#[derive(Debug, Error)]
pub enum FlushError {
    /// The store returned an error
    #[error("store write failed: {0}")]
    Store(#[from] SinkError),

    /// The store did not answer in time
    #[error("store write timed out after {0:?}")]
    Timeout(Duration),

    /// The store panicked while writing
    #[error("store panicked during write: {0}")]
    Panic(String),
}

impl FlushError {
    /// Short label for logs and metrics
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Store(_) => "store_error",
            Self::Timeout(_) => "timeout",
            Self::Panic(_) => "panic",
        }
    }
}

/// Pipeline errors
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The store could not be opened; nothing was started
    #[error("startup failed: store '{store}' could not be opened: {source}")]
    StartupFailure {
        /// Store name
        store: String,
        #[source]
        source: SinkError,
    },

    /// Scheduler or buffer configuration rejected
    #[error("invalid pipeline configuration: {0}")]
    InvalidConfig(#[from] ConfigError),

    /// Operation not allowed in the scheduler's current state
    #[error("scheduler is {actual}, expected {expected}")]
    InvalidState {
        expected: &'static str,
        actual: &'static str,
    },

    /// The final drain write at shutdown failed; its events are lost
    #[error("shutdown flush of {events} events failed: {reason}")]
    ShutdownFlushFailure { events: usize, reason: String },
}

/// Result type for pipeline operations
pub type Result<T> = std::result::Result<T, PipelineError>;
