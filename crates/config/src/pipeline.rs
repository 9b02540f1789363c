//! Buffer and scheduler configuration
//!
//! These two sections tune the ingestion pipeline: how many events may be
//! staged in memory and when staged events are flushed to storage.

use serde::Deserialize;
use std::time::Duration;

use crate::error::{ConfigError, Result};

/// Default in-memory staging capacity (events)
pub const DEFAULT_BUFFER_CAPACITY: usize = 100_000;

/// Staging buffer configuration
///
/// # Example
///
/// ```toml
/// [buffer]
/// capacity = 250000
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BufferConfig {
    /// Maximum number of events held in memory before new events are rejected
    /// Default: 100000
    pub capacity: usize,
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_BUFFER_CAPACITY,
        }
    }
}

impl BufferConfig {
    /// Check the capacity is usable
    pub fn validate(&self) -> Result<()> {
        if self.capacity == 0 {
            return Err(ConfigError::invalid_value(
                "buffer",
                "capacity",
                "must be greater than 0",
            ));
        }
        Ok(())
    }
}

/// Batch scheduler configuration
///
/// A flush happens when `max_batch_size` events are waiting, or when at
/// least one event has waited `max_wait_interval` since the last flush.
/// The trigger is evaluated every `poll_interval`.
///
/// # Example
///
/// ```toml
/// [scheduler]
/// max_batch_size = 500
/// max_wait_interval = "2s"
/// poll_interval = "50ms"
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Size trigger and upper bound on events per flush
    /// Default: 100
    pub max_batch_size: usize,

    /// Time trigger
    /// Default: 1s
    #[serde(with = "humantime_serde")]
    pub max_wait_interval: Duration,

    /// How often the trigger is evaluated
    /// Default: 100ms
    #[serde(with = "humantime_serde")]
    pub poll_interval: Duration,

    /// Pause after a failed flush
    /// Default: 1s
    #[serde(with = "humantime_serde")]
    pub error_backoff: Duration,

    /// Upper bound on a single batch write
    /// Default: 30s
    #[serde(with = "humantime_serde")]
    pub write_timeout: Duration,

    /// Upper bound on the final drain write at shutdown
    /// Default: 30s
    #[serde(with = "humantime_serde")]
    pub drain_timeout: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            max_batch_size: 100,
            max_wait_interval: Duration::from_secs(1),
            poll_interval: Duration::from_millis(100),
            error_backoff: Duration::from_secs(1),
            write_timeout: Duration::from_secs(30),
            drain_timeout: Duration::from_secs(30),
        }
    }
}

impl SchedulerConfig {
    /// Reject zero sizes and zero intervals
    pub fn validate(&self) -> Result<()> {
        if self.max_batch_size == 0 {
            return Err(ConfigError::invalid_value(
                "scheduler",
                "max_batch_size",
                "must be greater than 0",
            ));
        }

        for (field, value) in [
            ("max_wait_interval", self.max_wait_interval),
            ("poll_interval", self.poll_interval),
            ("write_timeout", self.write_timeout),
            ("drain_timeout", self.drain_timeout),
        ] {
            if value.is_zero() {
                return Err(ConfigError::invalid_value(
                    "scheduler",
                    field,
                    "must be greater than 0",
                ));
            }
        }

        Ok(())
    }

    /// Non-fatal tuning problems
    pub fn warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        if self.poll_interval.saturating_mul(10) > self.max_wait_interval {
            warnings.push(format!(
                "scheduler.poll_interval ({:?}) should be much smaller than max_wait_interval ({:?}); \
                 time-triggered flushes may be late by up to one poll",
                self.poll_interval, self.max_wait_interval
            ));
        }
        warnings
    }
}
