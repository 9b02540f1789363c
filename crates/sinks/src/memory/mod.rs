//! Memory store - keeps events in process memory
//!
//! Backs `type = "memory"` and is the workhorse of the pipeline tests. Besides
//! retaining every written event it can inject faults: failed writes, panics,
//! slow writes and a failing `open`.

use std::time::Duration;

use async_trait::async_trait;
use firehose_protocol::Event;
use parking_lot::Mutex;

use crate::common::{MetricsSnapshot, Result, SinkError, SinkMetrics};
use crate::store::EventStore;

/// In-memory event store with fault injection
#[derive(Debug)]
pub struct MemoryStore {
    name: String,
    state: Mutex<MemoryState>,
    metrics: SinkMetrics,
}

#[derive(Debug, Default)]
struct MemoryState {
    open: bool,
    events: Vec<Event>,
    batch_sizes: Vec<usize>,
    write_calls: u64,

    // Fault injection
    fail_open: bool,
    fail_next: usize,
    failing: bool,
    panic_next: usize,
    write_delay: Option<Duration>,
}

/// What a single write call has been told to do
enum Injected {
    Nothing,
    Fail,
    Panic,
}

impl MemoryStore {
    /// Create a new, unopened memory store
    pub fn new() -> Self {
        Self::with_name("memory")
    }

    /// Create a new memory store with a custom name
    pub fn with_name(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: Mutex::new(MemoryState::default()),
            metrics: SinkMetrics::new(),
        }
    }

    // =========================================================================
    // Fault injection
    // =========================================================================

    /// Make the next `count` writes fail with an error
    pub fn fail_next(&self, count: usize) {
        self.state.lock().fail_next = count;
    }

    /// Make every write fail until switched off
    pub fn set_failing(&self, failing: bool) {
        self.state.lock().failing = failing;
    }

    /// Make the next `count` writes panic
    pub fn panic_next(&self, count: usize) {
        self.state.lock().panic_next = count;
    }

    /// Delay every write by this long before it completes
    pub fn set_write_delay(&self, delay: Option<Duration>) {
        self.state.lock().write_delay = delay;
    }

    /// Make `open` fail
    pub fn set_fail_open(&self, fail: bool) {
        self.state.lock().fail_open = fail;
    }

    // =========================================================================
    // Inspection
    // =========================================================================

    /// Copy of all persisted events, in write order
    pub fn events(&self) -> Vec<Event> {
        self.state.lock().events.clone()
    }

    /// Number of persisted events
    pub fn len(&self) -> usize {
        self.state.lock().events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sizes of every successfully written batch, in order
    pub fn batch_sizes(&self) -> Vec<usize> {
        self.state.lock().batch_sizes.clone()
    }

    /// Number of `write_batch` calls, including failed ones
    pub fn write_calls(&self) -> u64 {
        self.state.lock().write_calls
    }

    /// Whether the store is currently open
    pub fn is_open(&self) -> bool {
        self.state.lock().open
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventStore for MemoryStore {
    fn name(&self) -> &str {
        &self.name
    }

    async fn open(&self) -> Result<()> {
        let mut state = self.state.lock();
        if state.fail_open {
            return Err(SinkError::init(format!("{}: injected open failure", self.name)));
        }
        state.open = true;
        Ok(())
    }

    async fn write_batch(&self, events: &[Event]) -> Result<usize> {
        let (injected, delay) = {
            let mut state = self.state.lock();
            if !state.open {
                return Err(SinkError::not_open(&self.name));
            }
            state.write_calls += 1;

            let injected = if state.panic_next > 0 {
                state.panic_next -= 1;
                Injected::Panic
            } else if state.fail_next > 0 {
                state.fail_next -= 1;
                Injected::Fail
            } else if state.failing {
                Injected::Fail
            } else {
                Injected::Nothing
            };
            (injected, state.write_delay)
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        match injected {
            Injected::Panic => panic!("{}: injected panic during write", self.name),
            Injected::Fail => {
                self.metrics.write_error(events.len() as u64);
                Err(SinkError::write(format!("{}: injected write failure", self.name)))
            }
            Injected::Nothing => {
                let mut state = self.state.lock();
                state.events.extend_from_slice(events);
                state.batch_sizes.push(events.len());
                drop(state);

                self.metrics.batch_written(events.len() as u64);
                Ok(events.len())
            }
        }
    }

    async fn event_count(&self) -> Result<Option<u64>> {
        Ok(Some(self.len() as u64))
    }

    async fn close(&self) -> Result<()> {
        self.state.lock().open = false;
        Ok(())
    }

    fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }
}

#[cfg(test)]
#[path = "memory_test.rs"]
mod memory_test;
