//! EventBuffer - bounded FIFO staging area between ingestion and storage
//!
//! Request handlers `admit` events; the scheduler `extract_batch`es them and
//! reports the outcome of each write with `mark_processed` or `mark_failed`.
//!
//! # Accounting
//!
//! Every admission attempt increments `total_received`. Each event then sits
//! in exactly one bucket, so at every instant:
//!
//! ```text
//! total_received = total_processed + total_dropped + total_failed
//!                + queue_size + in_flight
//! ```
//!
//! `in_flight` counts events extracted but not yet confirmed or failed.
//!
//! # Locking
//!
//! All state lives behind one `parking_lot::Mutex`. Critical sections are a
//! few counter updates plus a push or drain; the lock is never held across an
//! await or a storage call.

use std::collections::VecDeque;

use firehose_protocol::Event;
use parking_lot::Mutex;
use serde::Serialize;

use crate::error::AdmitError;
use crate::metrics::BackpressureTracker;

/// Bounded, thread-safe FIFO of events awaiting persistence
#[derive(Debug)]
pub struct EventBuffer {
    capacity: usize,
    inner: Mutex<BufferInner>,
    backpressure: BackpressureTracker,
}

#[derive(Debug)]
struct BufferInner {
    queue: VecDeque<Event>,
    closed: bool,
    total_received: u64,
    total_processed: u64,
    total_dropped: u64,
    total_failed: u64,
    in_flight: u64,
}

/// Consistent snapshot of buffer counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct BufferStats {
    /// Events currently queued
    pub queue_size: usize,
    /// Fixed maximum queue size
    pub capacity: usize,
    /// Admission attempts, accepted or not
    pub total_received: u64,
    /// Events confirmed written by the store
    pub total_processed: u64,
    /// Events rejected at admission (full or closed)
    pub total_dropped: u64,
    /// Events extracted and awaiting a write outcome
    pub in_flight: u64,
    /// Events lost to failed writes
    pub total_failed: u64,
}

impl BufferStats {
    /// Check the accounting identity
    pub fn is_consistent(&self) -> bool {
        self.total_received
            == self.total_processed
                + self.total_dropped
                + self.total_failed
                + self.queue_size as u64
                + self.in_flight
    }

    /// Queue fill ratio (0.0 - 1.0)
    pub fn utilization(&self) -> f64 {
        if self.capacity == 0 {
            0.0
        } else {
            self.queue_size as f64 / self.capacity as f64
        }
    }

    /// Difference of the monotonic counters since `previous`
    ///
    /// Gauges (`queue_size`, `in_flight`, `capacity`) are taken from `self`.
    pub fn diff(&self, previous: &BufferStats) -> BufferStats {
        BufferStats {
            queue_size: self.queue_size,
            capacity: self.capacity,
            total_received: self.total_received.saturating_sub(previous.total_received),
            total_processed: self
                .total_processed
                .saturating_sub(previous.total_processed),
            total_dropped: self.total_dropped.saturating_sub(previous.total_dropped),
            in_flight: self.in_flight,
            total_failed: self.total_failed.saturating_sub(previous.total_failed),
        }
    }
}

impl EventBuffer {
    /// Create a buffer holding at most `capacity` events
    ///
    /// Storage for the full capacity is allocated up front.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero. Configured capacities are validated
    /// before they reach this point.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "buffer capacity must be greater than 0");
        Self {
            capacity,
            inner: Mutex::new(BufferInner {
                queue: VecDeque::with_capacity(capacity),
                closed: false,
                total_received: 0,
                total_processed: 0,
                total_dropped: 0,
                total_failed: 0,
                in_flight: 0,
            }),
            backpressure: BackpressureTracker::new(),
        }
    }

    /// Offer an event to the buffer
    ///
    /// Never blocks on storage. A rejected event is dropped and counted in
    /// `total_dropped`.
    pub fn admit(&self, event: Event) -> Result<(), AdmitError> {
        let result = {
            let mut inner = self.inner.lock();
            inner.total_received += 1;

            if inner.closed {
                inner.total_dropped += 1;
                Err(AdmitError::Closed)
            } else if inner.queue.len() >= self.capacity {
                inner.total_dropped += 1;
                Err(AdmitError::CapacityExceeded {
                    capacity: self.capacity,
                })
            } else {
                inner.queue.push_back(event);
                Ok(())
            }
        };

        if matches!(result, Err(AdmitError::CapacityExceeded { .. })) {
            self.backpressure.record_drop(self.capacity);
        }
        result
    }

    /// Remove up to `max_count` of the oldest events
    ///
    /// Returns an empty vec when the queue is empty. Extracted events count as
    /// in flight until `mark_processed` or `mark_failed` settles them.
    pub fn extract_batch(&self, max_count: usize) -> Vec<Event> {
        let mut inner = self.inner.lock();
        let count = max_count.min(inner.queue.len());
        if count == 0 {
            return Vec::new();
        }

        let batch: Vec<Event> = inner.queue.drain(..count).collect();
        inner.in_flight += count as u64;
        batch
    }

    /// Record `count` extracted events as durably written
    pub fn mark_processed(&self, count: usize) {
        let mut inner = self.inner.lock();
        inner.in_flight = inner.in_flight.saturating_sub(count as u64);
        inner.total_processed += count as u64;
    }

    /// Record `count` extracted events as lost to a failed write
    pub fn mark_failed(&self, count: usize) {
        let mut inner = self.inner.lock();
        inner.in_flight = inner.in_flight.saturating_sub(count as u64);
        inner.total_failed += count as u64;
    }

    /// Snapshot all counters under one lock acquisition
    pub fn stats(&self) -> BufferStats {
        let inner = self.inner.lock();
        BufferStats {
            queue_size: inner.queue.len(),
            capacity: self.capacity,
            total_received: inner.total_received,
            total_processed: inner.total_processed,
            total_dropped: inner.total_dropped,
            in_flight: inner.in_flight,
            total_failed: inner.total_failed,
        }
    }

    /// Stop admitting events; queued events stay available for extraction
    pub fn close(&self) {
        self.inner.lock().closed = true;
    }

    pub fn is_closed(&self) -> bool {
        self.inner.lock().closed
    }

    /// Zero the history counters
    ///
    /// Administrative operation. Queued and in-flight events are kept and
    /// `total_received` restarts at their sum so the accounting identity holds.
    pub fn reset_counters(&self) {
        let mut inner = self.inner.lock();
        inner.total_processed = 0;
        inner.total_dropped = 0;
        inner.total_failed = 0;
        inner.total_received = inner.queue.len() as u64 + inner.in_flight;
    }

    /// Number of queued events
    pub fn len(&self) -> usize {
        self.inner.lock().queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
#[path = "buffer_test.rs"]
mod buffer_test;
