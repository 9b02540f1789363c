//! HTTP source metrics
//!
//! Request outcome counters for the ingestion endpoint.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// HTTP source metrics
#[derive(Debug, Default)]
pub struct HttpSourceMetrics {
    /// Total `POST /event` requests
    pub requests_total: AtomicU64,

    /// Events admitted to the buffer (202)
    pub events_accepted: AtomicU64,

    /// Rejected because the buffer was full (503)
    pub rejected_capacity: AtomicU64,

    /// Rejected because shutdown had begun (503)
    pub rejected_shutdown: AtomicU64,

    /// Body was not valid JSON (400)
    pub invalid_json: AtomicU64,

    /// Body was JSON but not a valid event (422)
    pub invalid_event: AtomicU64,

    /// Body exceeded the payload limit (413)
    pub payload_too_large: AtomicU64,

    /// Request body bytes read
    pub bytes_received: AtomicU64,
}

impl HttpSourceMetrics {
    /// Create new metrics instance
    pub const fn new() -> Self {
        Self {
            requests_total: AtomicU64::new(0),
            events_accepted: AtomicU64::new(0),
            rejected_capacity: AtomicU64::new(0),
            rejected_shutdown: AtomicU64::new(0),
            invalid_json: AtomicU64::new(0),
            invalid_event: AtomicU64::new(0),
            payload_too_large: AtomicU64::new(0),
            bytes_received: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn request_received(&self, bytes: usize) {
        self.requests_total.fetch_add(1, Ordering::Relaxed);
        self.bytes_received.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    #[inline]
    pub fn accepted(&self) {
        self.events_accepted.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn capacity_rejected(&self) {
        self.rejected_capacity.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn shutdown_rejected(&self) {
        self.rejected_shutdown.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn json_error(&self) {
        self.invalid_json.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn validation_error(&self) {
        self.invalid_event.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn too_large(&self) {
        self.requests_total.fetch_add(1, Ordering::Relaxed);
        self.payload_too_large.fetch_add(1, Ordering::Relaxed);
    }

    /// Get a snapshot of all counters
    pub fn snapshot(&self) -> HttpMetricsSnapshot {
        HttpMetricsSnapshot {
            requests_total: self.requests_total.load(Ordering::Relaxed),
            events_accepted: self.events_accepted.load(Ordering::Relaxed),
            rejected_capacity: self.rejected_capacity.load(Ordering::Relaxed),
            rejected_shutdown: self.rejected_shutdown.load(Ordering::Relaxed),
            invalid_json: self.invalid_json.load(Ordering::Relaxed),
            invalid_event: self.invalid_event.load(Ordering::Relaxed),
            payload_too_large: self.payload_too_large.load(Ordering::Relaxed),
            bytes_received: self.bytes_received.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time snapshot of HTTP source metrics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct HttpMetricsSnapshot {
    pub requests_total: u64,
    pub events_accepted: u64,
    pub rejected_capacity: u64,
    pub rejected_shutdown: u64,
    pub invalid_json: u64,
    pub invalid_event: u64,
    pub payload_too_large: u64,
    pub bytes_received: u64,
}

impl HttpMetricsSnapshot {
    /// Requests answered with a 4xx status
    pub fn client_errors(&self) -> u64 {
        self.invalid_json + self.invalid_event + self.payload_too_large
    }

    /// Requests answered with a 503 status
    pub fn unavailable(&self) -> u64 {
        self.rejected_capacity + self.rejected_shutdown
    }
}
