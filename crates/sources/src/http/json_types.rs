//! JSON response bodies for the HTTP API

use std::collections::BTreeMap;

use serde::Serialize;

/// Body of a 202 response
#[derive(Debug, Clone, Serialize)]
pub struct AcceptedResponse {
    pub status: &'static str,
    pub message: &'static str,
}

impl AcceptedResponse {
    pub const QUEUED: Self = Self {
        status: "accepted",
        message: "Event queued for processing",
    };
}

/// Error response
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error code
    pub error: String,

    /// Human-readable message
    pub message: String,
}

impl ErrorResponse {
    /// Create an error response
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
        }
    }
}

/// Body of `GET /health`
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub queue_size: usize,
    pub total_received: u64,
    pub total_processed: u64,
    pub total_dropped: u64,
    pub in_flight: u64,
    pub total_failed: u64,
    /// Rows in the store; null if the store can't count
    pub database_events: Option<u64>,
    pub timestamp: String,
}

/// Body of `GET /`
#[derive(Debug, Clone, Serialize)]
pub struct ServiceInfo {
    pub service: &'static str,
    pub version: &'static str,
    pub endpoints: BTreeMap<&'static str, &'static str>,
}
