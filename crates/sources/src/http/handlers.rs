//! HTTP route handlers
//!
//! # Endpoints
//!
//! - `POST /event` - Admit one event
//! - `GET /health` - Buffer counters and stored event count
//! - `GET /` - Service information

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::extract::rejection::BytesRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::{SecondsFormat, Utc};
use firehose_pipeline::{AdmitError, EventBuffer};
use firehose_protocol::{Event, RawEvent};
use firehose_sinks::EventStore;
use serde::Deserialize;
use serde_json::Value;

use super::json_types::{AcceptedResponse, HealthResponse, ServiceInfo};
use super::metrics::HttpSourceMetrics;
use super::response::{error_response, unavailable_response};

/// Shared state for handlers
pub struct HandlerState {
    pub buffer: Arc<EventBuffer>,
    pub store: Arc<dyn EventStore>,
    pub metrics: Arc<HttpSourceMetrics>,
    pub max_payload_size: usize,
}

/// POST /event - Validate one event and stage it for persistence
///
/// Never waits for storage: the response reflects admission only.
pub async fn ingest_event(
    State(state): State<Arc<HandlerState>>,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let body = match body {
        Ok(body) => body,
        Err(rejection) if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE => {
            state.metrics.too_large();
            return error_response(
                StatusCode::PAYLOAD_TOO_LARGE,
                "payload_too_large",
                format!("payload exceeds limit {}", state.max_payload_size),
            );
        }
        Err(rejection) => {
            state.metrics.request_received(0);
            state.metrics.json_error();
            return error_response(StatusCode::BAD_REQUEST, "invalid_body", rejection.body_text());
        }
    };

    state.metrics.request_received(body.len());

    // Syntax first (400), then shape and field rules (422)
    let value: Value = match serde_json::from_slice(&body) {
        Ok(value) => value,
        Err(e) => {
            state.metrics.json_error();
            return error_response(StatusCode::BAD_REQUEST, "invalid_json", e.to_string());
        }
    };

    let raw = match RawEvent::deserialize(value) {
        Ok(raw) => raw,
        Err(e) => {
            state.metrics.validation_error();
            return error_response(StatusCode::UNPROCESSABLE_ENTITY, "invalid_event", e.to_string());
        }
    };

    let event = match Event::try_from(raw) {
        Ok(event) => event,
        Err(e) => {
            state.metrics.validation_error();
            return error_response(StatusCode::UNPROCESSABLE_ENTITY, e.code(), e.to_string());
        }
    };

    match state.buffer.admit(event) {
        Ok(()) => {
            state.metrics.accepted();
            (StatusCode::ACCEPTED, Json(AcceptedResponse::QUEUED)).into_response()
        }
        Err(e @ AdmitError::CapacityExceeded { .. }) => {
            state.metrics.capacity_rejected();
            unavailable_response("capacity_exceeded", e.to_string())
        }
        Err(e @ AdmitError::Closed) => {
            state.metrics.shutdown_rejected();
            unavailable_response("shutting_down", e.to_string())
        }
    }
}

/// GET /health - Buffer counters plus the store's row count
pub async fn health_check(State(state): State<Arc<HandlerState>>) -> impl IntoResponse {
    let stats = state.buffer.stats();

    let database_events = match state.store.event_count().await {
        Ok(count) => count,
        Err(e) => {
            tracing::warn!(store = %state.store.name(), error = %e, "health: event count failed");
            None
        }
    };

    let status = if state.buffer.is_closed() {
        "shutting_down"
    } else {
        "healthy"
    };

    Json(HealthResponse {
        status,
        queue_size: stats.queue_size,
        total_received: stats.total_received,
        total_processed: stats.total_processed,
        total_dropped: stats.total_dropped,
        in_flight: stats.in_flight,
        total_failed: stats.total_failed,
        database_events,
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    })
}

/// GET / - Service information
pub async fn service_info() -> impl IntoResponse {
    let endpoints = BTreeMap::from([
        ("POST /event", "Ingest a clickstream event"),
        ("GET /health", "Check service health and statistics"),
    ]);

    Json(ServiceInfo {
        service: "Firehose Event Collector",
        version: env!("CARGO_PKG_VERSION"),
        endpoints,
    })
}
