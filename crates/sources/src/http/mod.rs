//! HTTP Source - REST endpoint for event ingestion
//!
//! Validates single JSON events and admits them to the staging buffer. A
//! request never waits on storage; the status code reports admission only.
//!
//! # Endpoints
//!
//! - `POST /event` - Ingest one event
//! - `GET /health` - Buffer and storage statistics
//! - `GET /` - Service information
//!
//! # Request
//!
//! ```text
//! POST /event
//! Content-Type: application/json
//!
//! {"user_id": 42, "timestamp": "2024-01-01T12:00:00Z", "metadata": {"page": "/home"}}
//! ```
//!
//! # Responses
//!
//! | Status | When |
//! |--------|------|
//! | 202 | Event queued |
//! | 400 | Body is not JSON |
//! | 413 | Body exceeds `max_payload_size` |
//! | 422 | Invalid `user_id`, `timestamp` or `metadata` |
//! | 503 | Buffer full (`Retry-After: 1`) or shutting down |
//!
//! # Example
//!
//! ```ignore
//! use firehose_sources::http::{HttpSource, HttpSourceConfig};
//!
//! let source = HttpSource::new(HttpSourceConfig::with_port(8000), buffer, store);
//! source.run(cancel_token).await?;
//! ```

mod config;
mod error;
mod handlers;
mod json_types;
mod metrics;
mod response;

#[cfg(test)]
mod http_test;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use firehose_pipeline::EventBuffer;
use firehose_sinks::EventStore;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;

pub use config::HttpSourceConfig;
pub use error::HttpSourceError;
pub use metrics::{HttpMetricsSnapshot, HttpSourceMetrics};

use handlers::{HandlerState, health_check, ingest_event, service_info};

/// HTTP source for event ingestion
pub struct HttpSource {
    config: HttpSourceConfig,
    buffer: Arc<EventBuffer>,
    store: Arc<dyn EventStore>,
    metrics: Arc<HttpSourceMetrics>,
    running: Arc<AtomicBool>,
}

impl HttpSource {
    /// Create a new HTTP source
    pub fn new(
        config: HttpSourceConfig,
        buffer: Arc<EventBuffer>,
        store: Arc<dyn EventStore>,
    ) -> Self {
        Self {
            config,
            buffer,
            store,
            metrics: Arc::new(HttpSourceMetrics::new()),
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Get reference to metrics
    pub fn metrics(&self) -> &HttpSourceMetrics {
        &self.metrics
    }

    /// Shared metrics handle, usable after `run` consumes the source
    pub fn metrics_handle(&self) -> Arc<HttpSourceMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Check if the source is running
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    /// Run the HTTP source
    ///
    /// Binds to the configured address and serves until cancelled.
    pub async fn run(self, cancel: CancellationToken) -> Result<(), HttpSourceError> {
        let bind_addr = self.config.bind_address();

        let listener = TcpListener::bind(&bind_addr)
            .await
            .map_err(|e| HttpSourceError::Bind {
                address: bind_addr.clone(),
                source: e,
            })?;

        self.run_with_listener(listener, cancel).await
    }

    /// Serve on an already bound listener until cancelled
    ///
    /// In-flight requests are completed before this returns.
    pub async fn run_with_listener(
        self,
        listener: TcpListener,
        cancel: CancellationToken,
    ) -> Result<(), HttpSourceError> {
        let local_addr = listener.local_addr()?;
        self.running.store(true, Ordering::Relaxed);

        tracing::info!(
            address = %local_addr,
            max_payload_size = self.config.max_payload_size,
            "HTTP source listening"
        );

        let state = Arc::new(HandlerState {
            buffer: Arc::clone(&self.buffer),
            store: Arc::clone(&self.store),
            metrics: Arc::clone(&self.metrics),
            max_payload_size: self.config.max_payload_size,
        });

        let mut app = build_router(state);
        if self.config.request_logging {
            app = app.layer(TraceLayer::new_for_http());
        }

        let server = axum::serve(listener, app).with_graceful_shutdown(shutdown_signal(cancel));
        let result = server.await.map_err(|e| HttpSourceError::Http(e.to_string()));

        self.running.store(false, Ordering::Relaxed);

        let snapshot = self.metrics.snapshot();
        tracing::info!(
            requests = snapshot.requests_total,
            accepted = snapshot.events_accepted,
            rejected = snapshot.unavailable(),
            invalid = snapshot.client_errors(),
            "HTTP source stopped"
        );

        result
    }
}

/// Build the axum router
fn build_router(state: Arc<HandlerState>) -> Router {
    let max_payload_size = state.max_payload_size;
    Router::new()
        .route("/event", post(ingest_event))
        .route("/health", get(health_check))
        .route("/", get(service_info))
        .layer(DefaultBodyLimit::max(max_payload_size))
        .with_state(state)
}

/// Shutdown signal future
async fn shutdown_signal(cancel: CancellationToken) {
    cancel.cancelled().await;
}
