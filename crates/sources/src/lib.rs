//! Firehose - Sources
//!
//! Network endpoints that receive events and admit them to the pipeline's
//! staging buffer.
//!
//! # Available Sources
//!
//! - **HTTP** - JSON REST endpoint (`POST /event`) built on axum
//!
//! # Design Principles
//!
//! - **Admission only**: a request is answered as soon as the event is queued
//!   or rejected; storage latency never reaches the producer
//! - **Explicit backpressure**: a full buffer becomes `503` with `Retry-After`
//! - **Graceful stop**: servers drain in-flight requests when cancelled
//!
//! # Example
//!
//! ```ignore
//! use firehose_sources::http::{HttpSource, HttpSourceConfig};
//! use tokio_util::sync::CancellationToken;
//!
//! let source = HttpSource::new(HttpSourceConfig::with_port(8000), buffer, store);
//! let cancel = CancellationToken::new();
//! source.run(cancel).await?;
//! ```

pub mod http;

pub use http::{
    HttpMetricsSnapshot, HttpSource, HttpSourceConfig, HttpSourceError, HttpSourceMetrics,
};
