//! HTTP source tests

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use firehose_pipeline::EventBuffer;
use firehose_sinks::{EventStore, MemoryStore, NullStore};
use tower::ServiceExt;

use super::handlers::HandlerState;
use super::metrics::HttpSourceMetrics;
use super::*;

struct TestContext {
    state: Arc<HandlerState>,
    buffer: Arc<EventBuffer>,
    metrics: Arc<HttpSourceMetrics>,
}

fn test_state_with(capacity: usize, store: Arc<dyn EventStore>) -> TestContext {
    let buffer = Arc::new(EventBuffer::new(capacity));
    let metrics = Arc::new(HttpSourceMetrics::new());

    let state = Arc::new(HandlerState {
        buffer: Arc::clone(&buffer),
        store,
        metrics: Arc::clone(&metrics),
        max_payload_size: 1024,
    });

    TestContext {
        state,
        buffer,
        metrics,
    }
}

fn test_state(capacity: usize) -> TestContext {
    test_state_with(capacity, Arc::new(NullStore::new()))
}

fn post_event(body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/event")
        .header("content-type", "application/json")
        .body(body.into())
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

const VALID_EVENT: &str =
    r#"{"user_id":42,"timestamp":"2024-01-01T12:00:00Z","metadata":{"page":"/home"}}"#;

// =============================================================================
// POST /event
// =============================================================================

#[tokio::test]
async fn test_ingest_event_accepted() {
    let ctx = test_state(10);
    let app = build_router(ctx.state);

    let response = app.oneshot(post_event(VALID_EVENT)).await.unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    let json = json_body(response).await;
    assert_eq!(json["status"], "accepted");
    assert_eq!(json["message"], "Event queued for processing");

    assert_eq!(ctx.buffer.len(), 1);
    let queued = ctx.buffer.extract_batch(1);
    assert_eq!(queued[0].producer_id().get(), 42);
    assert_eq!(queued[0].metadata()["page"], "/home");
    assert_eq!(ctx.metrics.snapshot().events_accepted, 1);
}

#[tokio::test]
async fn test_ingest_event_without_metadata() {
    let ctx = test_state(10);
    let app = build_router(ctx.state);

    let response = app
        .oneshot(post_event(r#"{"user_id":1,"timestamp":"2024-01-01"}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    assert!(ctx.buffer.extract_batch(1)[0].metadata().is_empty());
}

#[tokio::test]
async fn test_ingest_event_malformed_json() {
    let ctx = test_state(10);
    let app = build_router(ctx.state);

    let response = app.oneshot(post_event("{not json")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = json_body(response).await;
    assert_eq!(json["error"], "invalid_json");
    assert_eq!(ctx.buffer.stats().total_received, 0);
    assert_eq!(ctx.metrics.snapshot().invalid_json, 1);
}

#[tokio::test]
async fn test_ingest_event_validation_errors() {
    for (body, code) in [
        (r#"{"user_id":0,"timestamp":"2024-01-01"}"#, "invalid_user_id"),
        (r#"{"user_id":-5,"timestamp":"2024-01-01"}"#, "invalid_user_id"),
        (r#"{"user_id":1,"timestamp":"yesterday"}"#, "invalid_timestamp"),
        (r#"{"user_id":1,"timestamp":"2024-01-01","metadata":[1]}"#, "invalid_metadata"),
        (r#"{"timestamp":"2024-01-01"}"#, "invalid_event"),
        (r#"{"user_id":"abc","timestamp":"2024-01-01"}"#, "invalid_event"),
    ] {
        let ctx = test_state(10);
        let app = build_router(ctx.state);

        let response = app.oneshot(post_event(body)).await.unwrap();
        assert_eq!(
            response.status(),
            StatusCode::UNPROCESSABLE_ENTITY,
            "body: {body}"
        );
        let json = json_body(response).await;
        assert_eq!(json["error"], code, "body: {body}");
        assert!(ctx.buffer.is_empty());
    }
}

#[tokio::test]
async fn test_ingest_event_payload_too_large() {
    let ctx = test_state(10);
    let app = build_router(ctx.state);

    let padding = "x".repeat(2048);
    let body = format!(
        r#"{{"user_id":1,"timestamp":"2024-01-01","metadata":{{"pad":"{padding}"}}}}"#
    );

    let response = app.oneshot(post_event(body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert!(ctx.buffer.is_empty());
    assert_eq!(ctx.metrics.snapshot().payload_too_large, 1);
}

#[tokio::test]
async fn test_ingest_event_capacity_exceeded() {
    let ctx = test_state(2);
    let app = build_router(ctx.state);

    for _ in 0..2 {
        let response = app.clone().oneshot(post_event(VALID_EVENT)).await.unwrap();
        assert_eq!(response.status(), StatusCode::ACCEPTED);
    }

    let response = app.oneshot(post_event(VALID_EVENT)).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(response.headers()["retry-after"], "1");

    let json = json_body(response).await;
    assert_eq!(json["error"], "capacity_exceeded");
    assert!(json["message"].as_str().unwrap().contains("retry later"));

    let stats = ctx.buffer.stats();
    assert_eq!(stats.total_received, 3);
    assert_eq!(stats.total_dropped, 1);
    assert_eq!(stats.queue_size, 2);
}

#[tokio::test]
async fn test_ingest_event_shutting_down() {
    let ctx = test_state(10);
    ctx.buffer.close();
    let app = build_router(ctx.state);

    let response = app.oneshot(post_event(VALID_EVENT)).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    let json = json_body(response).await;
    assert_eq!(json["error"], "shutting_down");
    assert_eq!(ctx.metrics.snapshot().rejected_shutdown, 1);
}

// =============================================================================
// GET /health and GET /
// =============================================================================

#[tokio::test]
async fn test_health_check() {
    let store = Arc::new(MemoryStore::new());
    store.open().await.unwrap();
    let ctx = test_state_with(10, store);
    let app = build_router(ctx.state);

    app.clone().oneshot(post_event(VALID_EVENT)).await.unwrap();

    let response = app.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = json_body(response).await;
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["queue_size"], 1);
    assert_eq!(json["total_received"], 1);
    assert_eq!(json["total_processed"], 0);
    assert_eq!(json["total_dropped"], 0);
    assert_eq!(json["in_flight"], 0);
    assert_eq!(json["total_failed"], 0);
    assert_eq!(json["database_events"], 0);
    assert!(json["timestamp"].as_str().unwrap().ends_with('Z'));
}

#[tokio::test]
async fn test_health_check_without_count() {
    let ctx = test_state(10);
    ctx.buffer.close();
    let app = build_router(ctx.state);

    let json = json_body(app.oneshot(get("/health")).await.unwrap()).await;
    assert_eq!(json["status"], "shutting_down");
    assert!(json["database_events"].is_null());
}

#[tokio::test]
async fn test_service_info() {
    let ctx = test_state(10);
    let app = build_router(ctx.state);

    let response = app.oneshot(get("/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = json_body(response).await;
    assert_eq!(json["service"], "Firehose Event Collector");
    assert!(json["endpoints"].get("POST /event").is_some());
}

#[tokio::test]
async fn test_unknown_route() {
    let ctx = test_state(10);
    let app = build_router(ctx.state);

    let response = app.oneshot(get("/v1/events")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// =============================================================================
// Server lifecycle
// =============================================================================

#[tokio::test]
async fn test_run_with_listener_stops_on_cancel() {
    let buffer = Arc::new(EventBuffer::new(10));
    let source = HttpSource::new(
        HttpSourceConfig::default(),
        buffer,
        Arc::new(NullStore::new()),
    );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let cancel = tokio_util::sync::CancellationToken::new();
    let handle = tokio::spawn(source.run_with_listener(listener, cancel.clone()));

    cancel.cancel();
    let result = tokio::time::timeout(std::time::Duration::from_secs(5), handle)
        .await
        .unwrap()
        .unwrap();
    assert!(result.is_ok());
}
