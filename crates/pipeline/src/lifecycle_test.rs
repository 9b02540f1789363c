//! Tests for pipeline startup and shutdown

use std::sync::Arc;
use std::time::Duration;

use firehose_config::SchedulerConfig;
use firehose_protocol::{Event, Metadata, ProducerId};
use firehose_sinks::{EventStore, MemoryStore};

use super::LifecycleController;
use crate::buffer::EventBuffer;
use crate::error::{AdmitError, PipelineError};
use crate::scheduler::{DrainOutcome, SchedulerState};

fn event(id: i64) -> Event {
    Event::new(ProducerId::new(id).unwrap(), "2024-01-01T00:00:00Z", Metadata::new()).unwrap()
}

/// Large batch and long wait so nothing flushes before shutdown
fn idle_config() -> SchedulerConfig {
    SchedulerConfig {
        max_batch_size: 1000,
        max_wait_interval: Duration::from_secs(3600),
        ..SchedulerConfig::default()
    }
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_drains_remaining_events() {
    let buffer = Arc::new(EventBuffer::new(1000));
    let store = Arc::new(MemoryStore::new());
    let lifecycle = LifecycleController::start(buffer.clone(), store.clone(), idle_config())
        .await
        .unwrap();
    assert_eq!(lifecycle.scheduler_state(), SchedulerState::Running);

    for i in 1..=37 {
        buffer.admit(event(i)).unwrap();
    }
    tokio::time::sleep(Duration::from_millis(500)).await;
    assert_eq!(store.write_calls(), 0);

    let report = lifecycle.shutdown().await;

    assert_eq!(report.drain, DrainOutcome::Flushed { events: 37 });
    assert!(report.is_clean());
    assert!(report.drain_error().is_none());
    assert_eq!(store.batch_sizes(), vec![37]);
    assert_eq!(report.final_stats.total_processed, 37);
    assert_eq!(report.final_stats.queue_size, 0);
    assert!(report.final_stats.is_consistent());
    assert!(!store.is_open());
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_rejects_new_admissions() {
    let buffer = Arc::new(EventBuffer::new(10));
    let store = Arc::new(MemoryStore::new());
    let lifecycle = LifecycleController::start(buffer.clone(), store, idle_config())
        .await
        .unwrap();

    let report = lifecycle.shutdown().await;
    assert_eq!(report.drain, DrainOutcome::Empty);

    assert_eq!(buffer.admit(event(1)), Err(AdmitError::Closed));
    assert_eq!(buffer.stats().total_dropped, 1);
}

#[tokio::test]
async fn test_startup_failure_never_starts_scheduler() {
    let buffer = Arc::new(EventBuffer::new(10));
    let store = Arc::new(MemoryStore::with_name("broken"));
    store.set_fail_open(true);

    let err = LifecycleController::start(buffer.clone(), store.clone(), idle_config())
        .await
        .unwrap_err();

    match err {
        PipelineError::StartupFailure { store, .. } => assert_eq!(store, "broken"),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(store.write_calls(), 0);
    assert!(!buffer.is_closed());
}

#[tokio::test]
async fn test_invalid_config_fails_before_open() {
    let buffer = Arc::new(EventBuffer::new(10));
    let store = Arc::new(MemoryStore::new());
    let config = SchedulerConfig {
        poll_interval: Duration::ZERO,
        ..SchedulerConfig::default()
    };

    let result = LifecycleController::start(buffer, store.clone(), config).await;
    assert!(matches!(result, Err(PipelineError::InvalidConfig(_))));
    assert!(!store.is_open());
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_flush_failure_is_reported() {
    let buffer = Arc::new(EventBuffer::new(100));
    let store = Arc::new(MemoryStore::new());
    let lifecycle = LifecycleController::start(buffer.clone(), store.clone(), idle_config())
        .await
        .unwrap();

    for i in 1..=5 {
        buffer.admit(event(i)).unwrap();
    }
    store.set_failing(true);

    let report = lifecycle.shutdown().await;

    assert!(!report.is_clean());
    assert_eq!(report.drained(), 5);
    assert_eq!(report.final_stats.total_failed, 5);
    assert!(report.final_stats.is_consistent());
    match report.drain_error() {
        Some(PipelineError::ShutdownFlushFailure { events, .. }) => assert_eq!(events, 5),
        other => panic!("unexpected drain error: {other:?}"),
    }
    // Store is still closed after a failed drain
    assert!(!store.is_open());
}

#[tokio::test(start_paused = true)]
async fn test_flush_metrics_shared_with_controller() {
    let buffer = Arc::new(EventBuffer::new(100));
    let store = Arc::new(MemoryStore::new());
    let config = SchedulerConfig {
        max_batch_size: 2,
        ..SchedulerConfig::default()
    };
    let lifecycle = LifecycleController::start(buffer.clone(), store.clone(), config)
        .await
        .unwrap();
    let metrics = lifecycle.flush_metrics();

    buffer.admit(event(1)).unwrap();
    buffer.admit(event(2)).unwrap();
    tokio::time::sleep(Duration::from_millis(250)).await;

    assert_eq!(metrics.snapshot().events_flushed, 2);
    assert_eq!(lifecycle.store().event_count().await.unwrap(), Some(2));

    let report = lifecycle.shutdown().await;
    assert_eq!(report.flush.events_flushed, 2);
}
