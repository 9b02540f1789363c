//! Tests for the memory store

use std::time::Duration;

use super::MemoryStore;
use crate::{EventStore, SinkError};
use firehose_protocol::{Event, Metadata, ProducerId};

fn create_events(range: std::ops::Range<i64>) -> Vec<Event> {
    range
        .map(|i| {
            let producer = ProducerId::new(i).unwrap();
            Event::new(producer, "2024-01-01T00:00:00Z", Metadata::new()).unwrap()
        })
        .collect()
}

#[tokio::test]
async fn test_retains_events_in_order() {
    let store = MemoryStore::new();
    store.open().await.unwrap();

    store.write_batch(&create_events(1..4)).await.unwrap();
    store.write_batch(&create_events(4..6)).await.unwrap();

    let ids: Vec<u64> = store.events().iter().map(|e| e.producer_id().get()).collect();
    assert_eq!(ids, vec![1, 2, 3, 4, 5]);
    assert_eq!(store.batch_sizes(), vec![3, 2]);
    assert_eq!(store.event_count().await.unwrap(), Some(5));
}

#[tokio::test]
async fn test_fail_next_is_consumed() {
    let store = MemoryStore::new();
    store.open().await.unwrap();
    store.fail_next(1);

    let result = store.write_batch(&create_events(1..3)).await;
    assert!(matches!(result, Err(SinkError::Write(_))));

    assert_eq!(store.write_batch(&create_events(1..3)).await.unwrap(), 2);
    assert_eq!(store.write_calls(), 2);
    assert_eq!(store.len(), 2);

    let metrics = store.metrics();
    assert_eq!(metrics.write_errors, 1);
    assert_eq!(metrics.events_failed, 2);
    assert_eq!(metrics.events_written, 2);
}

#[tokio::test]
async fn test_set_failing_persists_until_cleared() {
    let store = MemoryStore::new();
    store.open().await.unwrap();
    store.set_failing(true);

    for _ in 0..3 {
        assert!(store.write_batch(&create_events(1..2)).await.is_err());
    }
    store.set_failing(false);
    assert!(store.write_batch(&create_events(1..2)).await.is_ok());
    assert!(!store.is_empty());
}

#[tokio::test]
async fn test_panic_injection() {
    let store = std::sync::Arc::new(MemoryStore::new());
    store.open().await.unwrap();
    store.panic_next(1);

    let task_store = store.clone();
    let result = tokio::spawn(async move {
        let events = create_events(1..2);
        task_store.write_batch(&events).await
    })
    .await;
    assert!(result.unwrap_err().is_panic());

    assert!(store.write_batch(&create_events(1..2)).await.is_ok());
}

#[tokio::test(start_paused = true)]
async fn test_write_delay() {
    let store = MemoryStore::new();
    store.open().await.unwrap();
    store.set_write_delay(Some(Duration::from_secs(5)));

    let started = tokio::time::Instant::now();
    store.write_batch(&create_events(1..2)).await.unwrap();
    assert!(started.elapsed() >= Duration::from_secs(5));
}

#[tokio::test]
async fn test_open_failure_and_close() {
    let store = MemoryStore::new();
    store.set_fail_open(true);
    assert!(matches!(store.open().await, Err(SinkError::Init(_))));
    assert!(!store.is_open());

    store.set_fail_open(false);
    store.open().await.unwrap();
    assert!(store.is_open());

    store.close().await.unwrap();
    let result = store.write_batch(&create_events(1..2)).await;
    assert!(matches!(result, Err(SinkError::NotOpen(_))));
}
