//! Tests for event validation and wire format

use serde_json::json;

use crate::error::EventError;
use crate::event::{Event, Metadata, ProducerId, RawEvent, validate_timestamp};

fn producer(id: i64) -> ProducerId {
    ProducerId::new(id).unwrap()
}

// =============================================================================
// ProducerId
// =============================================================================

#[test]
fn test_producer_id_positive() {
    assert_eq!(producer(1).get(), 1);
    assert_eq!(producer(i64::MAX).get(), i64::MAX as u64);
    assert_eq!(producer(42).to_string(), "42");
}

#[test]
fn test_producer_id_rejects_zero_and_negative() {
    assert_eq!(ProducerId::new(0), Err(EventError::InvalidProducerId(0)));
    assert_eq!(ProducerId::new(-7), Err(EventError::InvalidProducerId(-7)));
}

// =============================================================================
// Timestamps
// =============================================================================

#[test]
fn test_validate_timestamp_accepts_iso_formats() {
    for ts in [
        "2024-01-01T12:00:00Z",
        "2024-01-01T12:00:00+02:00",
        "2024-01-01T12:00:00.123456Z",
        "2024-01-01T12:00:00",
        "2024-01-01T12:00:00.5",
        "2024-01-01 12:00:00",
        "2024-01-01T12:00",
        "2024-01-01",
        "2024-01-01T12:00Z",
        "2024-01-01T12:00:00+0530",
        "2024-01-01T12:00:00+05",
        "2024-01-01 12:00:00.250-07:00",
        "2024-01-01 12:30+01:00",
    ] {
        assert!(validate_timestamp(ts).is_ok(), "expected {ts} to be valid");
    }
}

#[test]
fn test_validate_timestamp_rejects_garbage() {
    for ts in [
        "",
        "yesterday",
        "2024-13-01",
        "2024-01-01T25:00:00",
        "1704110400",
        "2024-01-01T12:00:00+25:00",
    ] {
        assert_eq!(
            validate_timestamp(ts),
            Err(EventError::invalid_timestamp(ts)),
            "expected {ts} to be rejected"
        );
    }
}

#[test]
fn test_event_keeps_timestamp_verbatim() {
    let event = Event::new(producer(3), "2024-01-01T12:00:00+02:00", Metadata::new()).unwrap();
    assert_eq!(event.timestamp(), "2024-01-01T12:00:00+02:00");
}

// =============================================================================
// Wire decoding
// =============================================================================

#[test]
fn test_deserialize_full_event() {
    let event: Event = serde_json::from_value(json!({
        "user_id": 12,
        "timestamp": "2024-01-01T12:00:00Z",
        "metadata": {"page": "/home", "device": {"type": "mobile"}}
    }))
    .unwrap();

    assert_eq!(event.producer_id().get(), 12);
    assert_eq!(event.metadata()["page"], "/home");
    assert_eq!(event.metadata()["device"]["type"], "mobile");
}

#[test]
fn test_deserialize_missing_metadata_defaults_to_empty() {
    let event: Event = serde_json::from_value(json!({
        "user_id": 1,
        "timestamp": "2024-01-01"
    }))
    .unwrap();
    assert!(event.metadata().is_empty());

    let event: Event = serde_json::from_value(json!({
        "user_id": 1,
        "timestamp": "2024-01-01",
        "metadata": null
    }))
    .unwrap();
    assert!(event.metadata().is_empty());
}

#[test]
fn test_deserialize_producer_id_alias() {
    let event: Event = serde_json::from_value(json!({
        "producer_id": 5,
        "timestamp": "2024-01-01T00:00:00Z"
    }))
    .unwrap();
    assert_eq!(event.producer_id().get(), 5);
}

#[test]
fn test_try_from_rejects_non_object_metadata() {
    let raw: RawEvent = serde_json::from_value(json!({
        "user_id": 1,
        "timestamp": "2024-01-01T00:00:00Z",
        "metadata": [1, 2, 3]
    }))
    .unwrap();

    assert_eq!(Event::try_from(raw), Err(EventError::InvalidMetadata("array")));
}

#[test]
fn test_try_from_rejects_bad_user_id_before_timestamp() {
    let raw: RawEvent = serde_json::from_value(json!({
        "user_id": 0,
        "timestamp": "nope"
    }))
    .unwrap();

    assert_eq!(Event::try_from(raw), Err(EventError::InvalidProducerId(0)));
}

#[test]
fn test_deserialize_invalid_event_is_an_error() {
    let result: Result<Event, _> = serde_json::from_value(json!({
        "user_id": -1,
        "timestamp": "2024-01-01T00:00:00Z"
    }));
    let err = result.unwrap_err();
    assert!(err.to_string().contains("positive"));
}

#[test]
fn test_serialize_uses_wire_field_names() {
    let mut metadata = Metadata::new();
    metadata.insert("action".into(), json!("click"));
    let event = Event::new(producer(9), "2024-01-01T00:00:00Z", metadata).unwrap();

    let value = serde_json::to_value(&event).unwrap();
    assert_eq!(
        value,
        json!({
            "user_id": 9,
            "timestamp": "2024-01-01T00:00:00Z",
            "metadata": {"action": "click"}
        })
    );
    assert_eq!(event.metadata_json().unwrap(), r#"{"action":"click"}"#);
}
