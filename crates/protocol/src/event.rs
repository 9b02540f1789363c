//! Event record
//!
//! `Event` is the unit of transfer through the pipeline. It is created by the
//! ingestion gateway from a `RawEvent`, owned by the buffer while queued and
//! handed to a store as part of a batch.

use std::fmt;
use std::num::NonZeroU64;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::EventError;

/// Arbitrary nested key-value payload attached to an event
pub type Metadata = Map<String, Value>;

/// Date/time layouts with a UTC offset (`Z`, `+05`, `+0530` or `+05:30`)
const OFFSET_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%#z",
    "%Y-%m-%d %H:%M:%S%.f%#z",
    "%Y-%m-%dT%H:%M%#z",
    "%Y-%m-%d %H:%M%#z",
];

/// Naive (offset-less) date/time layouts
const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Positive producer identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ProducerId(NonZeroU64);

impl ProducerId {
    /// Create a producer id, rejecting zero and negative values
    pub fn new(id: i64) -> Result<Self, EventError> {
        u64::try_from(id)
            .ok()
            .and_then(NonZeroU64::new)
            .map(Self)
            .ok_or(EventError::InvalidProducerId(id))
    }

    /// Get the raw value
    #[inline]
    pub fn get(self) -> u64 {
        self.0.get()
    }
}

impl fmt::Display for ProducerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unvalidated event as it arrives on the wire
///
/// Every field is checked by `Event::try_from`. `producer_id` is accepted as
/// an alias of `user_id`.
#[derive(Debug, Clone, Deserialize)]
pub struct RawEvent {
    /// Producer identifier (must be > 0)
    #[serde(alias = "producer_id")]
    pub user_id: i64,

    /// ISO-8601 timestamp
    pub timestamp: String,

    /// Metadata object (defaults to `{}`)
    #[serde(default)]
    pub metadata: Option<Value>,
}

/// A validated event record
///
/// The timestamp is kept exactly as submitted; validation only guarantees it
/// parses as ISO-8601.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawEvent")]
pub struct Event {
    #[serde(rename = "user_id")]
    producer_id: ProducerId,
    timestamp: String,
    metadata: Metadata,
}

impl Event {
    /// Create an event, validating the timestamp
    pub fn new(
        producer_id: ProducerId,
        timestamp: impl Into<String>,
        metadata: Metadata,
    ) -> Result<Self, EventError> {
        let timestamp = timestamp.into();
        validate_timestamp(&timestamp)?;
        Ok(Self {
            producer_id,
            timestamp,
            metadata,
        })
    }

    /// Producer that submitted this event
    #[inline]
    pub fn producer_id(&self) -> ProducerId {
        self.producer_id
    }

    /// Timestamp as submitted
    #[inline]
    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    /// Metadata payload
    #[inline]
    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Serialize the metadata payload to a JSON string for storage
    pub fn metadata_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.metadata)
    }

    /// Decompose into (producer, timestamp, metadata)
    pub fn into_parts(self) -> (ProducerId, String, Metadata) {
        (self.producer_id, self.timestamp, self.metadata)
    }
}

impl TryFrom<RawEvent> for Event {
    type Error = EventError;

    fn try_from(raw: RawEvent) -> Result<Self, Self::Error> {
        let producer_id = ProducerId::new(raw.user_id)?;

        let metadata = match raw.metadata {
            None | Some(Value::Null) => Metadata::new(),
            Some(Value::Object(map)) => map,
            Some(other) => return Err(EventError::InvalidMetadata(json_type_name(&other))),
        };

        Self::new(producer_id, raw.timestamp, metadata)
    }
}

/// Check that a string is an ISO-8601 timestamp
///
/// Accepts extended-format date/times with or without seconds, fractions
/// and a UTC offset (`2024-01-01T12:00Z`, `2024-01-01 12:00:00.5+0530`), and
/// plain dates (`2024-01-01`). Basic (compact) forms such as `20240101` and
/// hour-only times are rejected.
pub fn validate_timestamp(value: &str) -> Result<(), EventError> {
    if value.is_empty() {
        return Err(EventError::invalid_timestamp(value));
    }

    if DateTime::parse_from_rfc3339(value).is_ok()
        || OFFSET_DATETIME_FORMATS
            .iter()
            .any(|fmt| DateTime::parse_from_str(value, fmt).is_ok())
    {
        return Ok(());
    }

    if NAIVE_DATETIME_FORMATS
        .iter()
        .any(|fmt| NaiveDateTime::parse_from_str(value, fmt).is_ok())
    {
        return Ok(());
    }

    if NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok() {
        return Ok(());
    }

    Err(EventError::invalid_timestamp(value))
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
