//! Firehose Protocol - Core event types for the Firehose collector
//!
//! This crate provides the record that flows through the pipeline:
//! - `Event` - A validated event (producer, timestamp, metadata)
//! - `ProducerId` - Positive producer identifier
//! - `RawEvent` - Unvalidated wire shape as received from clients
//!
//! # Design Principles
//!
//! - **Validated at the boundary**: An `Event` can only be constructed from
//!   valid parts, so the pipeline never re-checks records
//! - **Opaque metadata**: The metadata object is carried as-is and only
//!   serialized when a store asks for it
//!
//! # Wire Format
//!
//! ```json
//! {
//!   "user_id": 12345,
//!   "timestamp": "2024-01-14T10:30:00Z",
//!   "metadata": {"page": "/home", "action": "click", "nested": {"key": "value"}}
//! }
//! ```

mod error;
mod event;

pub use error::EventError;
pub use event::{Event, Metadata, ProducerId, RawEvent, validate_timestamp};

/// Result type for event operations
pub type Result<T> = std::result::Result<T, EventError>;

#[cfg(test)]
mod event_test;
