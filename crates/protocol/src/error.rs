//! Event error types
//!
//! Errors raised while validating an incoming event record.

use thiserror::Error;

/// Errors that can occur when validating an event
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EventError {
    /// Producer identifier is zero or negative
    #[error("user_id must be a positive integer, got {0}")]
    InvalidProducerId(i64),

    /// Timestamp is not an ISO-8601 date/time
    #[error("timestamp must be valid ISO format (e.g., 2024-01-01T12:00:00Z), got '{0}'")]
    InvalidTimestamp(String),

    /// Metadata is present but not a JSON object
    #[error("metadata must be a JSON object, got {0}")]
    InvalidMetadata(&'static str),
}

impl EventError {
    /// Create an invalid timestamp error
    #[inline]
    pub fn invalid_timestamp(value: impl Into<String>) -> Self {
        Self::InvalidTimestamp(value.into())
    }

    /// Short machine-readable code used in HTTP error bodies
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidProducerId(_) => "invalid_user_id",
            Self::InvalidTimestamp(_) => "invalid_timestamp",
            Self::InvalidMetadata(_) => "invalid_metadata",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = EventError::InvalidProducerId(-4);
        assert!(err.to_string().contains("positive"));
        assert!(err.to_string().contains("-4"));

        let err = EventError::invalid_timestamp("yesterday");
        assert!(err.to_string().contains("yesterday"));

        let err = EventError::InvalidMetadata("array");
        assert!(err.to_string().contains("array"));
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(EventError::InvalidProducerId(0).code(), "invalid_user_id");
        assert_eq!(
            EventError::invalid_timestamp("x").code(),
            "invalid_timestamp"
        );
        assert_eq!(EventError::InvalidMetadata("string").code(), "invalid_metadata");
    }
}
