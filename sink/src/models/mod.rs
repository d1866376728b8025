pub mod activity_log;
pub mod api_metric;
pub mod audit_log;
pub mod queue_message;

use chrono::{DateTime, Utc};
use thiserror::Error;

pub use queue_message::{Classified, MessageKind, QueueMessage, RawMessage};

/// Failure while turning an inbound payload into a persistable row.
#[derive(Debug, Error)]
pub enum MappingError {
    #[error("{kind} payload could not be decoded: {source}")]
    Decode {
        kind: MessageKind,
        #[source]
        source: serde_json::Error,
    },
    #[error("timestamp {0} is outside the representable date range")]
    TimestampOutOfRange(i64),
}

/// Row Mapper: builds one persistable row from one inbound payload.
pub trait FromPayload: Sized + Send + Sync + 'static {
    type Payload: Send + 'static;

    const KIND: MessageKind;

    fn from_payload(payload: Self::Payload) -> Result<Self, MappingError>;
}

/// Converts an epoch-millisecond event timestamp into the row's `created_at`.
///
/// Rows always carry the producer's event time, never the ingestion wall clock, so a
/// redelivered batch keeps its original timestamps.
pub fn created_at_from_millis(timestamp: i64) -> Result<DateTime<Utc>, MappingError> {
    DateTime::from_timestamp_millis(timestamp).ok_or(MappingError::TimestampOutOfRange(timestamp))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn created_at_from_millis_keeps_millisecond_precision() {
        let created_at = created_at_from_millis(1_700_000_000_123).expect("valid timestamp");
        assert_eq!(created_at.timestamp_millis(), 1_700_000_000_123);
        assert_eq!(created_at.to_rfc3339(), "2023-11-14T22:13:20.123+00:00");
    }

    #[test]
    fn created_at_from_millis_accepts_epoch_zero() {
        let created_at = created_at_from_millis(0).expect("epoch");
        assert_eq!(created_at.timestamp(), 0);
    }

    #[test]
    fn created_at_from_millis_rejects_out_of_range_values() {
        let err = created_at_from_millis(i64::MAX).expect_err("out of range");
        assert!(matches!(err, MappingError::TimestampOutOfRange(i64::MAX)));
    }
}
