//! Queue envelopes and their classification into the known telemetry types.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::models::{
    activity_log::ActivityLogPayload, api_metric::ApiMetricPayload,
    audit_log::AuditLogPayload, MappingError,
};

/// A message exactly as the queue transport delivered it.
///
/// The body is kept as raw JSON so that one malformed message can be attributed to its
/// own type group instead of failing the decode of the whole batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawMessage {
    pub id: String,
    pub body: Value,
    /// Delivery count, starting at 1 for the first delivery.
    #[serde(default = "first_attempt")]
    pub attempts: u32,
}

fn first_attempt() -> u32 {
    1
}

impl RawMessage {
    pub fn new(id: impl Into<String>, body: Value) -> Self {
        Self {
            id: id.into(),
            body,
            attempts: first_attempt(),
        }
    }

    pub fn is_redelivery(&self) -> bool {
        self.attempts > first_attempt()
    }
}

/// The closed set of message types this consumer persists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    AuditLog,
    ActivityLog,
    ApiMetric,
}

impl MessageKind {
    pub const ALL: [MessageKind; 3] = [
        MessageKind::AuditLog,
        MessageKind::ActivityLog,
        MessageKind::ApiMetric,
    ];

    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "audit_log" => Some(MessageKind::AuditLog),
            "activity_log" => Some(MessageKind::ActivityLog),
            "api_metric" => Some(MessageKind::ApiMetric),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MessageKind::AuditLog => "audit_log",
            MessageKind::ActivityLog => "activity_log",
            MessageKind::ApiMetric => "api_metric",
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Typed view of a queue message body: `{ "type": <tag>, "payload": { ... } }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum QueueMessage {
    AuditLog(AuditLogPayload),
    ActivityLog(ActivityLogPayload),
    ApiMetric(ApiMetricPayload),
}

impl QueueMessage {
    pub fn kind(&self) -> MessageKind {
        match self {
            QueueMessage::AuditLog(_) => MessageKind::AuditLog,
            QueueMessage::ActivityLog(_) => MessageKind::ActivityLog,
            QueueMessage::ApiMetric(_) => MessageKind::ApiMetric,
        }
    }

    /// Sorts a raw body into a known message, a known type with a bad payload, or an
    /// unknown type.
    pub fn classify(body: &Value) -> Classified {
        let tag = match body.get("type").and_then(Value::as_str) {
            Some(tag) => tag,
            None => return Classified::Unknown(None),
        };
        let Some(kind) = MessageKind::from_tag(tag) else {
            return Classified::Unknown(Some(tag.to_string()));
        };

        match serde_json::from_value::<QueueMessage>(body.clone()) {
            Ok(message) => Classified::Known(message),
            Err(source) => Classified::Malformed {
                kind,
                error: MappingError::Decode { kind, source },
            },
        }
    }
}

#[derive(Debug)]
pub enum Classified {
    Known(QueueMessage),
    /// The tag names a known type but the payload does not match its shape.
    Malformed { kind: MessageKind, error: MappingError },
    /// Missing or unrecognised tag.
    Unknown(Option<String>),
}
