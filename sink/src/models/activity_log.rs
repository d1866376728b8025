use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::{types::Json, FromRow};
use uuid::Uuid;

use crate::models::{created_at_from_millis, FromPayload, MappingError, MessageKind};

/// A user-level action in the school application (login, export, page usage...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityLogPayload {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub school_id: Option<String>,
    pub action: String,
    #[serde(default)]
    pub resource: Option<String>,
    #[serde(default)]
    pub resource_id: Option<String>,
    #[serde(default)]
    pub metadata: Option<Value>,
    #[serde(default)]
    pub ip_address: Option<String>,
    #[serde(default)]
    pub user_agent: Option<String>,
    pub timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct ActivityLog {
    pub id: String,
    pub user_id: Option<String>,
    pub school_id: Option<String>,
    pub action: String,
    pub resource: Option<String>,
    pub resource_id: Option<String>,
    pub metadata: Option<Json<Value>>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl FromPayload for ActivityLog {
    type Payload = ActivityLogPayload;

    const KIND: MessageKind = MessageKind::ActivityLog;

    fn from_payload(payload: ActivityLogPayload) -> Result<Self, MappingError> {
        Ok(ActivityLog {
            id: Uuid::new_v4().to_string(),
            created_at: created_at_from_millis(payload.timestamp)?,
            user_id: payload.user_id,
            school_id: payload.school_id,
            action: payload.action,
            resource: payload.resource,
            resource_id: payload.resource_id,
            metadata: payload.metadata.map(Json),
            ip_address: payload.ip_address,
            user_agent: payload.user_agent,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn from_payload_passes_absent_fields_through_as_none() {
        let payload: ActivityLogPayload = serde_json::from_value(json!({
            "action": "login",
            "timestamp": 1_700_000_000_000_i64
        }))
        .expect("decode payload");

        let row = ActivityLog::from_payload(payload).expect("map activity log");
        assert_eq!(row.action, "login");
        assert_eq!(row.user_id, None);
        assert_eq!(row.school_id, None);
        assert_eq!(row.resource, None);
        assert_eq!(row.metadata, None);
        assert_eq!(row.created_at.timestamp_millis(), 1_700_000_000_000);
    }

    #[test]
    fn from_payload_keeps_metadata_verbatim() {
        let metadata = json!({ "format": "csv", "rows": 120, "filters": ["class:6A"] });
        let payload = ActivityLogPayload {
            user_id: Some("user-7".into()),
            school_id: Some("school-2".into()),
            action: "export".into(),
            resource: Some("report_cards".into()),
            resource_id: Some("term-1".into()),
            metadata: Some(metadata.clone()),
            ip_address: None,
            user_agent: Some("Mozilla/5.0".into()),
            timestamp: 1_699_999_999_999,
        };

        let row = ActivityLog::from_payload(payload).expect("map activity log");
        assert_eq!(row.metadata, Some(Json(metadata)));
        assert_eq!(row.resource.as_deref(), Some("report_cards"));
        assert_eq!(row.user_agent.as_deref(), Some("Mozilla/5.0"));
    }

    #[test]
    fn from_payload_fails_for_unrepresentable_timestamp() {
        let payload = ActivityLogPayload {
            user_id: None,
            school_id: None,
            action: "login".into(),
            resource: None,
            resource_id: None,
            metadata: None,
            ip_address: None,
            user_agent: None,
            timestamp: i64::MIN,
        };

        let err = ActivityLog::from_payload(payload).expect_err("out of range");
        assert!(matches!(err, MappingError::TimestampOutOfRange(_)));
    }
}
