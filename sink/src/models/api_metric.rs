use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::{created_at_from_millis, FromPayload, MappingError, MessageKind};

/// Timing and outcome of one API request served by the school application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiMetricPayload {
    pub endpoint: String,
    pub method: String,
    pub status_code: i32,
    pub response_time_ms: i32,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub school_id: Option<String>,
    #[serde(default)]
    pub error_message: Option<String>,
    pub timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct ApiMetric {
    pub id: String,
    pub endpoint: String,
    pub method: String,
    pub status_code: i32,
    pub response_time_ms: i32,
    pub user_id: Option<String>,
    pub school_id: Option<String>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl FromPayload for ApiMetric {
    type Payload = ApiMetricPayload;

    const KIND: MessageKind = MessageKind::ApiMetric;

    fn from_payload(payload: ApiMetricPayload) -> Result<Self, MappingError> {
        Ok(ApiMetric {
            id: Uuid::new_v4().to_string(),
            created_at: created_at_from_millis(payload.timestamp)?,
            endpoint: payload.endpoint,
            method: payload.method,
            status_code: payload.status_code,
            response_time_ms: payload.response_time_ms,
            user_id: payload.user_id,
            school_id: payload.school_id,
            error_message: payload.error_message,
        })
    }
}
