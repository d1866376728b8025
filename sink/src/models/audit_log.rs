use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::{types::Json, FromRow};
use uuid::Uuid;

use crate::models::{created_at_from_millis, FromPayload, MappingError, MessageKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    Create,
    Update,
    Delete,
    View,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::Create => "create",
            AuditAction::Update => "update",
            AuditAction::Delete => "delete",
            AuditAction::View => "view",
        }
    }
}

/// A data mutation (or read) recorded by the school application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditLogPayload {
    pub user_id: String,
    pub school_id: String,
    pub action: AuditAction,
    pub table_name: String,
    pub record_id: String,
    #[serde(default)]
    pub old_values: Option<Value>,
    #[serde(default)]
    pub new_values: Option<Value>,
    #[serde(default)]
    pub ip_address: Option<String>,
    #[serde(default)]
    pub user_agent: Option<String>,
    pub timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct AuditLog {
    pub id: String,
    pub school_id: String,
    pub user_id: String,
    pub action: AuditAction,
    pub table_name: String,
    pub record_id: String,
    pub old_values: Option<Json<Value>>,
    pub new_values: Option<Json<Value>>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl FromPayload for AuditLog {
    type Payload = AuditLogPayload;

    const KIND: MessageKind = MessageKind::AuditLog;

    fn from_payload(payload: AuditLogPayload) -> Result<Self, MappingError> {
        Ok(AuditLog {
            id: Uuid::new_v4().to_string(),
            created_at: created_at_from_millis(payload.timestamp)?,
            school_id: payload.school_id,
            user_id: payload.user_id,
            action: payload.action,
            table_name: payload.table_name,
            record_id: payload.record_id,
            old_values: payload.old_values.map(Json),
            new_values: payload.new_values.map(Json),
            ip_address: payload.ip_address,
            user_agent: payload.user_agent,
        })
    }
}
