use crate::db::{InsertRow, SqlValue};
use crate::models::audit_log::AuditLog;
use crate::repositories::TableRepository;

pub type AuditLogRepository = TableRepository<AuditLog>;

impl InsertRow for AuditLog {
    const TABLE: &'static str = "audit_logs";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "school_id",
        "user_id",
        "action",
        "table_name",
        "record_id",
        "old_values",
        "new_values",
        "ip_address",
        "user_agent",
        "created_at",
    ];

    fn values(&self) -> Vec<SqlValue> {
        vec![
            SqlValue::Text(Some(self.id.clone())),
            SqlValue::Text(Some(self.school_id.clone())),
            SqlValue::Text(Some(self.user_id.clone())),
            SqlValue::Text(Some(self.action.as_str().to_string())),
            SqlValue::Text(Some(self.table_name.clone())),
            SqlValue::Text(Some(self.record_id.clone())),
            SqlValue::Json(self.old_values.as_ref().map(|value| value.0.clone())),
            SqlValue::Json(self.new_values.as_ref().map(|value| value.0.clone())),
            SqlValue::Text(self.ip_address.clone()),
            SqlValue::Text(self.user_agent.clone()),
            SqlValue::Timestamp(self.created_at),
        ]
    }
}
