use crate::db::{InsertRow, SqlValue};
use crate::models::activity_log::ActivityLog;
use crate::repositories::TableRepository;

pub type ActivityLogRepository = TableRepository<ActivityLog>;

impl InsertRow for ActivityLog {
    const TABLE: &'static str = "activity_logs";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "user_id",
        "school_id",
        "action",
        "resource",
        "resource_id",
        "metadata",
        "ip_address",
        "user_agent",
        "created_at",
    ];

    fn values(&self) -> Vec<SqlValue> {
        vec![
            SqlValue::Text(Some(self.id.clone())),
            SqlValue::Text(self.user_id.clone()),
            SqlValue::Text(self.school_id.clone()),
            SqlValue::Text(Some(self.action.clone())),
            SqlValue::Text(self.resource.clone()),
            SqlValue::Text(self.resource_id.clone()),
            SqlValue::Json(self.metadata.as_ref().map(|value| value.0.clone())),
            SqlValue::Text(self.ip_address.clone()),
            SqlValue::Text(self.user_agent.clone()),
            SqlValue::Timestamp(self.created_at),
        ]
    }
}
