use crate::db::{InsertRow, SqlValue};
use crate::models::api_metric::ApiMetric;
use crate::repositories::TableRepository;

pub type ApiMetricRepository = TableRepository<ApiMetric>;

impl InsertRow for ApiMetric {
    const TABLE: &'static str = "api_metrics";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "endpoint",
        "method",
        "status_code",
        "response_time_ms",
        "user_id",
        "school_id",
        "error_message",
        "created_at",
    ];

    fn values(&self) -> Vec<SqlValue> {
        vec![
            SqlValue::Text(Some(self.id.clone())),
            SqlValue::Text(Some(self.endpoint.clone())),
            SqlValue::Text(Some(self.method.clone())),
            SqlValue::Int(Some(self.status_code)),
            SqlValue::Int(Some(self.response_time_ms)),
            SqlValue::Text(self.user_id.clone()),
            SqlValue::Text(self.school_id.clone()),
            SqlValue::Text(self.error_message.clone()),
            SqlValue::Timestamp(self.created_at),
        ]
    }
}
