use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::Value;

use crate::services::BatchError;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

#[derive(Debug)]
pub enum AppError {
    BadRequest(String),
    /// The batch was not acknowledged; the transport must redeliver all of it.
    BatchRetry(BatchError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message, code, details) = match self {
            AppError::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                msg,
                "BAD_REQUEST".to_string(),
                None,
            ),
            AppError::BatchRetry(err) => {
                let failed: Vec<&'static str> = err
                    .failures
                    .iter()
                    .map(|failure| failure.kind.as_str())
                    .collect();
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    err.to_string(),
                    "BATCH_RETRY".to_string(),
                    Some(serde_json::json!({ "failed": failed })),
                )
            }
        };

        let body = Json(ErrorResponse {
            error: error_message,
            code,
            details,
        });

        (status, body).into_response()
    }
}

impl From<BatchError> for AppError {
    fn from(err: BatchError) -> Self {
        AppError::BatchRetry(err)
    }
}
