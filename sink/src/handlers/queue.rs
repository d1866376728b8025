use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::{error::AppError, models::RawMessage, services::Acknowledgement, state::AppState};

/// One pushed batch, as delivered by the queue transport.
#[derive(Debug, Deserialize, Serialize)]
pub struct QueueBatchRequest {
    pub messages: Vec<RawMessage>,
}

/// `200` acknowledges every message; `503` asks the transport to redeliver the batch.
pub async fn consume_batch(
    State(state): State<AppState>,
    payload: Result<Json<QueueBatchRequest>, JsonRejection>,
) -> Result<Json<Acknowledgement>, AppError> {
    let Json(request) = payload.map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;
    let retried = request
        .messages
        .iter()
        .filter(|message| message.is_redelivery())
        .count();
    if retried > 0 {
        tracing::info!(
            messages = request.messages.len(),
            retried,
            "Received redelivered batch"
        );
    }

    let ack = state.dispatcher.process(&request.messages).await?;
    Ok(Json(ack))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DriverKind;
    use crate::handlers::router;
    use crate::models::{activity_log::ActivityLog, api_metric::ApiMetric, audit_log::AuditLog};
    use crate::repositories::memory::RecordingRepository;
    use crate::services::BatchDispatcher;
    use axum::{
        body::Body,
        http::{header::CONTENT_TYPE, Request, StatusCode},
    };
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tower::ServiceExt;

    struct TestApp {
        audit_logs: Arc<RecordingRepository<AuditLog>>,
        activity_logs: Arc<RecordingRepository<ActivityLog>>,
        api_metrics: Arc<RecordingRepository<ApiMetric>>,
        router: axum::Router,
    }

    fn test_app() -> TestApp {
        let audit_logs = Arc::new(RecordingRepository::new());
        let activity_logs = Arc::new(RecordingRepository::new());
        let api_metrics = Arc::new(RecordingRepository::new());
        let dispatcher = BatchDispatcher::new(
            audit_logs.clone(),
            activity_logs.clone(),
            api_metrics.clone(),
        );
        TestApp {
            audit_logs,
            activity_logs,
            api_metrics,
            router: router(AppState::new(dispatcher, DriverKind::Pooled)),
        }
    }

    fn batch_request(body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/queue/batch")
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("request")
    }

    async fn response_json(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read body");
        serde_json::from_slice(&bytes).expect("json")
    }

    fn batch_body() -> Value {
        json!({
            "messages": [
                {
                    "id": "m-1",
                    "attempts": 1,
                    "body": {
                        "type": "api_metric",
                        "payload": {
                            "endpoint": "/api/schools",
                            "method": "GET",
                            "statusCode": 200,
                            "responseTimeMs": 42,
                            "timestamp": 1_700_000_000_000_i64
                        }
                    }
                },
                {
                    "id": "m-2",
                    "attempts": 1,
                    "body": {
                        "type": "activity_log",
                        "payload": { "action": "login", "timestamp": 1_700_000_000_000_i64 }
                    }
                },
                {
                    "id": "m-3",
                    "body": { "type": "notification", "payload": {} }
                }
            ]
        })
    }

    #[tokio::test]
    async fn consume_batch_acknowledges_every_message() {
        let app = test_app();

        let response = app
            .router
            .clone()
            .oneshot(batch_request(batch_body()))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let json = response_json(response).await;
        assert_eq!(json["acknowledged"], json!(["m-1", "m-2", "m-3"]));
        assert_eq!(json["written"]["api_metrics"], 1);
        assert_eq!(json["written"]["activity_logs"], 1);
        assert_eq!(json["written"]["audit_logs"], 0);
        assert_eq!(json["dropped"], 1);
        assert_eq!(app.api_metrics.rows().len(), 1);
        assert_eq!(app.audit_logs.call_count(), 0);
    }

    #[tokio::test]
    async fn consume_batch_requests_redelivery_when_a_handler_fails() {
        let app = test_app();
        app.activity_logs.fail_with(Some("deadlock detected".into()));

        let response = app
            .router
            .clone()
            .oneshot(batch_request(batch_body()))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let json = response_json(response).await;
        assert_eq!(json["code"], "BATCH_RETRY");
        assert_eq!(json["details"]["failed"], json!(["activity_log"]));
        assert!(json.get("acknowledged").is_none());
        // The metric group succeeded independently and stays written.
        assert_eq!(app.api_metrics.rows().len(), 1);
    }

    #[tokio::test]
    async fn consume_batch_rejects_body_without_messages() {
        let app = test_app();

        let response = app
            .router
            .clone()
            .oneshot(batch_request(json!({ "batch": [] })))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = response_json(response).await;
        assert_eq!(json["code"], "BAD_REQUEST");
        assert_eq!(app.api_metrics.call_count(), 0);
    }

    #[tokio::test]
    async fn health_reports_driver() {
        let app = test_app();

        let response = app
            .router
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let json = response_json(response).await;
        assert_eq!(json["status"], "ok");
        assert_eq!(json["driver"], "pooled");
    }

    #[tokio::test]
    async fn health_reports_http_driver_when_configured() {
        let dispatcher = BatchDispatcher::new(
            Arc::new(RecordingRepository::<AuditLog>::new()),
            Arc::new(RecordingRepository::<ActivityLog>::new()),
            Arc::new(RecordingRepository::<ApiMetric>::new()),
        );
        let app = router(AppState::new(dispatcher, DriverKind::Http));

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let json = response_json(response).await;
        assert_eq!(json, json!({ "status": "ok", "driver": "http" }));
    }
}
