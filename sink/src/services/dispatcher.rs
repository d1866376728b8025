//! Batch Dispatcher: the decision point between the queue transport and the three
//! type handlers.
//!
//! A batch is split by message type, the three handlers run concurrently and are all
//! awaited to completion, and only then is the outcome decided: acknowledge every
//! message, or fail the whole batch so the transport redelivers it.
//!
//! Delivery is at-least-once and not idempotent. When one handler fails, the rows already
//! written by the others stay written; the redelivered batch writes them again under new
//! ids.

use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::db::Database;
use crate::models::{
    activity_log::{ActivityLog, ActivityLogPayload},
    api_metric::{ApiMetric, ApiMetricPayload},
    audit_log::{AuditLog, AuditLogPayload},
    Classified, FromPayload, MappingError, MessageKind, QueueMessage, RawMessage,
};
use crate::repositories::{
    ActivityLogRepository, ApiMetricRepository, AuditLogRepository, BulkInsertRepository,
};
use crate::services::type_handler::{HandlerError, TypeHandler};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WrittenCounts {
    pub audit_logs: u64,
    pub activity_logs: u64,
    pub api_metrics: u64,
}

/// Every message of the batch is consumed and must not be redelivered.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Acknowledgement {
    pub acknowledged: Vec<String>,
    pub written: WrittenCounts,
    pub dropped: usize,
}

#[derive(Debug)]
pub struct HandlerFailure {
    pub kind: MessageKind,
    pub error: HandlerError,
}

/// One or more handlers failed; nothing in the batch is acknowledged.
#[derive(Debug, Error)]
#[error("batch must be retried, failed handlers: {}", describe(.failures))]
pub struct BatchError {
    pub failures: Vec<HandlerFailure>,
}

impl BatchError {
    pub fn failed_kinds(&self) -> Vec<MessageKind> {
        self.failures.iter().map(|failure| failure.kind).collect()
    }
}

fn describe(failures: &[HandlerFailure]) -> String {
    failures
        .iter()
        .map(|failure| format!("{} ({})", failure.kind, failure.error))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Payloads of one type, plus any message of that type whose payload did not decode.
struct Group<P> {
    payloads: Vec<P>,
    malformed: Vec<MappingError>,
}

impl<P> Default for Group<P> {
    fn default() -> Self {
        Self {
            payloads: Vec::new(),
            malformed: Vec::new(),
        }
    }
}

#[derive(Default)]
struct Partition {
    audit_logs: Group<AuditLogPayload>,
    activity_logs: Group<ActivityLogPayload>,
    api_metrics: Group<ApiMetricPayload>,
    dropped: usize,
}

fn partition(batch: &[RawMessage]) -> Partition {
    let mut partition = Partition::default();

    for message in batch {
        match QueueMessage::classify(&message.body) {
            Classified::Known(QueueMessage::AuditLog(payload)) => {
                partition.audit_logs.payloads.push(payload)
            }
            Classified::Known(QueueMessage::ActivityLog(payload)) => {
                partition.activity_logs.payloads.push(payload)
            }
            Classified::Known(QueueMessage::ApiMetric(payload)) => {
                partition.api_metrics.payloads.push(payload)
            }
            Classified::Malformed { kind, error } => {
                warn!(
                    message_id = %message.id,
                    kind = %kind,
                    error = %error,
                    "Message payload does not match its type"
                );
                match kind {
                    MessageKind::AuditLog => partition.audit_logs.malformed.push(error),
                    MessageKind::ActivityLog => partition.activity_logs.malformed.push(error),
                    MessageKind::ApiMetric => partition.api_metrics.malformed.push(error),
                }
            }
            Classified::Unknown(tag) => {
                warn!(
                    message_id = %message.id,
                    message_type = tag.as_deref().unwrap_or("<missing>"),
                    "Unknown message type, dropping message"
                );
                partition.dropped += 1;
            }
        }
    }

    partition
}

async fn run_group<R: FromPayload>(
    handler: &TypeHandler<R>,
    group: Group<R::Payload>,
) -> Result<u64, HandlerError> {
    // Rows are mapped before anything is written, so a bad payload fails the whole group.
    if let Some(err) = group.malformed.into_iter().next() {
        return Err(HandlerError::Mapping(err));
    }
    handler.handle(group.payloads).await
}

#[derive(Clone)]
pub struct BatchDispatcher {
    audit_logs: TypeHandler<AuditLog>,
    activity_logs: TypeHandler<ActivityLog>,
    api_metrics: TypeHandler<ApiMetric>,
}

impl BatchDispatcher {
    pub fn new(
        audit_logs: Arc<dyn BulkInsertRepository<AuditLog>>,
        activity_logs: Arc<dyn BulkInsertRepository<ActivityLog>>,
        api_metrics: Arc<dyn BulkInsertRepository<ApiMetric>>,
    ) -> Self {
        Self {
            audit_logs: TypeHandler::new(audit_logs),
            activity_logs: TypeHandler::new(activity_logs),
            api_metrics: TypeHandler::new(api_metrics),
        }
    }

    /// Wires the three table gateways onto one shared database handle.
    pub fn from_database(db: Database) -> Self {
        Self::new(
            Arc::new(AuditLogRepository::new(db.clone())),
            Arc::new(ActivityLogRepository::new(db.clone())),
            Arc::new(ApiMetricRepository::new(db)),
        )
    }

    /// Processes one delivered batch.
    ///
    /// `Ok` means every message in `batch` is acknowledged, including dropped ones of
    /// unknown type. `Err` means no message is acknowledged and the transport should
    /// redeliver the entire batch.
    pub async fn process(&self, batch: &[RawMessage]) -> Result<Acknowledgement, BatchError> {
        let Partition {
            audit_logs,
            activity_logs,
            api_metrics,
            dropped,
        } = partition(batch);

        let (audit_result, activity_result, metric_result) = tokio::join!(
            run_group(&self.audit_logs, audit_logs),
            run_group(&self.activity_logs, activity_logs),
            run_group(&self.api_metrics, api_metrics),
        );

        let mut written = WrittenCounts::default();
        let mut failures = Vec::new();
        for (kind, result) in [
            (MessageKind::AuditLog, audit_result),
            (MessageKind::ActivityLog, activity_result),
            (MessageKind::ApiMetric, metric_result),
        ] {
            match result {
                Ok(count) => match kind {
                    MessageKind::AuditLog => written.audit_logs = count,
                    MessageKind::ActivityLog => written.activity_logs = count,
                    MessageKind::ApiMetric => written.api_metrics = count,
                },
                Err(err) => {
                    error!(kind = %kind, error = %err, "Type handler failed");
                    failures.push(HandlerFailure { kind, error: err });
                }
            }
        }

        if !failures.is_empty() {
            error!(
                messages = batch.len(),
                failed = failures.len(),
                audit_logs = written.audit_logs,
                activity_logs = written.activity_logs,
                api_metrics = written.api_metrics,
                "Batch failed, requesting redelivery of all messages"
            );
            return Err(BatchError { failures });
        }

        info!(
            messages = batch.len(),
            audit_logs = written.audit_logs,
            activity_logs = written.activity_logs,
            api_metrics = written.api_metrics,
            dropped,
            "Batch processed"
        );

        Ok(Acknowledgement {
            acknowledged: batch.iter().map(|message| message.id.clone()).collect(),
            written,
            dropped,
        })
    }
}
