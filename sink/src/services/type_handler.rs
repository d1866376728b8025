use std::sync::Arc;
use thiserror::Error;

use crate::db::DbError;
use crate::models::{FromPayload, MappingError};
use crate::repositories::BulkInsertRepository;

#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("mapping failed: {0}")]
    Mapping(#[from] MappingError),
    #[error("persistence failed: {0}")]
    Persistence(#[from] DbError),
}

/// Pairs the Row Mapper of `R` with its gateway: maps every payload, then writes all
/// rows in a single call. Groups are never chunked; the queue's batch size is the only
/// bound on statement size.
pub struct TypeHandler<R: FromPayload> {
    repository: Arc<dyn BulkInsertRepository<R>>,
}

impl<R: FromPayload> Clone for TypeHandler<R> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
        }
    }
}

impl<R: FromPayload> TypeHandler<R> {
    pub fn new(repository: Arc<dyn BulkInsertRepository<R>>) -> Self {
        Self { repository }
    }

    /// Returns the number of rows written. An empty group performs no insert.
    pub async fn handle(&self, payloads: Vec<R::Payload>) -> Result<u64, HandlerError> {
        if payloads.is_empty() {
            return Ok(0);
        }

        let rows = payloads
            .into_iter()
            .map(R::from_payload)
            .collect::<Result<Vec<R>, _>>()?;
        let row_count = rows.len();

        let written = self.repository.bulk_insert(rows).await?;
        tracing::debug!(kind = %R::KIND, rows = row_count, written, "type handler persisted rows");
        Ok(written)
    }
}
