//! Bulk Persistence Gateways, one per destination table.
//!
//! Each gateway performs exactly one multi-row INSERT per call and reports the data
//! store's error unchanged. There is no row-by-row fallback and no partial success.

pub mod activity_log;
pub mod api_metric;
pub mod audit_log;
#[cfg(any(test, feature = "test-utils"))]
pub mod memory;

use async_trait::async_trait;
use std::marker::PhantomData;

use crate::db::{Database, DbError, InsertRow};

pub use activity_log::ActivityLogRepository;
pub use api_metric::ApiMetricRepository;
pub use audit_log::AuditLogRepository;

/// Repository trait for writing a batch of rows of one type.
///
/// This trait is designed to be mockable using mockall for testing.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BulkInsertRepository<R: Send + Sync + 'static>: Send + Sync {
    /// Inserts all rows in one statement and returns the affected row count.
    async fn bulk_insert(&self, rows: Vec<R>) -> Result<u64, DbError>;
}

/// Concrete gateway writing `R` rows into `R::TABLE`.
pub struct TableRepository<R> {
    db: Database,
    _row: PhantomData<fn() -> R>,
}

impl<R> TableRepository<R> {
    pub fn new(db: Database) -> Self {
        Self {
            db,
            _row: PhantomData,
        }
    }
}

impl<R> Clone for TableRepository<R> {
    fn clone(&self) -> Self {
        Self::new(self.db.clone())
    }
}

#[async_trait]
impl<R> BulkInsertRepository<R> for TableRepository<R>
where
    R: InsertRow + Send + Sync + 'static,
{
    async fn bulk_insert(&self, rows: Vec<R>) -> Result<u64, DbError> {
        if rows.is_empty() {
            return Ok(0);
        }

        let affected = self.db.insert_rows(&rows).await?;
        tracing::debug!(
            table = R::TABLE,
            rows = rows.len(),
            affected,
            driver = %self.db.driver(),
            "bulk insert complete"
        );
        Ok(affected)
    }
}
