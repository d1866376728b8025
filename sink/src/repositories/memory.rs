//! In-memory gateway used by tests to observe bulk-insert calls and inject failures.

use async_trait::async_trait;
use std::sync::{Mutex, MutexGuard};

use crate::db::DbError;
use crate::repositories::BulkInsertRepository;

#[derive(Debug)]
pub struct RecordingRepository<R> {
    calls: Mutex<Vec<Vec<R>>>,
    failure: Mutex<Option<String>>,
}

impl<R> Default for RecordingRepository<R> {
    fn default() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            failure: Mutex::new(None),
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl<R: Clone> RecordingRepository<R> {
    pub fn new() -> Self {
        Self::default()
    }

    /// A repository whose every call fails with `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        let repository = Self::default();
        repository.fail_with(Some(message.into()));
        repository
    }

    pub fn fail_with(&self, message: Option<String>) {
        *lock(&self.failure) = message;
    }

    /// Rows of every successful call, one entry per call.
    pub fn calls(&self) -> Vec<Vec<R>> {
        lock(&self.calls).clone()
    }

    pub fn call_count(&self) -> usize {
        lock(&self.calls).len()
    }

    /// All successfully written rows in write order.
    pub fn rows(&self) -> Vec<R> {
        lock(&self.calls).iter().flatten().cloned().collect()
    }
}

#[async_trait]
impl<R> BulkInsertRepository<R> for RecordingRepository<R>
where
    R: Clone + Send + Sync + 'static,
{
    async fn bulk_insert(&self, rows: Vec<R>) -> Result<u64, DbError> {
        if let Some(message) = lock(&self.failure).clone() {
            return Err(DbError::Statement(message));
        }

        let count = rows.len() as u64;
        lock(&self.calls).push(rows);
        Ok(count)
    }
}
