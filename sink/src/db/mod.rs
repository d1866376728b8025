pub mod connection;
pub mod http;
pub mod statement;

use thiserror::Error;

pub use connection::{Database, DriverKind};
pub use statement::{BulkInsert, InsertRow, SqlValue};

/// Errors raised by the data store. Callers receive them unchanged; nothing in this
/// crate retries a failed statement.
#[derive(Debug, Error)]
pub enum DbError {
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
    #[error("sql over http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("statement rejected with status {status}: {message}")]
    Rejected { status: u16, message: String },
    #[error("{0}")]
    Statement(String),
}
