use serde::{Deserialize, Serialize};
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions, PgSslMode};
use std::{fmt, str::FromStr, time::Duration};

use crate::{
    config::DatabaseConfig,
    db::{
        http::HttpSqlClient,
        statement::{query_builder, BulkInsert, InsertRow},
        DbError,
    },
};

/// Which client the process talks to Postgres through. Chosen once from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DriverKind {
    /// Stateless SQL-over-HTTPS (serverless endpoints).
    Http,
    /// Pooled TCP connections through sqlx.
    Pooled,
}

impl FromStr for DriverKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "http" => Ok(DriverKind::Http),
            "pooled" | "tcp" => Ok(DriverKind::Pooled),
            other => Err(format!("unknown database driver: {other}")),
        }
    }
}

impl fmt::Display for DriverKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DriverKind::Http => f.write_str("http"),
            DriverKind::Pooled => f.write_str("pooled"),
        }
    }
}

/// Process-wide database handle, built at startup and handed to every repository.
///
/// Cloning is cheap for both variants: `PgPool` and `reqwest::Client` are reference
/// counted, so all clones share one pool (or one HTTP connector).
#[derive(Debug, Clone)]
pub enum Database {
    Pooled(PgPool),
    Http(HttpSqlClient),
}

impl Database {
    /// Builds the client for the configured driver. The pooled variant connects lazily,
    /// so this never touches the network.
    pub fn connect(config: &DatabaseConfig) -> Result<Self, DbError> {
        match config.driver {
            DriverKind::Pooled => Ok(Database::Pooled(create_pool(config))),
            DriverKind::Http => Ok(Database::Http(HttpSqlClient::new(config)?)),
        }
    }

    pub fn driver(&self) -> DriverKind {
        match self {
            Database::Pooled(_) => DriverKind::Pooled,
            Database::Http(_) => DriverKind::Http,
        }
    }

    /// Writes all rows with a single multi-row INSERT. An empty slice is a no-op.
    pub async fn insert_rows<R: InsertRow>(&self, rows: &[R]) -> Result<u64, DbError> {
        if rows.is_empty() {
            return Ok(0);
        }

        match self {
            Database::Pooled(pool) => {
                let mut builder = query_builder(rows);
                let result = builder.build().execute(pool).await?;
                Ok(result.rows_affected())
            }
            Database::Http(client) => {
                let Some(statement) = BulkInsert::render(rows) else {
                    return Ok(0);
                };
                client.execute(&statement.sql, &statement.params).await
            }
        }
    }
}

pub fn connect_options(config: &DatabaseConfig) -> PgConnectOptions {
    PgConnectOptions::new()
        .host(&config.host)
        .port(config.port)
        .username(&config.username)
        .password(&config.password)
        .database(&config.database)
        .ssl_mode(PgSslMode::Prefer)
}

pub fn create_pool(config: &DatabaseConfig) -> PgPool {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
        .connect_lazy_with(connect_options(config))
}
