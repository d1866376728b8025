//! Multi-row INSERT statements shared by both drivers.

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;
use sqlx::{query_builder::Separated, types::Json, Postgres, QueryBuilder};

/// A single bound parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Text(Option<String>),
    Int(Option<i32>),
    Json(Option<Value>),
    Timestamp(DateTime<Utc>),
}

impl SqlValue {
    /// Parameter encoding for the HTTP driver: strings or null, cast server-side by the
    /// column type.
    pub fn to_param(&self) -> Value {
        match self {
            SqlValue::Text(value) => value.clone().map(Value::String).unwrap_or(Value::Null),
            SqlValue::Int(value) => value
                .map(|v| Value::String(v.to_string()))
                .unwrap_or(Value::Null),
            SqlValue::Json(value) => value
                .as_ref()
                .map(|v| Value::String(v.to_string()))
                .unwrap_or(Value::Null),
            SqlValue::Timestamp(value) => {
                Value::String(value.to_rfc3339_opts(SecondsFormat::Millis, true))
            }
        }
    }

    fn bind_to(self, separated: &mut Separated<'_, '_, Postgres, &'static str>) {
        match self {
            SqlValue::Text(value) => {
                separated.push_bind(value);
            }
            SqlValue::Int(value) => {
                separated.push_bind(value);
            }
            SqlValue::Json(value) => {
                separated.push_bind(value.map(Json));
            }
            SqlValue::Timestamp(value) => {
                separated.push_bind(value);
            }
        }
    }
}

/// A row that can be written to a fixed destination table.
///
/// `values` must yield exactly one value per entry of `COLUMNS`, in the same order.
pub trait InsertRow: Send + Sync {
    const TABLE: &'static str;
    const COLUMNS: &'static [&'static str];

    fn values(&self) -> Vec<SqlValue>;
}

/// A rendered `INSERT ... VALUES (...), (...)` with positional parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct BulkInsert {
    pub sql: String,
    pub params: Vec<SqlValue>,
}

impl BulkInsert {
    /// Renders one statement for all rows. Returns `None` for an empty slice since
    /// `VALUES` with no tuples is not valid SQL.
    pub fn render<R: InsertRow>(rows: &[R]) -> Option<Self> {
        if rows.is_empty() {
            return None;
        }

        let width = R::COLUMNS.len();
        let mut sql = insert_prefix::<R>();
        sql.push_str("VALUES ");
        let mut params = Vec::with_capacity(rows.len() * width);

        for (row_index, row) in rows.iter().enumerate() {
            if row_index > 0 {
                sql.push_str(", ");
            }
            sql.push('(');
            let placeholders: Vec<String> = (1..=width)
                .map(|column| format!("${}", row_index * width + column))
                .collect();
            sql.push_str(&placeholders.join(", "));
            sql.push(')');
            params.extend(row.values());
        }

        Some(Self { sql, params })
    }
}

/// Builds the same statement as [`BulkInsert::render`] on sqlx's query builder, binding
/// typed values for the pooled driver.
pub fn query_builder<R: InsertRow>(rows: &[R]) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new(insert_prefix::<R>());
    builder.push_values(rows, |mut separated, row| {
        for value in row.values() {
            value.bind_to(&mut separated);
        }
    });
    builder
}

fn insert_prefix<R: InsertRow>() -> String {
    format!("INSERT INTO {} ({}) ", R::TABLE, R::COLUMNS.join(", "))
}
