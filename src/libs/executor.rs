// executor.rs
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::{Map, Value};
use sqlx::mysql::{MySqlPool, MySqlRow};
use sqlx::{Column, Row};

use crate::libs::error::Result;

/// One result row, column name to JSON value.
pub type Record = Map<String, Value>;

/// What a write statement reports back.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecOutcome {
    pub rows_affected: u64,
    pub last_insert_id: u64,
}

/// Runs generated SQL text. Models only ever talk to the database through
/// this trait.
#[async_trait]
pub trait Executor: Send + Sync {
    async fn fetch_all(&self, sql: &str) -> Result<Vec<Record>>;

    async fn execute(&self, sql: &str) -> Result<ExecOutcome>;
}

#[async_trait]
impl<T: Executor + ?Sized> Executor for Arc<T> {
    async fn fetch_all(&self, sql: &str) -> Result<Vec<Record>> {
        (**self).fetch_all(sql).await
    }

    async fn execute(&self, sql: &str) -> Result<ExecOutcome> {
        (**self).execute(sql).await
    }
}

#[async_trait]
impl Executor for MySqlPool {
    async fn fetch_all(&self, sql: &str) -> Result<Vec<Record>> {
        tracing::debug!(sql, "fetching rows");
        let rows = sqlx::query(sql).fetch_all(self).await?;
        Ok(rows.iter().map(row_to_record).collect())
    }

    async fn execute(&self, sql: &str) -> Result<ExecOutcome> {
        tracing::debug!(sql, "executing statement");
        let result = sqlx::query(sql).execute(self).await?;
        Ok(ExecOutcome {
            rows_affected: result.rows_affected(),
            last_insert_id: result.last_insert_id(),
        })
    }
}

fn row_to_record(row: &MySqlRow) -> Record {
    let mut map = Map::new();
    for col in row.columns() {
        let col_name = col.name();
        map.insert(col_name.to_string(), decode_column(row, col_name));
    }
    map
}

// Tries the decoders in turn; a column no decoder accepts comes back null.
fn decode_column(row: &MySqlRow, col_name: &str) -> Value {
    if let Ok(v) = row.try_get::<Option<i64>, _>(col_name) {
        return v.map(Value::from).unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<u64>, _>(col_name) {
        return v.map(Value::from).unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<f64>, _>(col_name) {
        return v.map(Value::from).unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<bool>, _>(col_name) {
        return v.map(Value::from).unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<String>, _>(col_name) {
        return v.map(Value::from).unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<DateTime<Utc>>, _>(col_name) {
        return v.map(|d| Value::from(d.to_rfc3339())).unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<NaiveDateTime>, _>(col_name) {
        return v
            .map(|d| Value::from(d.format("%Y-%m-%d %H:%M:%S").to_string()))
            .unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<NaiveDate>, _>(col_name) {
        return v.map(|d| Value::from(d.to_string())).unwrap_or(Value::Null);
    }
    Value::Null
}
