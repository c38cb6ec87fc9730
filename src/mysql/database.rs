use crate::model::{Row, Value};
use crate::mysql::connection::MySqlConnection;
use crate::sqlfmt::{format_sql, IntoParams};
use crate::util::{collapse_whitespace, Result, SchemaError};
use sqlx::mysql::MySqlRow;
use sqlx::{Column, Executor, Row as _, ValueRef};
use std::cell::RefCell;
use tracing::debug;

/// Query capability the snapshot builder needs from a database.
///
/// Templates are formatted with [`format_sql`] before they reach the
/// server, so implementations only ever see finished SQL text.
#[allow(async_fn_in_trait)]
pub trait Database {
    async fn execute_raw(&self, sql: &str) -> Result<Vec<Row>>;

    async fn query(&self, sql: &str, params: impl IntoParams) -> Result<Vec<Row>> {
        let formatted = format_sql(sql, params);
        self.execute_raw(&formatted).await
    }
}

impl Database for MySqlConnection {
    async fn execute_raw(&self, sql: &str) -> Result<Vec<Row>> {
        debug!(sql = %collapse_whitespace(sql), "query");
        // A plain &str goes over the text protocol, so SHOW statements work
        // and every value arrives in its textual form.
        let rows = self
            .pool()
            .fetch_all(sql)
            .await
            .map_err(|e| self.query_error(sql, e))?;
        rows.iter().map(decode_row).collect()
    }
}

fn decode_row(row: &MySqlRow) -> Result<Row> {
    let mut decoded = Row::with_capacity(row.columns().len());
    for column in row.columns() {
        let value = decode_value(row, column.ordinal()).map_err(|e| {
            SchemaError::DatabaseError(format!("Failed to decode column {}: {e}", column.name()))
        })?;
        decoded.insert(column.name().to_string(), value);
    }
    Ok(decoded)
}

fn decode_value(row: &MySqlRow, index: usize) -> std::result::Result<Value, sqlx::Error> {
    if row.try_get_raw(index)?.is_null() {
        return Ok(Value::Null);
    }
    if let Ok(n) = row.try_get::<i64, _>(index) {
        return Ok(Value::Int(n));
    }
    if let Ok(n) = row.try_get::<u64, _>(index) {
        return Ok(i64::try_from(n).map_or_else(|_| Value::Text(n.to_string()), Value::Int));
    }
    if let Ok(s) = row.try_get::<String, _>(index) {
        return Ok(Value::Text(s));
    }
    let bytes = row.try_get::<Vec<u8>, _>(index)?;
    Ok(Value::Text(String::from_utf8_lossy(&bytes).into_owned()))
}

/// In-memory [`Database`] answering from canned rows.
///
/// Each response is keyed by a fragment of SQL; the first key contained in
/// an incoming statement wins. Every statement received is recorded.
#[derive(Debug, Default)]
pub struct StaticDatabase {
    responses: Vec<(String, Vec<Row>)>,
    received: RefCell<Vec<String>>,
}

impl StaticDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(mut self, fragment: impl Into<String>, rows: Vec<Row>) -> Self {
        self.responses.push((fragment.into(), rows));
        self
    }

    /// Statements received so far, in order.
    pub fn received(&self) -> Vec<String> {
        self.received.borrow().clone()
    }
}

impl Database for StaticDatabase {
    async fn execute_raw(&self, sql: &str) -> Result<Vec<Row>> {
        self.received.borrow_mut().push(sql.to_string());
        self.responses
            .iter()
            .find(|(fragment, _)| sql.contains(fragment.as_str()))
            .map(|(_, rows)| rows.clone())
            .ok_or_else(|| {
                SchemaError::DatabaseError(format!(
                    "No canned response for `{}`",
                    collapse_whitespace(sql)
                ))
            })
    }
}
