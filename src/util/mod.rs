use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Collapses every whitespace run to a single space and trims the ends.
/// Used to keep multi-line SQL readable on a single log line.
pub fn collapse_whitespace(sql: &str) -> String {
    WHITESPACE.replace_all(sql.trim(), " ").to_string()
}

#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error(
        "Unexpected SHOW CREATE result for `{table}`: expected a `Create Table` or `Create View` column, got [{columns}]"
    )]
    UnexpectedShape { table: String, columns: String },

    #[error("Metadata row is missing column {column}")]
    MissingColumn { column: String },
}

pub type Result<T> = std::result::Result<T, SchemaError>;
