use thiserror::Error;

/// Errors returned by [`compare`](super::compare).
#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid database descriptor: {message}")]
    InvalidConnection { message: String },

    #[error("Could not connect to database `{database}`: {message}")]
    Connection { database: String, message: String },

    #[error("Could not snapshot database `{database}`: {message}")]
    Introspection { database: String, message: String },

    #[error("Invalid table pattern: {pattern}")]
    InvalidFilter { pattern: String },

    #[error("Could not start async runtime: {message}")]
    Runtime { message: String },
}

impl Error {
    pub fn invalid_connection(message: impl Into<String>) -> Self {
        Self::InvalidConnection {
            message: message.into(),
        }
    }

    pub fn connection(database: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Connection {
            database: database.into(),
            message: message.into(),
        }
    }

    pub fn introspection(database: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Introspection {
            database: database.into(),
            message: message.into(),
        }
    }

    pub fn invalid_filter(pattern: impl Into<String>) -> Self {
        Self::InvalidFilter {
            pattern: pattern.into(),
        }
    }

    pub fn runtime(message: impl Into<String>) -> Self {
        Self::Runtime {
            message: message.into(),
        }
    }

    /// True for errors raised while validating options, before any
    /// connection was attempted.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Error::InvalidConnection { .. } | Error::InvalidFilter { .. }
        )
    }
}
