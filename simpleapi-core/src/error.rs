/// Structured error types for simpleapi-core.
///
/// Library code returns these; the binary wraps them in `anyhow` with context.
use thiserror::Error;

use crate::config::DbKind;

/// Configuration could not be resolved from the environment.
///
/// Always fatal: nothing connects to a database after one of these.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Required variable absent or blank after trimming
    #[error("Missing environment variable: {name}")]
    Missing { name: &'static str },

    /// Port is not an integer in 1..=65535
    #[error("Invalid value for {name}: '{value}' is not a valid port")]
    InvalidPort { name: &'static str, value: String },

    /// DB_TYPE names a backend we do not support
    #[error("DB_TYPE must be 'postgres' or 'mysql' (got '{value}')")]
    UnsupportedBackend { value: String },
}

/// Database error type
#[derive(Error, Debug)]
pub enum DbError {
    /// Host unreachable, authentication rejected or unknown database
    #[error("failed to connect to {kind}: {source}")]
    Connect {
        kind: DbKind,
        #[source]
        source: sqlx::Error,
    },

    /// Statement failed to execute (syntax, constraint violation, ...)
    #[error("database error: {0}")]
    Query(#[from] sqlx::Error),

    #[error("column '{column}' missing from result row")]
    MissingColumn { column: String },

    #[error("cannot decode column '{column}': {reason}")]
    Decode { column: String, reason: String },
}

impl DbError {
    pub(crate) fn decode(column: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Decode {
            column: column.into(),
            reason: reason.into(),
        }
    }
}
