//! Database layer - one connection per unit of work
//!
//! # Design Principles
//!
//! - One [`Connection`] trait, two sqlx-backed variants (PostgreSQL, MySQL)
//! - Connections start in autocommit mode; [`Connection::begin`] opens an
//!   explicit transaction when a caller needs all-or-nothing writes
//! - No pooling: every acquisition is an independent connection that is
//!   closed exactly once, on every exit path
//! - Rows come back as name-addressable [`Row`]s regardless of backend

#[cfg(any(test, feature = "testing"))]
pub mod memory;
pub mod mysql;
pub mod postgres;
pub mod provider;
pub mod value;

use async_trait::async_trait;

use crate::config::DbKind;
use crate::error::DbError;

pub use mysql::MySqlConnector;
pub use postgres::PostgresConnector;
pub use provider::{ConnectionProvider, ScopedConnection};
pub use value::{Row, SqlValue};

/// A live connection to one of the supported backends.
#[async_trait]
pub trait Connection: Send {
    fn kind(&self) -> DbKind;

    /// Run one or more parameterless statements, returning rows affected.
    async fn execute(&mut self, sql: &str) -> Result<u64, DbError>;

    /// Run `sql` once per parameter row, in order. Stops at the first failure.
    async fn execute_batch(&mut self, sql: &str, rows: &[Vec<SqlValue>]) -> Result<u64, DbError>;

    async fn fetch_all(&mut self, sql: &str) -> Result<Vec<Row>, DbError>;

    /// Leave autocommit mode until the next commit/rollback.
    async fn begin(&mut self) -> Result<(), DbError>;

    async fn commit(&mut self) -> Result<(), DbError>;

    async fn rollback(&mut self) -> Result<(), DbError>;

    /// Graceful shutdown of the underlying session.
    async fn close(self: Box<Self>) -> Result<(), DbError>;
}

/// Opens connections for a fixed configuration.
#[async_trait]
pub trait Connector: Send + Sync {
    fn kind(&self) -> DbKind;

    async fn connect(&self) -> Result<Box<dyn Connection>, DbError>;
}

/// Build `INSERT INTO table(c1, c2, ...) VALUES (<placeholders>)` for `kind`.
pub fn insert_statement(kind: DbKind, table: &str, columns: &[&str]) -> String {
    let placeholders: Vec<String> = (1..=columns.len()).map(|i| kind.placeholder(i)).collect();
    format!(
        "INSERT INTO {table}({}) VALUES ({})",
        columns.join(", "),
        placeholders.join(", ")
    )
}
