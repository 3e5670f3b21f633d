//! In-memory backend for tests
//!
//! Records every statement instead of talking to a server. Enough behaviour
//! is modelled for the seeder and the clients endpoint: a client row
//! counter that honours transactions, canned rows for reads, and failure
//! injection by SQL substring.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::{Connection, Connector, Row, SqlValue};
use crate::config::DbKind;
use crate::error::DbError;

/// Everything a test may want to assert on.
#[derive(Debug, Default)]
pub struct MemoryState {
    /// Every statement, in execution order (batches appear once per call)
    pub statements: Vec<String>,
    /// `(sql, row count)` for each `execute_batch` call
    pub batches: Vec<(String, usize)>,
    /// Committed rows in `clients`
    pub client_count: i64,
    /// Returned by any read that is not a `COUNT(*)`
    pub rows: Vec<Row>,
    pub connects: usize,
    pub closes: usize,
    pub dropped: usize,
    pub begins: usize,
    pub commits: usize,
    pub rollbacks: usize,
    fail_on: Option<String>,
    refuse_connections: bool,
}

pub type SharedState = Arc<Mutex<MemoryState>>;

pub struct MemoryConnector {
    kind: DbKind,
    state: SharedState,
}

impl MemoryConnector {
    pub fn new(kind: DbKind) -> Self {
        Self {
            kind,
            state: Arc::default(),
        }
    }

    pub fn state(&self) -> SharedState {
        Arc::clone(&self.state)
    }

    /// Any statement containing `needle` fails with a query error.
    pub fn fail_on(self, needle: &str) -> Self {
        self.with_state(|s| s.fail_on = Some(needle.to_string()))
    }

    pub fn refuse_connections(self) -> Self {
        self.with_state(|s| s.refuse_connections = true)
    }

    pub fn with_client_count(self, count: i64) -> Self {
        self.with_state(|s| s.client_count = count)
    }

    pub fn with_rows(self, rows: Vec<Row>) -> Self {
        self.with_state(|s| s.rows = rows)
    }

    fn with_state(self, f: impl FnOnce(&mut MemoryState)) -> Self {
        if let Ok(mut state) = self.state.lock() {
            f(&mut state);
        }
        self
    }
}

#[async_trait]
impl Connector for MemoryConnector {
    fn kind(&self) -> DbKind {
        self.kind
    }

    async fn connect(&self) -> Result<Box<dyn Connection>, DbError> {
        let mut state = lock(&self.state)?;
        if state.refuse_connections {
            return Err(DbError::Connect {
                kind: self.kind,
                source: sqlx::Error::Protocol("connection refused".into()),
            });
        }
        state.connects += 1;
        Ok(Box::new(MemoryConnection {
            kind: self.kind,
            state: Arc::clone(&self.state),
            pending_clients: None,
            closed: false,
        }))
    }
}

pub struct MemoryConnection {
    kind: DbKind,
    state: SharedState,
    // Some while a transaction is open
    pending_clients: Option<i64>,
    closed: bool,
}

fn lock(state: &SharedState) -> Result<std::sync::MutexGuard<'_, MemoryState>, DbError> {
    state
        .lock()
        .map_err(|_| DbError::Query(sqlx::Error::Protocol("memory state poisoned".into())))
}

impl MemoryConnection {
    fn record(&self, sql: &str) -> Result<(), DbError> {
        let mut state = lock(&self.state)?;
        state.statements.push(sql.to_string());
        match &state.fail_on {
            Some(needle) if sql.contains(needle.as_str()) => Err(DbError::Query(
                sqlx::Error::Protocol(format!("injected failure: {sql}")),
            )),
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl Connection for MemoryConnection {
    fn kind(&self) -> DbKind {
        self.kind
    }

    async fn execute(&mut self, sql: &str) -> Result<u64, DbError> {
        self.record(sql)?;
        if sql.starts_with("DROP TABLE IF EXISTS clients") {
            lock(&self.state)?.client_count = 0;
        }
        Ok(0)
    }

    async fn execute_batch(&mut self, sql: &str, rows: &[Vec<SqlValue>]) -> Result<u64, DbError> {
        self.record(sql)?;
        lock(&self.state)?
            .batches
            .push((sql.to_string(), rows.len()));

        if sql.starts_with("INSERT INTO clients") {
            let added = rows.len() as i64;
            match self.pending_clients.as_mut() {
                Some(pending) => *pending += added,
                None => lock(&self.state)?.client_count += added,
            }
        }
        Ok(rows.len() as u64)
    }

    async fn fetch_all(&mut self, sql: &str) -> Result<Vec<Row>, DbError> {
        self.record(sql)?;
        let state = lock(&self.state)?;
        if sql.contains("COUNT(*)") {
            let count = state.client_count + self.pending_clients.unwrap_or(0);
            return Ok(vec![Row::new().with("client_count", count)]);
        }
        Ok(state.rows.clone())
    }

    async fn begin(&mut self) -> Result<(), DbError> {
        self.record("BEGIN")?;
        lock(&self.state)?.begins += 1;
        self.pending_clients = Some(0);
        Ok(())
    }

    async fn commit(&mut self) -> Result<(), DbError> {
        self.record("COMMIT")?;
        let mut state = lock(&self.state)?;
        state.commits += 1;
        state.client_count += self.pending_clients.take().unwrap_or(0);
        Ok(())
    }

    async fn rollback(&mut self) -> Result<(), DbError> {
        self.record("ROLLBACK")?;
        lock(&self.state)?.rollbacks += 1;
        self.pending_clients = None;
        Ok(())
    }

    async fn close(self: Box<Self>) -> Result<(), DbError> {
        let mut this = self;
        this.closed = true;
        lock(&this.state)?.closes += 1;
        Ok(())
    }
}

impl Drop for MemoryConnection {
    fn drop(&mut self) {
        if !self.closed {
            if let Ok(mut state) = self.state.lock() {
                state.dropped += 1;
            }
        }
    }
}
