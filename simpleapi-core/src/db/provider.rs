//! Scoped connection acquisition
//!
//! Replaces a connection pool: each request or seed run gets its own
//! connection, and gives it back exactly once.

use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use futures::future::BoxFuture;
use tracing::{debug, warn};

use super::{Connection, Connector, MySqlConnector, PostgresConnector};
use crate::config::{DbConfig, DbKind};
use crate::error::DbError;

/// Hands out one connection per acquisition.
#[derive(Clone)]
pub struct ConnectionProvider {
    connector: Arc<dyn Connector>,
}

impl ConnectionProvider {
    pub fn new(connector: impl Connector + 'static) -> Self {
        Self {
            connector: Arc::new(connector),
        }
    }

    /// Pick the backend named by `config.kind`.
    ///
    /// Does not touch the network; the first connection is opened by
    /// [`acquire`](Self::acquire).
    pub fn from_config(config: &DbConfig) -> Self {
        match config.kind {
            DbKind::Postgres => Self::new(PostgresConnector::new(config.clone())),
            DbKind::Mysql => Self::new(MySqlConnector::new(config.clone())),
        }
    }

    pub fn kind(&self) -> DbKind {
        self.connector.kind()
    }

    /// Open a connection. No retry on failure.
    pub async fn acquire(&self) -> Result<ScopedConnection, DbError> {
        let conn = self.connector.connect().await?;
        debug!(backend = %self.kind(), "Connection acquired");
        Ok(ScopedConnection { inner: Some(conn) })
    }

    /// Run `f` with a fresh connection and close it afterwards, whether `f`
    /// succeeded or not.
    ///
    /// ```ignore
    /// let clients = provider
    ///     .with_connection(|conn| Box::pin(list_clients(conn, CLIENT_PAGE_SIZE)))
    ///     .await?;
    /// ```
    pub async fn with_connection<T, F>(&self, f: F) -> Result<T, DbError>
    where
        F: for<'c> FnOnce(&'c mut dyn Connection) -> BoxFuture<'c, Result<T, DbError>> + Send,
        T: Send,
    {
        let mut conn = self.acquire().await?;
        let result = f(&mut *conn).await;
        let released = conn.release().await;

        match (result, released) {
            (Err(err), Err(close_err)) => {
                warn!("Failed to close connection after error: {}", close_err);
                Err(err)
            }
            (Err(err), Ok(())) => Err(err),
            (Ok(value), Err(close_err)) => {
                // Work already finished; don't throw its result away
                warn!("Failed to close connection: {}", close_err);
                Ok(value)
            }
            (Ok(value), Ok(())) => Ok(value),
        }
    }
}

/// RAII guard around an acquired connection.
///
/// [`release`](Self::release) closes gracefully. Dropping an unreleased
/// guard drops the session, which closes the socket.
pub struct ScopedConnection {
    // Some until released or dropped
    inner: Option<Box<dyn Connection>>,
}

impl ScopedConnection {
    pub async fn release(mut self) -> Result<(), DbError> {
        match self.inner.take() {
            Some(conn) => {
                let result = conn.close().await;
                debug!("Connection released");
                result
            }
            None => Ok(()),
        }
    }
}

impl Deref for ScopedConnection {
    type Target = dyn Connection;

    fn deref(&self) -> &Self::Target {
        match &self.inner {
            Some(conn) => conn.as_ref(),
            None => unreachable!("connection used after release"),
        }
    }
}

impl DerefMut for ScopedConnection {
    fn deref_mut(&mut self) -> &mut Self::Target {
        match &mut self.inner {
            Some(conn) => conn.as_mut(),
            None => unreachable!("connection used after release"),
        }
    }
}

impl Drop for ScopedConnection {
    fn drop(&mut self) {
        if self.inner.take().is_some() {
            debug!("Connection dropped without release; session closed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory::MemoryConnector;

    #[tokio::test]
    async fn with_connection_closes_on_success() {
        let connector = MemoryConnector::new(DbKind::Postgres);
        let state = connector.state();
        let provider = ConnectionProvider::new(connector);

        let affected = provider
            .with_connection(|conn| Box::pin(async move { conn.execute("SELECT 1").await }))
            .await
            .unwrap();

        assert_eq!(affected, 0);
        let state = state.lock().unwrap();
        assert_eq!(state.connects, 1);
        assert_eq!(state.closes, 1);
    }

    #[tokio::test]
    async fn with_connection_closes_on_failure() {
        let connector = MemoryConnector::new(DbKind::Mysql).fail_on("boom");
        let state = connector.state();
        let provider = ConnectionProvider::new(connector);

        let result = provider
            .with_connection(|conn| Box::pin(async move { conn.execute("SELECT boom").await }))
            .await;

        assert!(matches!(result, Err(DbError::Query(_))));
        let state = state.lock().unwrap();
        assert_eq!(state.connects, 1);
        assert_eq!(state.closes, 1);
    }

    #[tokio::test]
    async fn connect_failure_surfaces_without_close() {
        let connector = MemoryConnector::new(DbKind::Postgres).refuse_connections();
        let state = connector.state();
        let provider = ConnectionProvider::new(connector);

        let result = provider
            .with_connection(|conn| Box::pin(async move { conn.execute("SELECT 1").await }))
            .await;

        assert!(matches!(result, Err(DbError::Connect { .. })));
        let state = state.lock().unwrap();
        assert_eq!(state.connects, 0);
        assert_eq!(state.closes, 0);
    }

    #[tokio::test]
    async fn release_closes_exactly_once() {
        let connector = MemoryConnector::new(DbKind::Postgres);
        let state = connector.state();
        let provider = ConnectionProvider::new(connector);

        let conn = provider.acquire().await.unwrap();
        assert_eq!(conn.kind(), DbKind::Postgres);
        conn.release().await.unwrap();

        assert_eq!(state.lock().unwrap().closes, 1);
    }

    #[tokio::test]
    async fn dropped_guard_does_not_close_gracefully() {
        let connector = MemoryConnector::new(DbKind::Postgres);
        let state = connector.state();
        let provider = ConnectionProvider::new(connector);

        {
            let mut conn = provider.acquire().await.unwrap();
            conn.execute("SELECT 1").await.unwrap();
        }

        let state = state.lock().unwrap();
        assert_eq!(state.connects, 1);
        assert_eq!(state.closes, 0);
        assert_eq!(state.dropped, 1);
    }

    #[test]
    fn from_config_picks_backend() {
        let mut config = DbConfig {
            kind: DbKind::Mysql,
            host: "localhost".into(),
            port: 3306,
            database: "shop".into(),
            user: "app".into(),
            password: String::new(),
        };
        assert_eq!(ConnectionProvider::from_config(&config).kind(), DbKind::Mysql);

        config.kind = DbKind::Postgres;
        assert_eq!(
            ConnectionProvider::from_config(&config).kind(),
            DbKind::Postgres
        );
    }
}
