//! PostgreSQL backend
//!
//! A single `PgConnection` per acquisition. PostgreSQL has no session
//! autocommit switch: outside an explicit `BEGIN` every statement commits
//! on its own, which is the mode connections are handed out in.

use async_trait::async_trait;
use sqlx::postgres::{PgArguments, PgConnectOptions, PgRow};
use sqlx::query::Query;
use sqlx::{
    raw_sql, Column, ConnectOptions, Connection as _, Executor, PgConnection, Postgres, Row as _,
    TypeInfo, ValueRef,
};
use tracing::debug;

use super::{Connection, Connector, Row, SqlValue};
use crate::config::{DbConfig, DbKind, APP_NAME};
use crate::error::DbError;

pub struct PostgresConnector {
    config: DbConfig,
}

impl PostgresConnector {
    pub fn new(config: DbConfig) -> Self {
        Self { config }
    }

    fn options(&self) -> PgConnectOptions {
        let options = PgConnectOptions::new()
            .host(&self.config.host)
            .port(self.config.port)
            .database(&self.config.database)
            .username(&self.config.user)
            .application_name(APP_NAME);

        if self.config.password.is_empty() {
            options
        } else {
            options.password(&self.config.password)
        }
    }
}

#[async_trait]
impl Connector for PostgresConnector {
    fn kind(&self) -> DbKind {
        DbKind::Postgres
    }

    async fn connect(&self) -> Result<Box<dyn Connection>, DbError> {
        debug!(
            host = %self.config.host,
            port = self.config.port,
            database = %self.config.database,
            "Connecting to PostgreSQL"
        );

        let conn = self
            .options()
            .connect()
            .await
            .map_err(|source| DbError::Connect {
                kind: DbKind::Postgres,
                source,
            })?;

        Ok(Box::new(PostgresSession {
            conn,
            in_transaction: false,
        }))
    }
}

pub struct PostgresSession {
    conn: PgConnection,
    in_transaction: bool,
}

#[async_trait]
impl Connection for PostgresSession {
    fn kind(&self) -> DbKind {
        DbKind::Postgres
    }

    async fn execute(&mut self, sql: &str) -> Result<u64, DbError> {
        let result = Executor::execute(&mut self.conn, raw_sql(sql)).await?;
        Ok(result.rows_affected())
    }

    async fn execute_batch(&mut self, sql: &str, rows: &[Vec<SqlValue>]) -> Result<u64, DbError> {
        let mut affected = 0;
        for params in rows {
            let query = params.iter().fold(sqlx::query(sql), bind);
            affected += query.execute(&mut self.conn).await?.rows_affected();
        }
        Ok(affected)
    }

    async fn fetch_all(&mut self, sql: &str) -> Result<Vec<Row>, DbError> {
        let rows = sqlx::query(sql).fetch_all(&mut self.conn).await?;
        rows.iter().map(decode_row).collect()
    }

    async fn begin(&mut self) -> Result<(), DbError> {
        Executor::execute(&mut self.conn, raw_sql("BEGIN")).await?;
        self.in_transaction = true;
        Ok(())
    }

    async fn commit(&mut self) -> Result<(), DbError> {
        Executor::execute(&mut self.conn, raw_sql("COMMIT")).await?;
        self.in_transaction = false;
        Ok(())
    }

    async fn rollback(&mut self) -> Result<(), DbError> {
        Executor::execute(&mut self.conn, raw_sql("ROLLBACK")).await?;
        self.in_transaction = false;
        Ok(())
    }

    async fn close(self: Box<Self>) -> Result<(), DbError> {
        if self.in_transaction {
            // Server discards the open transaction when the session ends
            debug!("Closing PostgreSQL connection with an open transaction");
        }
        self.conn.close().await?;
        Ok(())
    }
}

fn bind<'q>(
    query: Query<'q, Postgres, PgArguments>,
    value: &'q SqlValue,
) -> Query<'q, Postgres, PgArguments> {
    match value {
        SqlValue::Null => query.bind(None::<String>),
        SqlValue::Int(v) => query.bind(*v),
        SqlValue::Text(v) => query.bind(v.as_str()),
        SqlValue::Date(v) => query.bind(*v),
        SqlValue::Decimal(v) => query.bind(*v),
    }
}

/// Decode by PostgreSQL type name so callers can address columns by name.
fn decode_row(row: &PgRow) -> Result<Row, DbError> {
    let mut out = Row::with_capacity(row.len());

    for column in row.columns() {
        let index = column.ordinal();
        let name = column.name();

        if row.try_get_raw(index)?.is_null() {
            out.push(name, SqlValue::Null);
            continue;
        }

        let value = match column.type_info().name() {
            "INT2" => SqlValue::Int(row.try_get::<i16, _>(index)?.into()),
            "INT4" => SqlValue::Int(row.try_get::<i32, _>(index)?.into()),
            "INT8" => SqlValue::Int(row.try_get::<i64, _>(index)?),
            "TEXT" | "VARCHAR" | "BPCHAR" | "NAME" => SqlValue::Text(row.try_get(index)?),
            "DATE" => SqlValue::Date(row.try_get(index)?),
            "NUMERIC" => SqlValue::Decimal(row.try_get(index)?),
            other => {
                return Err(DbError::decode(
                    name,
                    format!("unsupported PostgreSQL type {other}"),
                ))
            }
        };
        out.push(name, value);
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> DbConfig {
        DbConfig {
            kind: DbKind::Postgres,
            host: "db.internal".into(),
            port: 6543,
            database: "shop".into(),
            user: "app".into(),
            password: String::new(),
        }
    }

    #[test]
    fn options_carry_configured_target() {
        let options = PostgresConnector::new(config()).options();
        assert_eq!(options.get_host(), "db.internal");
        assert_eq!(options.get_port(), 6543);
        assert_eq!(options.get_database(), Some("shop"));
        assert_eq!(options.get_username(), "app");
        assert_eq!(options.get_application_name(), Some(APP_NAME));
    }

    #[tokio::test]
    async fn unreachable_host_is_a_connect_error() {
        let mut cfg = config();
        cfg.host = "127.0.0.1".into();
        cfg.port = 1;

        let result = PostgresConnector::new(cfg).connect().await;
        assert!(matches!(
            result,
            Err(DbError::Connect {
                kind: DbKind::Postgres,
                ..
            })
        ));
    }

    // Live tests - run with DB_TYPE=postgres DB_HOST=... cargo test -p simpleapi-core -- --ignored

    #[tokio::test]
    #[ignore = "requires database"]
    async fn rows_decode_by_column_name() {
        let cfg = DbConfig::from_env().expect("DB_* variables required");
        if cfg.kind != DbKind::Postgres {
            return;
        }
        let mut conn = PostgresConnector::new(cfg).connect().await.expect("connect");

        let rows = conn
            .fetch_all(
                "SELECT 7::int4 AS n, 'x'::text AS s, NULL::text AS missing, \
                 DATE '2024-02-29' AS d, 12.50::numeric(12,2) AS p",
            )
            .await
            .expect("query failed");

        let row = &rows[0];
        assert_eq!(row.get_i64("n").unwrap(), 7);
        assert_eq!(row.get_text("s").unwrap(), "x");
        assert_eq!(row.get_opt_text("missing").unwrap(), None);
        assert_eq!(row.get_date("d").unwrap().to_string(), "2024-02-29");
        assert_eq!(row.get_decimal("p").unwrap().to_string(), "12.50");

        conn.close().await.expect("close failed");
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn rolled_back_rows_are_not_visible() {
        let cfg = DbConfig::from_env().expect("DB_* variables required");
        if cfg.kind != DbKind::Postgres {
            return;
        }
        let mut conn = PostgresConnector::new(cfg).connect().await.expect("connect");

        conn.execute("CREATE TEMPORARY TABLE scratch (n INT)").await.expect("create failed");
        conn.begin().await.expect("begin failed");
        let inserted = conn
            .execute("INSERT INTO scratch (n) VALUES (1), (2)")
            .await
            .expect("insert failed");
        assert_eq!(inserted, 2);
        conn.rollback().await.expect("rollback failed");

        let rows = conn
            .fetch_all("SELECT COUNT(*) AS n FROM scratch")
            .await
            .expect("count failed");
        assert_eq!(rows[0].get_i64("n").unwrap(), 0);

        conn.close().await.expect("close failed");
    }
}
