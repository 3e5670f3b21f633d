//! MySQL backend
//!
//! Same shape as the PostgreSQL backend. Autocommit is switched on
//! explicitly after connecting so a server-side `autocommit=0` default
//! cannot leave reads inside an implicit transaction.

use async_trait::async_trait;
use sqlx::mysql::{MySqlArguments, MySqlConnectOptions, MySqlRow};
use sqlx::query::Query;
use sqlx::{
    raw_sql, Column, ConnectOptions, Connection as _, Executor, MySql, MySqlConnection, Row as _,
    TypeInfo, ValueRef,
};
use tracing::debug;

use super::{Connection, Connector, Row, SqlValue};
use crate::config::{DbConfig, DbKind};
use crate::error::DbError;

pub struct MySqlConnector {
    config: DbConfig,
}

impl MySqlConnector {
    pub fn new(config: DbConfig) -> Self {
        Self { config }
    }

    fn options(&self) -> MySqlConnectOptions {
        let options = MySqlConnectOptions::new()
            .host(&self.config.host)
            .port(self.config.port)
            .database(&self.config.database)
            .username(&self.config.user)
            .charset("utf8mb4");

        if self.config.password.is_empty() {
            options
        } else {
            options.password(&self.config.password)
        }
    }
}

#[async_trait]
impl Connector for MySqlConnector {
    fn kind(&self) -> DbKind {
        DbKind::Mysql
    }

    async fn connect(&self) -> Result<Box<dyn Connection>, DbError> {
        debug!(
            host = %self.config.host,
            port = self.config.port,
            database = %self.config.database,
            "Connecting to MySQL"
        );

        let connect_err = |source| DbError::Connect {
            kind: DbKind::Mysql,
            source,
        };

        let mut conn = self.options().connect().await.map_err(connect_err)?;
        Executor::execute(&mut conn, raw_sql("SET autocommit = 1"))
            .await
            .map_err(connect_err)?;

        Ok(Box::new(MySqlSession {
            conn,
            in_transaction: false,
        }))
    }
}

pub struct MySqlSession {
    conn: MySqlConnection,
    in_transaction: bool,
}

#[async_trait]
impl Connection for MySqlSession {
    fn kind(&self) -> DbKind {
        DbKind::Mysql
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
        Executor::execute(&mut self.conn, raw_sql("START TRANSACTION")).await?;
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
            debug!("Closing MySQL connection with an open transaction");
        }
        self.conn.close().await?;
        Ok(())
    }
}

fn bind<'q>(
    query: Query<'q, MySql, MySqlArguments>,
    value: &'q SqlValue,
) -> Query<'q, MySql, MySqlArguments> {
    match value {
        SqlValue::Null => query.bind(None::<String>),
        SqlValue::Int(v) => query.bind(*v),
        SqlValue::Text(v) => query.bind(v.as_str()),
        SqlValue::Date(v) => query.bind(*v),
        SqlValue::Decimal(v) => query.bind(*v),
    }
}

/// Decode by MySQL type name. Integer widths all widen to `i64`.
fn decode_row(row: &MySqlRow) -> Result<Row, DbError> {
    let mut out = Row::with_capacity(row.len());

    for column in row.columns() {
        let index = column.ordinal();
        let name = column.name();

        if row.try_get_raw(index)?.is_null() {
            out.push(name, SqlValue::Null);
            continue;
        }

        let value = match column.type_info().name() {
            "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" => {
                SqlValue::Int(row.try_get::<i64, _>(index)?)
            }
            ty if ty.ends_with("UNSIGNED") => {
                let v: u64 = row.try_get(index)?;
                let v = i64::try_from(v)
                    .map_err(|_| DbError::decode(name, format!("{v} overflows i64")))?;
                SqlValue::Int(v)
            }
            "VARCHAR" | "CHAR" | "TEXT" | "TINYTEXT" | "MEDIUMTEXT" | "LONGTEXT" => {
                SqlValue::Text(row.try_get(index)?)
            }
            "DATE" => SqlValue::Date(row.try_get(index)?),
            "DECIMAL" => SqlValue::Decimal(row.try_get(index)?),
            other => {
                return Err(DbError::decode(
                    name,
                    format!("unsupported MySQL type {other}"),
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
            kind: DbKind::Mysql,
            host: "127.0.0.1".into(),
            port: 1,
            database: "shop".into(),
            user: "app".into(),
            password: "secret".into(),
        }
    }

    #[tokio::test]
    async fn unreachable_host_is_a_connect_error() {
        let result = MySqlConnector::new(config()).connect().await;
        assert!(matches!(
            result,
            Err(DbError::Connect {
                kind: DbKind::Mysql,
                ..
            })
        ));
    }

    // Live tests - run with DB_TYPE=mysql DB_HOST=... cargo test -p simpleapi-core -- --ignored

    #[tokio::test]
    #[ignore = "requires database"]
    async fn rows_decode_by_column_name() {
        let cfg = DbConfig::from_env().expect("DB_* variables required");
        if cfg.kind != DbKind::Mysql {
            return;
        }
        let mut conn = MySqlConnector::new(cfg).connect().await.expect("connect");

        let rows = conn
            .fetch_all(
                "SELECT CAST(7 AS SIGNED) AS n, CAST('x' AS CHAR) AS s, \
                 DATE '2024-02-29' AS d, CAST(12.5 AS DECIMAL(12,2)) AS p",
            )
            .await
            .expect("query failed");

        let row = &rows[0];
        assert_eq!(row.get_i64("n").unwrap(), 7);
        assert_eq!(row.get_text("s").unwrap(), "x");
        assert_eq!(row.get_date("d").unwrap().to_string(), "2024-02-29");
        assert_eq!(row.get_decimal("p").unwrap().to_string(), "12.50");

        conn.close().await.expect("close failed");
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn rolled_back_rows_are_not_visible() {
        let cfg = DbConfig::from_env().expect("DB_* variables required");
        if cfg.kind != DbKind::Mysql {
            return;
        }
        let mut conn = MySqlConnector::new(cfg).connect().await.expect("connect");

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
