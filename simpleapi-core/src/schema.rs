//! Table definitions for clients, products and sales
//!
//! Constraints live in the schema so rows written outside the seeder are
//! held to the same rules: non-negative prices, positive quantities, the
//! three sale statuses, and foreign keys from sales to clients/products.

use crate::config::DbKind;

const POSTGRES_CREATE: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS clients (
      client_id  SERIAL PRIMARY KEY,
      full_name  TEXT NOT NULL,
      email      TEXT UNIQUE,
      created_at DATE NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS products (
      product_id  SERIAL PRIMARY KEY,
      name        TEXT NOT NULL,
      category    TEXT NOT NULL,
      unit_price  NUMERIC(12,2) NOT NULL CHECK(unit_price >= 0)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS sales (
      sale_id    SERIAL PRIMARY KEY,
      sale_date  DATE NOT NULL,
      status     TEXT NOT NULL CHECK(status IN ('PAID','PENDING','CANCELLED')),
      client_id  INT NOT NULL REFERENCES clients(client_id),
      product_id INT NOT NULL REFERENCES products(product_id),
      quantity   INT NOT NULL CHECK(quantity > 0),
      unit_price NUMERIC(12,2) NOT NULL CHECK(unit_price >= 0)
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_sales_date ON sales(sale_date)",
    "CREATE INDEX IF NOT EXISTS idx_sales_status ON sales(status)",
];

// MySQL lacks CREATE INDEX IF NOT EXISTS, so the indexes ride along with
// the table definition to keep re-runs idempotent.
const MYSQL_CREATE: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS clients (
      client_id  INT AUTO_INCREMENT PRIMARY KEY,
      full_name  VARCHAR(255) NOT NULL,
      email      VARCHAR(255) UNIQUE,
      created_at DATE NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS products (
      product_id  INT AUTO_INCREMENT PRIMARY KEY,
      name        VARCHAR(255) NOT NULL,
      category    VARCHAR(255) NOT NULL,
      unit_price  DECIMAL(12,2) NOT NULL CHECK(unit_price >= 0)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS sales (
      sale_id    INT AUTO_INCREMENT PRIMARY KEY,
      sale_date  DATE NOT NULL,
      status     VARCHAR(20) NOT NULL CHECK(status IN ('PAID','PENDING','CANCELLED')),
      client_id  INT NOT NULL,
      product_id INT NOT NULL,
      quantity   INT NOT NULL CHECK(quantity > 0),
      unit_price DECIMAL(12,2) NOT NULL CHECK(unit_price >= 0),
      FOREIGN KEY (client_id) REFERENCES clients(client_id),
      FOREIGN KEY (product_id) REFERENCES products(product_id),
      INDEX idx_sales_date (sale_date),
      INDEX idx_sales_status (status)
    )
    "#,
];

/// Dependents first: sales references both other tables.
const RESET: &[&str] = &[
    "DROP TABLE IF EXISTS sales",
    "DROP TABLE IF EXISTS products",
    "DROP TABLE IF EXISTS clients",
];

/// Statements that create any missing tables and indexes.
pub fn create_statements(kind: DbKind) -> &'static [&'static str] {
    match kind {
        DbKind::Postgres => POSTGRES_CREATE,
        DbKind::Mysql => MYSQL_CREATE,
    }
}

/// Statements that drop all three tables, in dependency order.
pub fn reset_statements() -> &'static [&'static str] {
    RESET
}
