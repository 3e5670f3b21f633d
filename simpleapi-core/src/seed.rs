//! Demo dataset seeding
//!
//! Creates the schema and inserts a small fixed dataset:
//! - 5 clients
//! - 6 products
//! - 12 sales
//!
//! Dates are relative to the day the seeder runs. Insertion is skipped when
//! `clients` already has rows, unless a reset was requested.

use std::fmt;

use chrono::{Days, NaiveDate};
use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use crate::db::{insert_statement, Connection, SqlValue};
use crate::error::DbError;
use crate::schema;

/// Allowed values of `sales.status`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaleStatus {
    Paid,
    Pending,
    Cancelled,
}

impl SaleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Paid => "PAID",
            Self::Pending => "PENDING",
            Self::Cancelled => "CANCELLED",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewClient {
    pub full_name: &'static str,
    pub email: &'static str,
    pub created_at: NaiveDate,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewProduct {
    pub name: &'static str,
    pub category: &'static str,
    pub unit_price: Decimal,
}

/// Sale row. `unit_price` is a copy taken at sale time, not a live
/// reference to the product's price.
#[derive(Debug, Clone, PartialEq)]
pub struct NewSale {
    pub sale_date: NaiveDate,
    pub status: SaleStatus,
    pub client_id: i64,
    pub product_id: i64,
    pub quantity: i32,
    pub unit_price: Decimal,
}

/// (full_name, email, days before today)
const CLIENTS: [(&str, &str, u64); 5] = [
    ("Ana García", "ana.garcia@example.com", 120),
    ("Luis Pérez", "luis.perez@example.com", 90),
    ("María López", "maria.lopez@example.com", 60),
    ("Carlos Sánchez", "carlos.sanchez@example.com", 30),
    ("Sofía Ramírez", "sofia.ramirez@example.com", 15),
];

/// (name, category, price in cents)
const PRODUCTS: [(&str, &str, i64); 6] = [
    ("Teclado Mecánico", "Electrónica", 89900),
    ("Mouse Inalámbrico", "Electrónica", 39900),
    ("Termo Acero", "Hogar", 24900),
    ("Playera Deportiva", "Ropa", 29900),
    ("Cuaderno A4", "Oficina", 7900),
    ("Chocolate 70%", "Alimentos", 5900),
];

/// (days before today, status, client_id, product_id, quantity, price in cents)
const SALES: [(u64, SaleStatus, i64, i64, i32, i64); 12] = [
    (10, SaleStatus::Paid, 1, 1, 1, 89900),
    (10, SaleStatus::Paid, 2, 2, 2, 39900),
    (9, SaleStatus::Paid, 3, 3, 1, 24900),
    (9, SaleStatus::Pending, 4, 4, 1, 29900),
    (8, SaleStatus::Paid, 5, 5, 3, 7900),
    (8, SaleStatus::Cancelled, 1, 6, 2, 5900),
    (7, SaleStatus::Paid, 2, 1, 1, 89900),
    (7, SaleStatus::Paid, 3, 2, 1, 39900),
    (6, SaleStatus::Paid, 4, 4, 2, 29900),
    (5, SaleStatus::Paid, 5, 3, 1, 24900),
    (4, SaleStatus::Paid, 1, 5, 2, 7900),
    (3, SaleStatus::Pending, 2, 6, 5, 5900),
];

/// The fixed dataset, anchored at a given day.
#[derive(Debug, Clone, PartialEq)]
pub struct SeedData {
    pub clients: Vec<NewClient>,
    pub products: Vec<NewProduct>,
    pub sales: Vec<NewSale>,
}

fn days_before(today: NaiveDate, days: u64) -> NaiveDate {
    // Only fails near NaiveDate::MIN
    today.checked_sub_days(Days::new(days)).unwrap_or(NaiveDate::MIN)
}

impl SeedData {
    pub fn for_date(today: NaiveDate) -> Self {
        let clients = CLIENTS
            .iter()
            .map(|&(full_name, email, days)| NewClient {
                full_name,
                email,
                created_at: days_before(today, days),
            })
            .collect();

        let products = PRODUCTS
            .iter()
            .map(|&(name, category, cents)| NewProduct {
                name,
                category,
                unit_price: Decimal::new(cents, 2),
            })
            .collect();

        let sales = SALES
            .iter()
            .map(
                |&(days, status, client_id, product_id, quantity, cents)| NewSale {
                    sale_date: days_before(today, days),
                    status,
                    client_id,
                    product_id,
                    quantity,
                    unit_price: Decimal::new(cents, 2),
                },
            )
            .collect();

        Self {
            clients,
            products,
            sales,
        }
    }

    fn client_params(&self) -> Vec<Vec<SqlValue>> {
        self.clients
            .iter()
            .map(|c| vec![c.full_name.into(), c.email.into(), c.created_at.into()])
            .collect()
    }

    fn product_params(&self) -> Vec<Vec<SqlValue>> {
        self.products
            .iter()
            .map(|p| vec![p.name.into(), p.category.into(), p.unit_price.into()])
            .collect()
    }

    fn sale_params(&self) -> Vec<Vec<SqlValue>> {
        self.sales
            .iter()
            .map(|s| {
                vec![
                    s.sale_date.into(),
                    s.status.as_str().into(),
                    s.client_id.into(),
                    s.product_id.into(),
                    s.quantity.into(),
                    s.unit_price.into(),
                ]
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedOptions {
    /// Drop and recreate all tables first
    pub reset: bool,
    /// Anchor for the relative dates in the dataset
    pub today: NaiveDate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedOutcome {
    Inserted {
        clients: u64,
        products: u64,
        sales: u64,
    },
    /// `clients` already had rows and no reset was requested
    Skipped { existing_clients: i64 },
}

impl fmt::Display for SeedOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Inserted {
                clients,
                products,
                sales,
            } => write!(
                f,
                "Seed completed.\nInserted: clients={clients}, products={products}, sales={sales}"
            ),
            Self::Skipped { .. } => write!(
                f,
                "Seed skipped: data already exists. Use --reset to recreate tables."
            ),
        }
    }
}

/// Runs one seed pass over a borrowed connection.
///
/// Schema statements run in autocommit mode. The inserts share a single
/// transaction: either all three tables are filled and committed, or the
/// transaction is rolled back.
///
/// Not safe to run concurrently against the same empty database: the
/// emptiness check and the inserts are not atomic with respect to other
/// writers.
pub struct Seeder<'c> {
    conn: &'c mut dyn Connection,
}

impl<'c> Seeder<'c> {
    pub fn new(conn: &'c mut dyn Connection) -> Self {
        Self { conn }
    }

    pub async fn run(&mut self, options: SeedOptions) -> Result<SeedOutcome, DbError> {
        let kind = self.conn.kind();
        info!(backend = %kind, reset = options.reset, "Seeding database");

        if options.reset {
            for stmt in schema::reset_statements() {
                self.conn.execute(stmt).await?;
            }
            info!("Dropped sales, products and clients");
        }

        for stmt in schema::create_statements(kind) {
            self.conn.execute(stmt).await?;
        }
        debug!("Schema ensured");

        let existing_clients = self.count_clients().await?;
        if existing_clients > 0 && !options.reset {
            info!(existing_clients, "Seed skipped: data already exists");
            return Ok(SeedOutcome::Skipped { existing_clients });
        }

        let data = SeedData::for_date(options.today);

        self.conn.begin().await?;
        match self.insert(&data).await {
            Ok(outcome) => {
                self.conn.commit().await?;
                info!("Seed committed");
                Ok(outcome)
            }
            Err(err) => {
                if let Err(rollback_err) = self.conn.rollback().await {
                    warn!("Rollback after failed seed also failed: {}", rollback_err);
                }
                Err(err)
            }
        }
    }

    async fn count_clients(&mut self) -> Result<i64, DbError> {
        let rows = self
            .conn
            .fetch_all("SELECT COUNT(*) AS client_count FROM clients")
            .await?;

        match rows.first() {
            Some(row) => row.get_i64("client_count"),
            None => Ok(0),
        }
    }

    /// Clients and products before sales: the foreign keys demand it.
    async fn insert(&mut self, data: &SeedData) -> Result<SeedOutcome, DbError> {
        let kind = self.conn.kind();

        let clients = self
            .conn
            .execute_batch(
                &insert_statement(kind, "clients", &["full_name", "email", "created_at"]),
                &data.client_params(),
            )
            .await?;

        let products = self
            .conn
            .execute_batch(
                &insert_statement(kind, "products", &["name", "category", "unit_price"]),
                &data.product_params(),
            )
            .await?;

        let sales = self
            .conn
            .execute_batch(
                &insert_statement(
                    kind,
                    "sales",
                    &[
                        "sale_date",
                        "status",
                        "client_id",
                        "product_id",
                        "quantity",
                        "unit_price",
                    ],
                ),
                &data.sale_params(),
            )
            .await?;

        Ok(SeedOutcome::Inserted {
            clients,
            products,
            sales,
        })
    }
}
