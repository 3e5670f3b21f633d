//! simpleapi-core: configuration, database access and seeding
//!
//! The HTTP layer (`simpleapi-server`) and the `simpleapi` binary build on
//! the pieces exported here:
//!
//! - [`config`]: environment-driven [`DbConfig`] resolution
//! - [`db`]: the [`Connection`] abstraction over PostgreSQL and MySQL, plus
//!   the scoped [`ConnectionProvider`]
//! - [`schema`] / [`seed`]: table definitions and the fixed demo dataset
//! - [`clients`]: the read query behind `GET /clients`

pub mod clients;
pub mod config;
pub mod db;
pub mod error;
pub mod schema;
pub mod seed;

pub use clients::{list_clients, ClientSummary, CLIENT_PAGE_SIZE};
pub use config::{DbConfig, DbKind, APP_NAME};
pub use db::{Connection, ConnectionProvider, Connector, Row, ScopedConnection, SqlValue};
pub use error::{ConfigError, DbError};
pub use seed::{SeedData, SeedOptions, SeedOutcome, Seeder};
