//! simpleapi CLI - serve the clients API or seed its database
//!
//! Configuration comes from DB_* environment variables, optionally via a
//! `.env` file. It is resolved once, before any subcommand runs, so a bad
//! DB_TYPE or a missing variable stops the process before it opens a socket.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use simpleapi_core::config::load_dotenv;
use simpleapi_core::DbConfig;

mod commands;
mod tracing_setup;

use tracing_setup::TracingConfig;

#[derive(Parser, Debug)]
#[command(
    name = "simpleapi",
    author,
    version,
    about = "Read-only clients API over PostgreSQL or MySQL, with a demo data seeder"
)]
struct Cli {
    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP server (GET /clients, GET /health)
    Serve(commands::serve::ServeArgs),
    /// Create the schema and insert the demo dataset
    Seed(commands::seed::SeedArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    // Before parsing, so clap `env` fallbacks see values from .env
    let dotenv_path = load_dotenv();
    let cli = Cli::parse();

    tracing_setup::init(&TracingConfig { debug: cli.debug })?;
    if let Some(path) = dotenv_path {
        tracing::info!("Loaded configuration from {}", path.display());
    }

    let db = DbConfig::from_env().context("Invalid database configuration")?;
    tracing::debug!(?db, "Database configuration resolved");

    match cli.command {
        Commands::Serve(args) => commands::serve::run_serve(args, db).await,
        Commands::Seed(args) => commands::seed::run_seed(args, db).await.map(|_| ()),
    }
}
