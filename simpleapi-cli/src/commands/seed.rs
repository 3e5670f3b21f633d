//! Seed command - create tables and insert the demo dataset
//!
//! Usage:
//!   simpleapi seed            # create missing tables, insert if empty
//!   simpleapi seed --reset    # drop and recreate tables, then insert

use anyhow::{Context, Result};
use clap::Parser;
use simpleapi_core::{ConnectionProvider, DbConfig, SeedOptions, SeedOutcome, Seeder};

/// Arguments for the seed command
#[derive(Parser, Debug)]
pub struct SeedArgs {
    /// Drop and recreate tables before inserting.
    #[arg(long)]
    pub reset: bool,
}

pub async fn run_seed(args: SeedArgs, db: DbConfig) -> Result<SeedOutcome> {
    let options = SeedOptions {
        reset: args.reset,
        today: chrono::Local::now().date_naive(),
    };

    let provider = ConnectionProvider::from_config(&db);
    let outcome = provider
        .with_connection(|conn| Box::pin(async move { Seeder::new(conn).run(options).await }))
        .await
        .with_context(|| format!("Seeding {} database '{}' failed", db.kind, db.database))?;

    println!("{outcome}");
    Ok(outcome)
}
