//! HTTP server command
//!
//! Runs the simple-api HTTP server against the configured backend.

use std::net::SocketAddr;

use anyhow::{Context, Result};
use clap::Parser;
use simpleapi_core::{ConnectionProvider, DbConfig};
use simpleapi_server::{run_server, ServerConfig};

/// Arguments for the serve command
#[derive(Parser, Debug)]
pub struct ServeArgs {
    /// Address to bind to
    #[arg(long, short = 'b', env = "BIND_ADDR", default_value = "127.0.0.1:8000")]
    pub bind: SocketAddr,
}

/// Run the HTTP server (blocks until shutdown)
pub async fn run_serve(args: ServeArgs, db: DbConfig) -> Result<()> {
    tracing::info!("Starting simple-api server on {}", args.bind);

    let provider = ConnectionProvider::from_config(&db);
    let config = ServerConfig {
        bind_addr: args.bind,
    };

    run_server(provider, config).await.context("Server error")?;

    Ok(())
}
