//! Axum server setup
//!
//! Server skeleton with:
//! - Request tracing
//! - Graceful shutdown on SIGTERM/Ctrl+C

use std::net::SocketAddr;

use simpleapi_core::ConnectionProvider;
use tokio::net::TcpListener;

use crate::{build_router, AppState};

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to (default: 127.0.0.1:8000)
    pub bind_addr: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8000)),
        }
    }
}

/// Run the HTTP server.
///
/// No connection is opened here; each request acquires its own.
///
/// # Example
///
/// ```ignore
/// let provider = ConnectionProvider::from_config(&DbConfig::from_env()?);
/// run_server(provider, ServerConfig::default()).await?;
/// ```
pub async fn run_server(
    provider: ConnectionProvider,
    config: ServerConfig,
) -> Result<(), ServerError> {
    tracing::info!(backend = %provider.kind(), "Database backend selected");
    let app = build_router(AppState::new(provider));

    let listener = TcpListener::bind(config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let signal = shutdown_signal().await;
            tracing::info!(signal, "Draining in-flight requests");
        })
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Resolves with the name of the first shutdown signal received.
///
/// A handler that cannot be installed never fires; the other still can.
async fn shutdown_signal() -> &'static str {
    let interrupt = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => "SIGINT",
            Err(e) => {
                tracing::error!("Cannot listen for Ctrl+C: {}", e);
                std::future::pending().await
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
                "SIGTERM"
            }
            Err(e) => {
                tracing::error!("Cannot install SIGTERM handler: {}", e);
                std::future::pending().await
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<&'static str>();

    tokio::select! {
        name = interrupt => name,
        name = terminate => name,
    }
}

/// Server error type
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
