//! simpleapi-server: HTTP surface for simple-api
//!
//! One read endpoint (`GET /clients`) plus a health check. Every request
//! opens its own database connection through the
//! [`ConnectionProvider`](simpleapi_core::ConnectionProvider) and closes it
//! before the response is sent.

pub mod error;
pub mod routes;
pub mod server;
pub mod state;

use axum::Router;
use tower_http::trace::TraceLayer;

pub use error::ApiError;
pub use server::{run_server, ServerConfig, ServerError};
pub use state::AppState;

/// Build the application router with all routes
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(routes::health::router())
        .merge(routes::clients::router())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
