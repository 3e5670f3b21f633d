//! Liveness endpoint

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;
use simpleapi_core::{DbKind, APP_NAME};

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub name: &'static str,
    pub version: &'static str,
    /// Backend selected by DB_TYPE; not a reachability check
    pub backend: DbKind,
}

/// GET /health - answers without opening a database connection
async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        name: APP_NAME,
        version: env!("CARGO_PKG_VERSION"),
        backend: state.provider().kind(),
    })
}

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health))
}
