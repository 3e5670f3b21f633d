//! Client endpoints

use axum::{extract::State, routing::get, Json, Router};
use simpleapi_core::{list_clients, ClientSummary, CLIENT_PAGE_SIZE};

use crate::error::ApiError;
use crate::state::AppState;

/// GET /clients - first page of clients by ascending id
///
/// Opens a connection for this request only; it is closed on every path
/// out, including query failures.
async fn get_clients(State(state): State<AppState>) -> Result<Json<Vec<ClientSummary>>, ApiError> {
    let clients = state
        .provider()
        .with_connection(|conn| Box::pin(list_clients(conn, CLIENT_PAGE_SIZE)))
        .await?;

    Ok(Json(clients))
}

/// Client routes
pub fn router() -> Router<AppState> {
    Router::new().route("/clients", get(get_clients))
}
