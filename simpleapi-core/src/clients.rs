//! Client listing - the read side of the API

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::db::{Connection, Row};
use crate::error::DbError;

/// Rows returned by `GET /clients`
pub const CLIENT_PAGE_SIZE: u32 = 10;

/// One client as exposed over HTTP.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientSummary {
    pub client_id: i64,
    pub full_name: String,
    pub email: Option<String>,
    /// Serialized as `YYYY-MM-DD`
    pub created_at: NaiveDate,
}

impl TryFrom<&Row> for ClientSummary {
    type Error = DbError;

    fn try_from(row: &Row) -> Result<Self, Self::Error> {
        Ok(Self {
            client_id: row.get_i64("client_id")?,
            full_name: row.get_text("full_name")?,
            email: row.get_opt_text("email")?,
            created_at: row.get_date("created_at")?,
        })
    }
}

/// First `limit` clients by ascending id.
pub async fn list_clients(
    conn: &mut dyn Connection,
    limit: u32,
) -> Result<Vec<ClientSummary>, DbError> {
    let sql = format!(
        "SELECT client_id, full_name, email, created_at \
         FROM clients \
         ORDER BY client_id \
         LIMIT {limit}"
    );

    let rows = conn.fetch_all(&sql).await?;
    tracing::debug!(count = rows.len(), "Fetched clients");

    rows.iter().map(ClientSummary::try_from).collect()
}
