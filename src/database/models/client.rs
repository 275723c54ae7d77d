use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

pub const DEFAULT_CLIENT_STATUS: &str = "Active";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Client {
    pub id: i64,
    pub display_name: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

/// Validated input for a client insert
#[derive(Debug, Clone)]
pub struct NewClient {
    pub display_name: String,
    pub status: String,
}

/// Account breakdown reported for a single client.
///
/// `high_value_peer_client_count` counts every client holding a high-value
/// account, not just peers of the requested client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientDetail {
    pub display_name: String,
    pub unlinked_account_count: i64,
    pub linked_account_count: i64,
    pub high_value_peer_client_count: i64,
}
