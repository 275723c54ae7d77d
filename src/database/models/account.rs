use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

pub const DEFAULT_ACCOUNT_STATUS: &str = "Open";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Account {
    pub id: i64,
    pub client_id: i64,
    /// External reference code; `None` marks an unlinked account
    pub external_ref: Option<String>,
    pub market_value: Decimal,
    pub status: String,
}

/// Validated input for an account insert
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub client_id: i64,
    pub external_ref: Option<String>,
    pub market_value: Decimal,
    pub status: String,
}

/// One row of the client/account inner join
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct ClientAccountRow {
    pub client_id: i64,
    pub display_name: String,
    pub account_id: i64,
    pub external_ref: Option<String>,
}
