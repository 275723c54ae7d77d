// handlers/protected/accounts.rs - /api/accounts/*
//
// Mounted behind the AccountsViewSet capability layer.

use axum::extract::State;
use serde::Deserialize;

use crate::app::AppState;
use crate::database::models::Account;
use crate::extract::{Json, Path, Query};
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::AccountInput;

#[derive(Debug, Deserialize)]
pub struct AccountFilter {
    pub client_id: Option<i64>,
}

/// GET /api/accounts[?client_id=N]
pub async fn list(
    State(state): State<AppState>,
    Query(filter): Query<AccountFilter>,
) -> ApiResult<Vec<Account>> {
    let accounts = state.service.list_accounts(filter.client_id).await?;
    Ok(ApiResponse::success(accounts))
}

/// POST /api/accounts
///
/// Expected Input:
/// ```json
/// { "client_id": 1, "external_ref": "F12345", "market_value": "150000.75" }
/// ```
///
/// `market_value` may be a JSON number or a decimal string. The referenced
/// client must exist (404 otherwise).
pub async fn create(
    State(state): State<AppState>,
    Json(input): Json<AccountInput>,
) -> ApiResult<Account> {
    let account = state.service.create_account(input).await?;
    Ok(ApiResponse::created(account))
}

/// GET /api/accounts/:id
pub async fn show(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Account> {
    let account = state.service.get_account(id).await?;
    Ok(ApiResponse::success(account))
}

/// DELETE /api/accounts/:id
pub async fn delete(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<()> {
    state.service.delete_account(id).await?;
    Ok(ApiResponse::no_content())
}
