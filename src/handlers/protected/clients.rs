// handlers/protected/clients.rs - /api/clients/*
//
// Mounted behind the ClientsViewSet capability layer: GET needs read, POST and DELETE need write.

use axum::extract::State;
use serde::Deserialize;

use crate::app::AppState;
use crate::database::models::{Client, ClientAccountRow, ClientDetail};
use crate::extract::{Json, Path, Query};
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::validation::parse_money_str;
use crate::services::ClientInput;

#[derive(Debug, Deserialize)]
pub struct HighValueQuery {
    /// Decimal threshold; defaults to the configured high-value threshold
    pub threshold: Option<String>,
}

/// GET /api/clients
pub async fn list(State(state): State<AppState>) -> ApiResult<Vec<Client>> {
    let clients = state.service.list_clients().await?;
    Ok(ApiResponse::success(clients))
}

/// POST /api/clients
pub async fn create(
    State(state): State<AppState>,
    Json(input): Json<ClientInput>,
) -> ApiResult<Client> {
    let client = state.service.create_client(input).await?;
    Ok(ApiResponse::created(client))
}

/// GET /api/clients/:id
pub async fn show(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Client> {
    let client = state.service.get_client(id).await?;
    Ok(ApiResponse::success(client))
}

/// DELETE /api/clients/:id - Also removes every account of the client
pub async fn delete(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<()> {
    state.service.delete_client(id).await?;
    Ok(ApiResponse::no_content())
}

/// GET /api/clients/:id/detailed_info
pub async fn detailed_info(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<ClientDetail> {
    let detail = state.service.client_detail(id).await?;
    Ok(ApiResponse::success(detail))
}

/// GET /api/clients/:id/accounts - Inner join of the client with its accounts
pub async fn accounts(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Vec<ClientAccountRow>> {
    let rows = state.service.join_clients_accounts(id).await?;
    Ok(ApiResponse::success(rows))
}

/// GET /api/clients/high-value?threshold=50000
pub async fn high_value(
    State(state): State<AppState>,
    Query(query): Query<HighValueQuery>,
) -> ApiResult<Vec<Client>> {
    let threshold = match query.threshold.as_deref() {
        Some(raw) => parse_money_str("threshold", raw)?,
        None => state.service.high_value_threshold(),
    };
    let clients = state.service.high_value_clients(threshold).await?;
    Ok(ApiResponse::success(clients))
}
