use axum::{extract::State, Extension};

use crate::app::AppState;
use crate::database::models::Payload;
use crate::extract::Json;
use crate::middleware::{ApiResponse, ApiResult, Principal};
use crate::services::PayloadInput;

/// POST /api/data - Store `{"message": "..."}`
pub async fn create(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(input): Json<PayloadInput>,
) -> ApiResult<Payload> {
    let payload = state.service.create_payload(input).await?;
    tracing::debug!("Payload {} stored by '{}'", payload.id, principal.username);
    Ok(ApiResponse::created(payload))
}

/// GET /api/data - All stored payloads, newest first
pub async fn list(State(state): State<AppState>) -> ApiResult<Vec<Payload>> {
    let payloads = state.service.list_payloads().await?;
    Ok(ApiResponse::success(payloads))
}
