use axum::Extension;

use crate::middleware::{ApiResponse, ApiResult, Principal};

/// GET /api/auth/whoami - The principal resolved from the bearer token
pub async fn whoami(Extension(principal): Extension<Principal>) -> ApiResult<Principal> {
    Ok(ApiResponse::success(principal))
}
