// handlers/protected/permissions.rs - /api/permissions/*

use axum::{extract::State, Extension};
use serde::{Deserialize, Serialize};

use crate::app::AppState;
use crate::database::models::{Permission, PermissionGrant};
use crate::extract::{Json, Path, Query};
use crate::middleware::{ApiResponse, ApiResult, Principal};
use crate::types::AccessMode;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    /// Only rows granting this mode
    pub mode: Option<AccessMode>,
}

#[derive(Debug, Deserialize)]
pub struct CheckQuery {
    pub resource: String,
    #[serde(default = "default_mode")]
    pub mode: AccessMode,
}

fn default_mode() -> AccessMode {
    AccessMode::Read
}

#[derive(Debug, Serialize)]
pub struct CheckResult {
    pub resource: String,
    pub mode: AccessMode,
    pub allowed: bool,
}

#[derive(Debug, Deserialize)]
pub struct GrantBody {
    #[serde(default)]
    pub can_read: bool,
    #[serde(default)]
    pub can_write: bool,
}

/// GET /api/permissions[?mode=read|write] (PermissionsAdmin read)
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Vec<Permission>> {
    let permissions = state.service.list_permissions(query.mode).await?;
    Ok(ApiResponse::success(permissions))
}

/// GET /api/permissions/check?resource=ClientsViewSet&mode=write
///
/// Evaluates the caller's own roles. Any authenticated user may ask.
pub async fn check(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Query(query): Query<CheckQuery>,
) -> ApiResult<CheckResult> {
    let allowed = state
        .service
        .authorize(&principal.roles, &query.resource, query.mode)
        .await?;
    Ok(ApiResponse::success(CheckResult {
        resource: query.resource,
        mode: query.mode,
        allowed,
    }))
}

/// PUT /api/permissions/:role/:resource - Create or replace the flags for a pair (PermissionsAdmin write)
pub async fn grant(
    State(state): State<AppState>,
    Path((role_name, resource_name)): Path<(String, String)>,
    Json(body): Json<GrantBody>,
) -> ApiResult<Permission> {
    let permission = state
        .service
        .grant_permission(PermissionGrant {
            role_name,
            resource_name,
            can_read: body.can_read,
            can_write: body.can_write,
        })
        .await?;
    Ok(ApiResponse::success(permission))
}
