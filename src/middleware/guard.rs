use axum::{
    extract::{Request, State},
    http::Method,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::app::AppState;
use crate::error::ApiError;
use crate::services::ServiceError;
use crate::types::AccessMode;

use super::auth::Principal;

/// Capability check for one (resource, mode) pair.
/// Denies with `AuthorizationError` unless one of the principal's roles grants `mode` on `resource`.
pub async fn require(
    state: &AppState,
    principal: &Principal,
    resource: &str,
    mode: AccessMode,
) -> Result<(), ServiceError> {
    if state.service.authorize(&principal.roles, resource, mode).await? {
        return Ok(());
    }

    tracing::warn!(
        "Denied {} access to {} for user '{}' (roles: {:?})",
        mode,
        resource,
        principal.username,
        principal.roles
    );
    Err(ServiceError::AuthorizationError(format!(
        "{} access to {} is not permitted",
        mode, resource
    )))
}

/// State for `capability_middleware`: the resource a route group belongs to
#[derive(Clone)]
pub struct Capability {
    pub state: AppState,
    pub resource: &'static str,
}

impl Capability {
    pub fn new(state: AppState, resource: &'static str) -> Self {
        Self { state, resource }
    }
}

/// Safe methods read, everything else writes
pub fn mode_for(method: &Method) -> AccessMode {
    if method == Method::GET || method == Method::HEAD || method == Method::OPTIONS {
        AccessMode::Read
    } else {
        AccessMode::Write
    }
}

/// Route-layer middleware running `require` before the handler's own
/// extractors, so a denied caller never gets a body or path error instead.
/// Expects `jwt_auth_middleware` to have injected the `Principal`.
pub async fn capability_middleware(
    State(capability): State<Capability>,
    request: Request,
    next: Next,
) -> Response {
    let Some(principal) = request.extensions().get::<Principal>().cloned() else {
        return ApiError::unauthorized("Missing authenticated principal").into_response();
    };

    let mode = mode_for(request.method());
    match require(&capability.state, &principal, capability.resource, mode).await {
        Ok(()) => next.run(request).await,
        Err(e) => ApiError::from(e).into_response(),
    }
}
