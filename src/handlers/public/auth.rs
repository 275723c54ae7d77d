// handlers/public/auth.rs - POST /auth/login

use axum::extract::State;
use serde::{Deserialize, Serialize};

use crate::app::AppState;
use crate::auth::credentials::verify_password;
use crate::auth::{generate_jwt, Claims};
use crate::error::ApiError;
use crate::extract::Json;
use crate::middleware::{ApiResponse, ApiResult};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginUser {
    pub username: String,
    pub roles: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: &'static str,
    pub expires_in: i64,
    pub user: LoginUser,
}

/// POST /auth/login - Exchange username and password for a bearer token
///
/// Expected Input:
/// ```json
/// { "username": "admin", "password": "admin123" }
/// ```
///
/// Unknown users and wrong passwords get the same 401 so the response does
/// not reveal which usernames exist.
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> ApiResult<LoginResponse> {
    if payload.username.trim().is_empty() || payload.password.is_empty() {
        return Err(ApiError::bad_request("username and password are required"));
    }

    let user = state.credentials.find_by_username(payload.username.trim()).await?;
    let user = match user {
        Some(user) if verify_password(&payload.password, &user.password_hash) => user,
        _ => {
            tracing::warn!("Failed login attempt for '{}'", payload.username.trim());
            return Err(ApiError::unauthorized("Bad username or password"));
        }
    };

    let claims = Claims::new(
        user.username.clone(),
        user.roles.clone(),
        state.config.security.jwt_expiry_hours,
    );
    let access_token = generate_jwt(&claims, &state.config.security)?;

    tracing::info!("Issued token for '{}' (roles: {:?})", user.username, user.roles);

    Ok(ApiResponse::success(LoginResponse {
        access_token,
        token_type: "Bearer",
        expires_in: claims.lifetime_secs(),
        user: LoginUser {
            username: user.username,
            roles: user.roles,
        },
    }))
}
