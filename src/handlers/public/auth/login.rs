use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::{self, password};
use crate::config;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::identity_service;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// POST /auth/login - authenticate with email/password and receive a token
///
/// Every failure mode (unknown email, no password credential, wrong
/// password) returns the same message so the endpoint cannot be used to
/// probe which emails exist.
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> ApiResult<Value> {
    let invalid = || ApiError::unauthorized("Invalid email or password");

    let identity = identity_service::find_by_email(&state.pool, &request.email.trim().to_lowercase())
        .await?
        .ok_or_else(invalid)?;

    let hash = identity.password_hash.as_deref().ok_or_else(invalid)?;

    let matches = password::verify_password(&request.password, hash).map_err(|e| {
        tracing::error!(identity = %identity.id, "stored password hash is unusable: {}", e);
        ApiError::internal_server_error("Authentication failed")
    })?;
    if !matches {
        tracing::warn!(identity = %identity.id, "login rejected: wrong password");
        return Err(invalid());
    }

    let token = auth::generate_token(identity.id)?;
    let expires_in = config::config().security.jwt_expiry_hours * 3600;

    Ok(ApiResponse::success(json!({
        "token": token,
        "expires_in": expires_in,
        "identity": identity,
    })))
}
