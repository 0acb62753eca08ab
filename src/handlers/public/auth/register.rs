use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};

use crate::auth;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::identity_service::{self, RegisterRequest};
use crate::AppState;

/// POST /auth/register - create an identity and return a token for it
///
/// New identities are plain members with no tenant binding and no grant row;
/// until an admin grants permissions (or the identity creates its own
/// tenant), every category-gated operation denies.
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> ApiResult<Value> {
    let identity = identity_service::register(&state.pool, request).await?;
    let token = auth::generate_token(identity.id)?;

    tracing::info!(identity = %identity.id, "identity registered");

    Ok(ApiResponse::created(json!({
        "token": token,
        "identity": identity,
    })))
}
