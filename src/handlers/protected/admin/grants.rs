use axum::extract::{Path, State};
use axum::{Extension, Json};
use uuid::Uuid;

use crate::database::models::PermissionGrant;
use crate::middleware::{ApiResponse, ApiResult, RequestContext};
use crate::permissions::{Action, Requirement, ResourceCategory};
use crate::services::grant_service::{self, PutGrantRequest};
use crate::AppState;

const ADMIN: Requirement = Requirement {
    category: ResourceCategory::Grants,
    actions: &[Action::Admin],
};

/// GET /api/admin/grants/:identity_id
pub async fn get(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(identity_id): Path<Uuid>,
) -> ApiResult<PermissionGrant> {
    ctx.authorize(&ADMIN)?;

    let grant = grant_service::get(&state.pool, identity_id).await?;
    Ok(ApiResponse::success(grant))
}

/// PUT /api/admin/grants/:identity_id - replace an identity's grant rules
///
/// The payload is parsed against the closed category/action enums before the
/// write; a single unknown string rejects the whole request and leaves the
/// existing grant unchanged.
pub async fn put(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(identity_id): Path<Uuid>,
    Json(request): Json<PutGrantRequest>,
) -> ApiResult<PermissionGrant> {
    ctx.authorize(&ADMIN)?;

    let grant = grant_service::put(&state.pool, identity_id, request).await?;
    tracing::info!(actor = %ctx.identity.id, identity = %identity_id, "grant replaced");
    Ok(ApiResponse::success(grant))
}
