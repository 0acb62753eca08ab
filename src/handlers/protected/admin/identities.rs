use axum::extract::{Path, State};
use axum::{Extension, Json};
use uuid::Uuid;

use crate::database::models::Identity;
use crate::middleware::{ApiResponse, ApiResult, RequestContext};
use crate::permissions::{Action, Requirement, ResourceCategory};
use crate::services::identity_service::{self, CreateIdentityRequest, UpdateIdentityRequest};
use crate::AppState;

const ADMIN: Requirement = Requirement {
    category: ResourceCategory::Identities,
    actions: &[Action::Admin],
};

/// POST /api/admin/identities - provision an identity with an explicit role
pub async fn create(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Json(request): Json<CreateIdentityRequest>,
) -> ApiResult<Identity> {
    ctx.authorize(&ADMIN)?;

    let identity = identity_service::create(&state.pool, request).await?;
    tracing::info!(actor = %ctx.identity.id, created = %identity.id, "identity provisioned");
    Ok(ApiResponse::created(identity))
}

/// PUT /api/admin/identities/:id - rename, change role, or soft-disable
pub async fn update(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateIdentityRequest>,
) -> ApiResult<Identity> {
    ctx.authorize(&ADMIN)?;

    let identity = identity_service::update(&state.pool, id, request).await?;
    tracing::info!(actor = %ctx.identity.id, updated = %identity.id, "identity updated");
    Ok(ApiResponse::success(identity))
}
