use axum::extract::State;
use axum::{Extension, Json};

use crate::database::models::Tenant;
use crate::middleware::{ApiResponse, ApiResult, RequestContext};
use crate::services::tenant_service::{self, CreateTenantRequest};
use crate::AppState;

/// POST /api/tenants - create a tenant owned by the caller
///
/// Tenant creation is identity-scoped rather than category-gated: a fresh
/// identity has no grant row, and this is the operation that bootstraps its
/// organization. The service enforces the one-tenant-per-identity invariant.
pub async fn create(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Json(request): Json<CreateTenantRequest>,
) -> ApiResult<Tenant> {
    let tenant = tenant_service::create(&state.pool, ctx.identity.id, request).await?;
    Ok(ApiResponse::created(tenant))
}

/// GET /api/tenants/current - the caller's own tenant
pub async fn current(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
) -> ApiResult<Tenant> {
    let tenant_id = ctx.tenant.require()?;
    let tenant = tenant_service::get(&state.pool, tenant_id).await?;
    Ok(ApiResponse::success(tenant))
}
