use axum::extract::{Path, Query, State};
use axum::{Extension, Json};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::database::models::Opportunity;
use crate::database::repository::{ListFilter, Page};
use crate::middleware::{ApiResponse, ApiResult, Paginated, RequestContext};
use crate::permissions::{Action, Requirement, ResourceCategory};
use crate::services::opportunity_service::{self, CreateOpportunityRequest, UpdateOpportunityRequest};
use crate::AppState;

const VIEW: Requirement = Requirement {
    category: ResourceCategory::Opportunities,
    actions: &[Action::View],
};
const CREATE: Requirement = Requirement {
    category: ResourceCategory::Opportunities,
    actions: &[Action::Create],
};
const EDIT: Requirement = Requirement {
    category: ResourceCategory::Opportunities,
    actions: &[Action::Edit],
};
const DELETE: Requirement = Requirement {
    category: ResourceCategory::Opportunities,
    actions: &[Action::Delete],
};

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub search: Option<String>,
}

/// GET /api/opportunities
pub async fn list(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Paginated<Opportunity>> {
    ctx.authorize(&VIEW)?;
    let tenant_id = ctx.tenant.require()?;

    let page = Page::from_query(query.page, query.limit);
    let filter = ListFilter { search: query.search };
    let (items, total) = opportunity_service::list(&state.pool, tenant_id, &filter, &page).await?;

    Ok(ApiResponse::success(Paginated {
        items,
        page: page.page,
        limit: page.limit,
        total,
    }))
}

/// GET /api/opportunities/:id
pub async fn get(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Opportunity> {
    ctx.authorize(&VIEW)?;
    let tenant_id = ctx.tenant.require()?;

    let opportunity = opportunity_service::get(&state.pool, id, tenant_id).await?;
    Ok(ApiResponse::success(opportunity))
}

/// POST /api/opportunities
pub async fn create(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Json(request): Json<CreateOpportunityRequest>,
) -> ApiResult<Opportunity> {
    ctx.authorize(&CREATE)?;
    let tenant_id = ctx.tenant.require()?;

    let opportunity = opportunity_service::create(&state.pool, tenant_id, request).await?;
    Ok(ApiResponse::created(opportunity))
}

/// PUT /api/opportunities/:id
pub async fn update(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateOpportunityRequest>,
) -> ApiResult<Opportunity> {
    ctx.authorize(&EDIT)?;
    let tenant_id = ctx.tenant.require()?;

    let opportunity = opportunity_service::update(&state.pool, id, tenant_id, request).await?;
    Ok(ApiResponse::success(opportunity))
}

/// DELETE /api/opportunities/:id
pub async fn delete(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Value> {
    ctx.authorize(&DELETE)?;
    let tenant_id = ctx.tenant.require()?;

    let deleted = opportunity_service::delete(&state.pool, id, tenant_id).await?;
    if !deleted {
        return Err(crate::error::ApiError::not_found("Record not found"));
    }
    Ok(ApiResponse::success(json!({ "deleted": id })))
}
