use axum::extract::{Path, Query, State};
use axum::{Extension, Json};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::database::models::Account;
use crate::database::repository::{ListFilter, Page};
use crate::middleware::{ApiResponse, ApiResult, Paginated, RequestContext};
use crate::permissions::{Action, Requirement, ResourceCategory};
use crate::services::account_service::{self, CreateAccountRequest, UpdateAccountRequest};
use crate::AppState;

const VIEW: Requirement = Requirement {
    category: ResourceCategory::Accounts,
    actions: &[Action::View],
};
const CREATE: Requirement = Requirement {
    category: ResourceCategory::Accounts,
    actions: &[Action::Create],
};
const EDIT: Requirement = Requirement {
    category: ResourceCategory::Accounts,
    actions: &[Action::Edit],
};
const DELETE: Requirement = Requirement {
    category: ResourceCategory::Accounts,
    actions: &[Action::Delete],
};

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub search: Option<String>,
}

/// GET /api/accounts - list the caller's tenant's accounts
pub async fn list(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Paginated<Account>> {
    ctx.authorize(&VIEW)?;
    let tenant_id = ctx.tenant.require()?;

    let page = Page::from_query(query.page, query.limit);
    let filter = ListFilter { search: query.search };
    let (items, total) = account_service::list(&state.pool, tenant_id, &filter, &page).await?;

    Ok(ApiResponse::success(Paginated {
        items,
        page: page.page,
        limit: page.limit,
        total,
    }))
}

/// GET /api/accounts/:id
pub async fn get(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Account> {
    ctx.authorize(&VIEW)?;
    let tenant_id = ctx.tenant.require()?;

    let account = account_service::get(&state.pool, id, tenant_id).await?;
    Ok(ApiResponse::success(account))
}

/// POST /api/accounts
pub async fn create(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Json(request): Json<CreateAccountRequest>,
) -> ApiResult<Account> {
    ctx.authorize(&CREATE)?;
    let tenant_id = ctx.tenant.require()?;

    let account = account_service::create(&state.pool, tenant_id, request).await?;
    Ok(ApiResponse::created(account))
}

/// PUT /api/accounts/:id
pub async fn update(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateAccountRequest>,
) -> ApiResult<Account> {
    ctx.authorize(&EDIT)?;
    let tenant_id = ctx.tenant.require()?;

    let account = account_service::update(&state.pool, id, tenant_id, request).await?;
    Ok(ApiResponse::success(account))
}

/// DELETE /api/accounts/:id
pub async fn delete(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Value> {
    ctx.authorize(&DELETE)?;
    let tenant_id = ctx.tenant.require()?;

    let deleted = account_service::delete(&state.pool, id, tenant_id).await?;
    if !deleted {
        return Err(crate::error::ApiError::not_found("Record not found"));
    }
    Ok(ApiResponse::success(json!({ "deleted": id })))
}
