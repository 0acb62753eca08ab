use bigdecimal::BigDecimal;
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::models::Opportunity;
use crate::database::repository::{ListFilter, Page, ScopedRepository};
use crate::error::ApiError;

pub fn repository(pool: PgPool) -> ScopedRepository<Opportunity> {
    ScopedRepository::new("opportunities", "name", pool)
}

#[derive(Debug, Deserialize)]
pub struct CreateOpportunityRequest {
    pub name: String,
    pub stage: Option<String>,
    pub amount: Option<BigDecimal>,
    pub account_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateOpportunityRequest {
    pub name: Option<String>,
    pub stage: Option<String>,
    pub amount: Option<BigDecimal>,
    pub account_id: Option<Uuid>,
}

pub async fn list(
    pool: &PgPool,
    tenant_id: Uuid,
    filter: &ListFilter,
    page: &Page,
) -> Result<(Vec<Opportunity>, i64), ApiError> {
    Ok(repository(pool.clone()).list(tenant_id, filter, page).await?)
}

pub async fn get(pool: &PgPool, id: Uuid, tenant_id: Uuid) -> Result<Opportunity, ApiError> {
    Ok(repository(pool.clone()).get_404(id, tenant_id).await?)
}

pub async fn create(
    pool: &PgPool,
    tenant_id: Uuid,
    request: CreateOpportunityRequest,
) -> Result<Opportunity, ApiError> {
    if request.name.trim().is_empty() {
        return Err(ApiError::bad_request("Opportunity name is required"));
    }

    if let Some(account_id) = request.account_id {
        check_account_link(pool, account_id, tenant_id).await?;
    }

    let opportunity = sqlx::query_as::<_, Opportunity>(
        r#"
        INSERT INTO opportunities (id, tenant_id, account_id, name, stage, amount)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(tenant_id)
    .bind(request.account_id)
    .bind(request.name.trim())
    .bind(request.stage.unwrap_or_else(|| "prospecting".to_string()))
    .bind(request.amount)
    .fetch_one(pool)
    .await?;

    Ok(opportunity)
}

pub async fn update(
    pool: &PgPool,
    id: Uuid,
    tenant_id: Uuid,
    request: UpdateOpportunityRequest,
) -> Result<Opportunity, ApiError> {
    if let Some(account_id) = request.account_id {
        check_account_link(pool, account_id, tenant_id).await?;
    }

    let opportunity = sqlx::query_as::<_, Opportunity>(
        r#"
        UPDATE opportunities SET
            name = COALESCE($3, name),
            stage = COALESCE($4, stage),
            amount = COALESCE($5, amount),
            account_id = COALESCE($6, account_id),
            updated_at = now()
        WHERE id = $1 AND tenant_id = $2
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(tenant_id)
    .bind(request.name)
    .bind(request.stage)
    .bind(request.amount)
    .bind(request.account_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| ApiError::not_found("Record not found"))?;

    Ok(opportunity)
}

pub async fn delete(pool: &PgPool, id: Uuid, tenant_id: Uuid) -> Result<bool, ApiError> {
    Ok(repository(pool.clone()).delete(id, tenant_id).await?)
}

/// A linked account must exist inside the caller's tenant; a cross-tenant id
/// reads the same as a nonexistent one.
async fn check_account_link(pool: &PgPool, account_id: Uuid, tenant_id: Uuid) -> Result<(), ApiError> {
    let exists: Option<Uuid> =
        sqlx::query_scalar("SELECT id FROM accounts WHERE id = $1 AND tenant_id = $2")
            .bind(account_id)
            .bind(tenant_id)
            .fetch_optional(pool)
            .await?;

    if exists.is_none() {
        return Err(ApiError::unprocessable_entity("Linked account does not exist"));
    }
    Ok(())
}
