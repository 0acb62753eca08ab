use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::models::Account;
use crate::database::repository::{ListFilter, Page, ScopedRepository};
use crate::error::ApiError;

pub fn repository(pool: PgPool) -> ScopedRepository<Account> {
    ScopedRepository::new("accounts", "name", pool)
}

/// Create payload. Deliberately has no tenant_id field; the row is stamped
/// with the caller's bound tenant and any client-supplied value is ignored.
#[derive(Debug, Deserialize)]
pub struct CreateAccountRequest {
    pub name: String,
    pub industry: Option<String>,
    pub website: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateAccountRequest {
    pub name: Option<String>,
    pub industry: Option<String>,
    pub website: Option<String>,
}

pub async fn list(
    pool: &PgPool,
    tenant_id: Uuid,
    filter: &ListFilter,
    page: &Page,
) -> Result<(Vec<Account>, i64), ApiError> {
    Ok(repository(pool.clone()).list(tenant_id, filter, page).await?)
}

pub async fn get(pool: &PgPool, id: Uuid, tenant_id: Uuid) -> Result<Account, ApiError> {
    Ok(repository(pool.clone()).get_404(id, tenant_id).await?)
}

pub async fn create(
    pool: &PgPool,
    tenant_id: Uuid,
    request: CreateAccountRequest,
) -> Result<Account, ApiError> {
    if request.name.trim().is_empty() {
        return Err(ApiError::bad_request("Account name is required"));
    }

    let account = sqlx::query_as::<_, Account>(
        r#"
        INSERT INTO accounts (id, tenant_id, name, industry, website)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(tenant_id)
    .bind(request.name.trim())
    .bind(request.industry)
    .bind(request.website)
    .fetch_one(pool)
    .await?;

    Ok(account)
}

pub async fn update(
    pool: &PgPool,
    id: Uuid,
    tenant_id: Uuid,
    request: UpdateAccountRequest,
) -> Result<Account, ApiError> {
    let account = sqlx::query_as::<_, Account>(
        r#"
        UPDATE accounts SET
            name = COALESCE($3, name),
            industry = COALESCE($4, industry),
            website = COALESCE($5, website),
            updated_at = now()
        WHERE id = $1 AND tenant_id = $2
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(tenant_id)
    .bind(request.name)
    .bind(request.industry)
    .bind(request.website)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| ApiError::not_found("Record not found"))?;

    Ok(account)
}

pub async fn delete(pool: &PgPool, id: Uuid, tenant_id: Uuid) -> Result<bool, ApiError> {
    Ok(repository(pool.clone()).delete(id, tenant_id).await?)
}
