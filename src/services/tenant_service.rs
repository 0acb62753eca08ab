use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::models::Tenant;
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct CreateTenantRequest {
    pub name: String,
    pub address: Option<String>,
    pub contact_email: Option<String>,
}

/// Create a tenant owned by the calling identity and bind the identity to it.
///
/// Runs in one transaction with the identity row locked, so two concurrent
/// attempts by the same identity cannot both succeed. An identity that is
/// already tenant-bound gets a conflict, never a silent second tenant.
pub async fn create(
    pool: &PgPool,
    owner_id: Uuid,
    request: CreateTenantRequest,
) -> Result<Tenant, ApiError> {
    if request.name.trim().is_empty() {
        return Err(ApiError::bad_request("Tenant name is required"));
    }

    let mut tx = pool.begin().await?;

    let current_tenant: Option<Uuid> =
        sqlx::query_scalar("SELECT tenant_id FROM identities WHERE id = $1 FOR UPDATE")
            .bind(owner_id)
            .fetch_one(&mut *tx)
            .await?;

    if current_tenant.is_some() {
        return Err(ApiError::conflict("Identity is already associated with a tenant"));
    }

    let tenant = sqlx::query_as::<_, Tenant>(
        r#"
        INSERT INTO tenants (id, owner_id, name, address, contact_email)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(owner_id)
    .bind(request.name.trim())
    .bind(request.address)
    .bind(request.contact_email)
    .fetch_one(&mut *tx)
    .await?;

    sqlx::query("UPDATE identities SET tenant_id = $1, updated_at = now() WHERE id = $2")
        .bind(tenant.id)
        .bind(owner_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    tracing::info!(tenant = %tenant.id, owner = %owner_id, "tenant created");
    Ok(tenant)
}

pub async fn get(pool: &PgPool, tenant_id: Uuid) -> Result<Tenant, ApiError> {
    sqlx::query_as::<_, Tenant>("SELECT * FROM tenants WHERE id = $1")
        .bind(tenant_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| ApiError::not_found("Tenant not found"))
}
