use serde::Deserialize;
use sqlx::types::Json;
use sqlx::PgPool;
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::database::models::PermissionGrant;
use crate::error::ApiError;
use crate::permissions::{self, PermissionRules};

#[derive(Debug, Deserialize)]
pub struct PutGrantRequest {
    /// category -> action strings; validated against the closed enums before
    /// anything is written.
    pub rules: BTreeMap<String, Vec<String>>,
}

/// Rules for the permission evaluator; `None` when the identity has no grant
/// row, which the evaluator treats as deny-everything.
pub async fn fetch_rules(pool: &PgPool, identity_id: Uuid) -> Result<Option<PermissionRules>, ApiError> {
    let rules: Option<Json<PermissionRules>> =
        sqlx::query_scalar("SELECT rules FROM permission_grants WHERE identity_id = $1")
            .bind(identity_id)
            .fetch_optional(pool)
            .await?;

    Ok(rules.map(|r| r.0))
}

pub async fn get(pool: &PgPool, identity_id: Uuid) -> Result<PermissionGrant, ApiError> {
    sqlx::query_as::<_, PermissionGrant>("SELECT * FROM permission_grants WHERE identity_id = $1")
        .bind(identity_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| ApiError::not_found("No permission grant for this identity"))
}

/// Replace an identity's grant. Parsing happens before the write, so an
/// invalid action or category string leaves any existing grant untouched.
pub async fn put(
    pool: &PgPool,
    identity_id: Uuid,
    request: PutGrantRequest,
) -> Result<PermissionGrant, ApiError> {
    let rules = permissions::parse_rules(&request.rules)?;

    let mut tx = pool.begin().await?;

    let exists: Option<Uuid> = sqlx::query_scalar("SELECT id FROM identities WHERE id = $1")
        .bind(identity_id)
        .fetch_optional(&mut *tx)
        .await?;
    if exists.is_none() {
        return Err(ApiError::not_found("Identity not found"));
    }

    let grant = sqlx::query_as::<_, PermissionGrant>(
        r#"
        INSERT INTO permission_grants (identity_id, rules)
        VALUES ($1, $2)
        ON CONFLICT (identity_id)
        DO UPDATE SET rules = EXCLUDED.rules, updated_at = now()
        RETURNING *
        "#,
    )
    .bind(identity_id)
    .bind(Json(rules))
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    tracing::info!(identity = %identity_id, "permission grant replaced");
    Ok(grant)
}
