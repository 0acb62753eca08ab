use serde::Deserialize;
use sqlx::PgPool;
use std::str::FromStr;
use uuid::Uuid;

use crate::auth::password;
use crate::database::models::Identity;
use crate::error::ApiError;
use crate::permissions::Role;

const UNIQUE_VIOLATION: &str = "23505";

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub name: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateIdentityRequest {
    pub email: String,
    pub name: String,
    pub role: String,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateIdentityRequest {
    pub name: Option<String>,
    pub role: Option<String>,
    pub disabled: Option<bool>,
}

/// Load the active identity for a verified token subject. `None` covers both
/// a deleted subject and a soft-disabled one; the caller maps it to an
/// authentication failure.
pub async fn resolve(pool: &PgPool, subject_id: Uuid) -> Result<Option<Identity>, ApiError> {
    let identity = sqlx::query_as::<_, Identity>(
        "SELECT * FROM identities WHERE id = $1 AND disabled_at IS NULL",
    )
    .bind(subject_id)
    .fetch_optional(pool)
    .await?;

    Ok(identity)
}

pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Identity>, ApiError> {
    let identity = sqlx::query_as::<_, Identity>(
        "SELECT * FROM identities WHERE email = $1 AND disabled_at IS NULL",
    )
    .bind(email)
    .fetch_optional(pool)
    .await?;

    Ok(identity)
}

/// Self-service signup: always creates a member with no tenant binding.
pub async fn register(pool: &PgPool, request: RegisterRequest) -> Result<Identity, ApiError> {
    if request.email.trim().is_empty() || !request.email.contains('@') {
        return Err(ApiError::bad_request("A valid email is required"));
    }
    if request.password.len() < 8 {
        return Err(ApiError::bad_request("Password must be at least 8 characters"));
    }

    let hash = password::hash_password(&request.password).map_err(|e| {
        tracing::error!("password hashing failed: {}", e);
        ApiError::internal_server_error("Failed to create identity")
    })?;

    insert_identity(pool, &request.email, &request.name, Role::Member, Some(hash)).await
}

/// Administrative provisioning: caller picks the role, password is optional
/// (provider-managed identities carry none).
pub async fn create(pool: &PgPool, request: CreateIdentityRequest) -> Result<Identity, ApiError> {
    let role = parse_role(&request.role)?;

    let hash = match &request.password {
        Some(p) => Some(password::hash_password(p).map_err(|e| {
            tracing::error!("password hashing failed: {}", e);
            ApiError::internal_server_error("Failed to create identity")
        })?),
        None => None,
    };

    insert_identity(pool, &request.email, &request.name, role, hash).await
}

pub async fn update(
    pool: &PgPool,
    id: Uuid,
    request: UpdateIdentityRequest,
) -> Result<Identity, ApiError> {
    // Validate the role string before touching the row
    let role = match &request.role {
        Some(r) => Some(parse_role(r)?),
        None => None,
    };

    let identity = sqlx::query_as::<_, Identity>(
        r#"
        UPDATE identities SET
            name = COALESCE($2, name),
            role = COALESCE($3, role),
            disabled_at = CASE
                WHEN $4::boolean IS NULL THEN disabled_at
                WHEN $4 THEN COALESCE(disabled_at, now())
                ELSE NULL
            END,
            updated_at = now()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(request.name)
    .bind(role.map(|r| r.to_string()))
    .bind(request.disabled)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| ApiError::not_found("Identity not found"))?;

    Ok(identity)
}

async fn insert_identity(
    pool: &PgPool,
    email: &str,
    name: &str,
    role: Role,
    password_hash: Option<String>,
) -> Result<Identity, ApiError> {
    let result = sqlx::query_as::<_, Identity>(
        r#"
        INSERT INTO identities (id, email, name, role, password_hash)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(email.trim().to_lowercase())
    .bind(name)
    .bind(role.to_string())
    .bind(password_hash)
    .fetch_one(pool)
    .await;

    match result {
        Ok(identity) => Ok(identity),
        Err(sqlx::Error::Database(db_err)) if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) => {
            Err(ApiError::conflict("An identity with this email already exists"))
        }
        Err(e) => Err(e.into()),
    }
}

fn parse_role(role: &str) -> Result<Role, ApiError> {
    Role::from_str(role)
        .map_err(|_| ApiError::unprocessable_entity(format!("unknown role '{}'", role)))
}
