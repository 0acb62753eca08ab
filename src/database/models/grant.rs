use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

use crate::permissions::PermissionRules;

/// One row per identity; `rules` maps resource category to allowed actions.
/// Absence of a row means deny for every category.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PermissionGrant {
    pub identity_id: Uuid,
    pub rules: Json<PermissionRules>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
