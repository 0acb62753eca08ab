use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::permissions::Role;

/// Canonical user record. The role column is TEXT at the storage layer; every
/// write path validates it against the closed `Role` enum, and readers parse
/// it with unknown strings treated as no role at all.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Identity {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub role: String,
    pub tenant_id: Option<Uuid>,
    #[serde(skip_serializing, default)]
    pub password_hash: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Soft-disable marker; identities are never hard-deleted in normal flow.
    pub disabled_at: Option<DateTime<Utc>>,
}

impl Identity {
    pub fn parsed_role(&self) -> Option<Role> {
        self.role.parse().ok()
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled_at.is_some()
    }
}
