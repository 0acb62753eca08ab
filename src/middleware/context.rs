use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::config;
use crate::database::models::Identity;
use crate::error::ApiError;
use crate::permissions::{self, PermissionRules, Requirement};
use crate::services::{grant_service, identity_service};
use crate::AppState;

use super::auth::AuthSubject;

/// At most one tenant per identity, read straight from the identity row.
/// Never created or inferred here.
#[derive(Clone, Debug)]
pub struct TenantContext {
    pub tenant_id: Option<Uuid>,
}

impl TenantContext {
    /// Fail closed: an identity without a tenant gets 403 on tenant-scoped
    /// operations, never blanket access.
    pub fn require(&self) -> Result<Uuid, ApiError> {
        self.tenant_id
            .ok_or_else(|| permissions::AccessError::TenantRequired.into())
    }
}

/// Everything a protected route needs to decide and scope an operation,
/// passed as an ordinary extension rather than ambient state.
#[derive(Clone, Debug)]
pub struct RequestContext {
    pub identity: Identity,
    pub tenant: TenantContext,
    pub rules: Option<PermissionRules>,
}

impl RequestContext {
    /// Evaluate a route's declared requirement. Called before any business
    /// logic; a deny logs the subject, route category, and missing actions.
    pub fn authorize(&self, requirement: &Requirement) -> Result<(), ApiError> {
        permissions::evaluate(
            self.identity.parsed_role(),
            &self.identity.email,
            self.rules.as_ref(),
            requirement,
            &config::config().security.bypass_emails,
        )
        .map_err(|e| {
            tracing::warn!(
                subject = %self.identity.id,
                requirement = %requirement,
                "access denied"
            );
            e.into()
        })
    }
}

/// Identity resolver + tenant binder.
///
/// Loads the canonical identity row for the verified subject id and attaches
/// the tenant context and grant rules. Role and tenant binding always come
/// from the database, never from token claims, so a revoked role takes
/// effect on the next request even for tokens issued earlier.
pub async fn resolve_context_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let subject = request
        .extensions()
        .get::<AuthSubject>()
        .cloned()
        .ok_or_else(|| ApiError::internal_server_error("Authentication must run before context resolution"))?;

    // A deleted or disabled subject is an authentication failure, with the
    // same client message as a bad token.
    let identity = identity_service::resolve(&state.pool, subject.subject_id)
        .await?
        .ok_or_else(|| {
            tracing::warn!(subject = %subject.subject_id, "token subject no longer resolves to an active identity");
            ApiError::unauthorized("Invalid or expired token")
        })?;

    let rules = grant_service::fetch_rules(&state.pool, identity.id).await?;

    let tenant = TenantContext {
        tenant_id: identity.tenant_id,
    };

    request.extensions_mut().insert(RequestContext {
        identity,
        tenant,
        rules,
    });

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tenant_required_fails_closed() {
        let ctx = TenantContext { tenant_id: None };
        let err = ctx.require().unwrap_err();
        assert_eq!(err.status_code(), axum::http::StatusCode::FORBIDDEN);
    }

    #[test]
    fn bound_tenant_is_returned() {
        let id = Uuid::new_v4();
        let ctx = TenantContext { tenant_id: Some(id) };
        assert_eq!(ctx.require().unwrap(), id);
    }
}
