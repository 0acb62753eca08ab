use axum::Extension;
use serde_json::{json, Value};

use crate::middleware::{ApiResponse, ApiResult, AuthSubject, RequestContext};

/// GET /api/auth/whoami - current identity, tenant binding, effective grant
/// rules, and token expiry. No category requirement: an identity may always
/// inspect its own context.
pub async fn whoami(
    Extension(subject): Extension<AuthSubject>,
    Extension(ctx): Extension<RequestContext>,
) -> ApiResult<Value> {
    Ok(ApiResponse::success(json!({
        "identity": ctx.identity,
        "tenant_id": ctx.tenant.tenant_id,
        "rules": ctx.rules,
        "token_expires_at": subject.expires_at,
    })))
}
