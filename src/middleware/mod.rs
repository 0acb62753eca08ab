pub mod auth;
pub mod context;
pub mod response;

pub use auth::{jwt_auth_middleware, AuthSubject};
pub use context::{resolve_context_middleware, RequestContext, TenantContext};
pub use response::{ApiResponse, ApiResult, Paginated};
