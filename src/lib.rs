use axum::routing::{get, post, put};
use axum::Router;
use serde_json::{json, Value};
use sqlx::PgPool;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub mod auth;
pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod permissions;
pub mod services;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
}

pub fn app(state: AppState) -> Router {
    Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(health))
        .merge(auth_public_routes())
        // Protected API behind the full pipeline
        .merge(protected_routes(state.clone()))
        // Global middleware
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn auth_public_routes() -> Router<AppState> {
    use handlers::public::auth;

    Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
}

/// Every route in this subtree goes through the same fixed pipeline: bearer
/// token verification, then identity/tenant/grant resolution. Permission
/// requirements are declared per handler and evaluated before any business
/// logic runs.
fn protected_routes(state: AppState) -> Router<AppState> {
    use axum::middleware::{from_fn, from_fn_with_state};
    use handlers::protected::{accounts, admin, auth, opportunities, tenants};

    Router::new()
        // Session introspection
        .route("/api/auth/whoami", get(auth::whoami))
        // Tenant self-service
        .route("/api/tenants", post(tenants::create))
        .route("/api/tenants/current", get(tenants::current))
        // Tenant-scoped resources
        .route("/api/accounts", get(accounts::list).post(accounts::create))
        .route(
            "/api/accounts/:id",
            get(accounts::get).put(accounts::update).delete(accounts::delete),
        )
        .route(
            "/api/opportunities",
            get(opportunities::list).post(opportunities::create),
        )
        .route(
            "/api/opportunities/:id",
            get(opportunities::get)
                .put(opportunities::update)
                .delete(opportunities::delete),
        )
        // Administrative surfaces, same pipeline with admin-level requirements
        .route("/api/admin/identities", post(admin::identities::create))
        .route("/api/admin/identities/:id", put(admin::identities::update))
        .route(
            "/api/admin/grants/:identity_id",
            get(admin::grants::get).put(admin::grants::put),
        )
        // Layer order: auth runs first, then context resolution
        .route_layer(from_fn_with_state(state, middleware::resolve_context_middleware))
        .route_layer(from_fn(middleware::jwt_auth_middleware))
}

async fn root() -> axum::response::Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    axum::response::Json(json!({
        "success": true,
        "data": {
            "name": "Opsgate API",
            "version": version,
            "description": "Multi-tenant business operations API with a permission-gated request pipeline",
            "endpoints": {
                "home": "/ (public)",
                "health": "/health (public)",
                "public_auth": "/auth/register, /auth/login (public - token acquisition)",
                "auth": "/api/auth/whoami (protected)",
                "tenants": "/api/tenants, /api/tenants/current (protected)",
                "accounts": "/api/accounts[/:id] (protected)",
                "opportunities": "/api/opportunities[/:id] (protected)",
                "admin": "/api/admin/identities[/:id], /api/admin/grants/:identity_id (protected, admin)",
            }
        }
    }))
}

async fn health(
    axum::extract::State(state): axum::extract::State<AppState>,
) -> impl axum::response::IntoResponse {
    let now = chrono::Utc::now();

    match database::manager::health_check(&state.pool).await {
        Ok(_) => (
            axum::http::StatusCode::OK,
            axum::response::Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": "ok"
                }
            })),
        ),
        Err(e) => (
            axum::http::StatusCode::SERVICE_UNAVAILABLE,
            axum::response::Json(json!({
                "success": false,
                "error": "database unavailable",
                "data": {
                    "status": "degraded",
                    "timestamp": now,
                    "database_error": e.to_string()
                }
            })),
        ),
    }
}
