use opsgate_api::{app, config, database, AppState};

#[tokio::main]
async fn main() {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt::init();

    // Initialize configuration (this loads the config singleton)
    let config = config::config();
    tracing::info!("Starting Opsgate API in {:?} mode", config.environment);

    // Startup validation: a missing secret makes every authenticated request
    // a 500, so make the broken deployment loud immediately.
    if config.security.jwt_secret.is_empty() {
        tracing::error!("JWT_SECRET is not set; authenticated requests will fail");
    }
    if !config.security.bypass_emails.is_empty() {
        tracing::warn!(
            "permission bypass enabled for {} email(s)",
            config.security.bypass_emails.len()
        );
    }

    let pool = database::manager::connect_lazy()
        .unwrap_or_else(|e| panic!("failed to create database pool: {}", e));

    if let Err(e) = database::manager::health_check(&pool).await {
        tracing::warn!("database not reachable at startup: {}", e);
    }

    let app = app(AppState { pool });

    // Allow tests or deployments to override port via env
    let port = std::env::var("OPSGATE_API_PORT")
        .ok()
        .or_else(|| std::env::var("PORT").ok())
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(3000);

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind {}: {}", bind_addr, e));

    tracing::info!("Opsgate API listening on http://{}", bind_addr);

    axum::serve(listener, app).await.expect("server");
}
