//! End-to-end tenant isolation and permission scenarios.
//!
//! These run only when TEST_DATABASE_URL points at a Postgres instance the
//! test may freely reset; without it they skip.

mod common;

use anyhow::Result;
use axum::http::StatusCode;
use serde_json::json;
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

use opsgate_api::{app, AppState};

#[tokio::test]
async fn tenant_isolation_and_grants_end_to_end() -> Result<()> {
    let Ok(url) = std::env::var("TEST_DATABASE_URL") else {
        eprintln!("TEST_DATABASE_URL not set; skipping");
        return Ok(());
    };
    common::setup_env();

    let pool = PgPoolOptions::new().max_connections(5).connect(&url).await?;
    common::apply_schema(&pool).await?;
    let app = app(AppState { pool: pool.clone() });

    // Two owners register and each creates a tenant
    let alice = common::register(&app, "alice@example.com").await?;
    let bob = common::register(&app, "bob@example.com").await?;

    let (status, body) = common::send(
        &app,
        "POST",
        "/api/tenants",
        Some(&alice.token),
        Some(json!({ "name": "Alpha Corp" })),
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["owner_id"], json!(alice.id.to_string()));

    let (status, _) = common::send(
        &app,
        "POST",
        "/api/tenants",
        Some(&bob.token),
        Some(json!({ "name": "Beta LLC" })),
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED);

    // A second tenant by the same identity conflicts, never a silent second
    let (status, _) = common::send(
        &app,
        "POST",
        "/api/tenants",
        Some(&alice.token),
        Some(json!({ "name": "Alpha Again" })),
    )
    .await?;
    assert_eq!(status, StatusCode::CONFLICT);

    // Fresh identities have no grant row: default-deny on resources
    let (status, _) = common::send(&app, "GET", "/api/accounts", Some(&alice.token), None).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Promote both owners to admin (the bypass role) directly in the database
    for id in [alice.id, bob.id] {
        sqlx::query("UPDATE identities SET role = 'admin' WHERE id = $1")
            .bind(id)
            .execute(&pool)
            .await?;
    }

    // Each admin creates an account in their own tenant
    let (status, body) = common::send(
        &app,
        "POST",
        "/api/accounts",
        Some(&alice.token),
        Some(json!({ "name": "Globex", "industry": "manufacturing" })),
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED);
    let alice_account: Uuid = body["data"]["id"].as_str().unwrap().parse()?;

    let (status, _) = common::send(
        &app,
        "POST",
        "/api/accounts",
        Some(&bob.token),
        Some(json!({ "name": "Initech" })),
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED);

    // Cross-tenant read is a plain 404, indistinguishable from absence
    let (status, body) = common::send(
        &app,
        "GET",
        &format!("/api/accounts/{}", alice_account),
        Some(&bob.token),
        None,
    )
    .await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], json!("NOT_FOUND"));

    // The owner still sees it, and the list stays tenant-scoped
    let (status, body) = common::send(
        &app,
        "GET",
        &format!("/api/accounts/{}", alice_account),
        Some(&alice.token),
        None,
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], json!("Globex"));

    let (_, body) = common::send(&app, "GET", "/api/accounts", Some(&alice.token), None).await?;
    assert_eq!(body["data"]["total"], json!(1));

    // A member with a view-only grant can list but not create
    let carol = common::register(&app, "carol@example.com").await?;
    sqlx::query("UPDATE identities SET tenant_id = (SELECT tenant_id FROM identities WHERE id = $1) WHERE id = $2")
        .bind(alice.id)
        .bind(carol.id)
        .execute(&pool)
        .await?;

    let (status, _) = common::send(
        &app,
        "PUT",
        &format!("/api/admin/grants/{}", carol.id),
        Some(&alice.token),
        Some(json!({ "rules": { "accounts": ["view"] } })),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = common::send(&app, "GET", "/api/accounts", Some(&carol.token), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["items"][0]["name"], json!("Globex"));

    let (status, _) = common::send(
        &app,
        "POST",
        "/api/accounts",
        Some(&carol.token),
        Some(json!({ "name": "Sneaky" })),
    )
    .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Unknown action strings reject the write and leave the grant unchanged
    let (status, _) = common::send(
        &app,
        "PUT",
        &format!("/api/admin/grants/{}", carol.id),
        Some(&alice.token),
        Some(json!({ "rules": { "accounts": ["view", "superuser"] } })),
    )
    .await?;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, body) = common::send(
        &app,
        "GET",
        &format!("/api/admin/grants/{}", carol.id),
        Some(&alice.token),
        None,
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["rules"]["accounts"], json!(["view"]));

    // Delete is idempotent: the second call is a miss, not an error
    let (status, _) = common::send(
        &app,
        "DELETE",
        &format!("/api/accounts/{}", alice_account),
        Some(&alice.token),
        None,
    )
    .await?;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = common::send(
        &app,
        "DELETE",
        &format!("/api/accounts/{}", alice_account),
        Some(&alice.token),
        None,
    )
    .await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    Ok(())
}
