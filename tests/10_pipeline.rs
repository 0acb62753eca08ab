mod common;

use anyhow::Result;
use axum::http::StatusCode;
use uuid::Uuid;

#[tokio::test]
async fn root_endpoint_responds() -> Result<()> {
    let app = common::test_app();
    let (status, body) = common::send(&app, "GET", "/", None, None).await?;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], serde_json::json!(true));
    Ok(())
}

#[tokio::test]
async fn health_endpoint_responds() -> Result<()> {
    let app = common::test_app();
    let (status, body) = common::send(&app, "GET", "/health", None, None).await?;

    // Without a reachable database this is a degraded 503; with one it is 200
    assert!(
        status == StatusCode::OK || status == StatusCode::SERVICE_UNAVAILABLE,
        "unexpected status: {}",
        status
    );
    assert!(body.is_object());
    Ok(())
}

#[tokio::test]
async fn missing_authorization_header_is_401() -> Result<()> {
    let app = common::test_app();
    let (status, body) = common::send(&app, "GET", "/api/auth/whoami", None, None).await?;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], serde_json::json!("UNAUTHORIZED"));
    assert_eq!(body["success"], serde_json::json!(false));
    Ok(())
}

#[tokio::test]
async fn non_bearer_scheme_is_401() -> Result<()> {
    let app = common::test_app();
    let (status, _) =
        common::send(&app, "GET", "/api/auth/whoami", Some("Basic dXNlcjpwYXNz"), None).await?;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn garbage_token_is_401_with_generic_message() -> Result<()> {
    let app = common::test_app();
    let (status, body) =
        common::send(&app, "GET", "/api/auth/whoami", Some("Bearer not.a.token"), None).await?;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    // The response must not reveal what was wrong with the token
    assert_eq!(body["message"], serde_json::json!("Invalid or expired token"));
    Ok(())
}

#[tokio::test]
async fn expired_token_is_401_with_the_same_message_as_malformed() -> Result<()> {
    let app = common::test_app();
    let expired = common::bearer_for(Uuid::new_v4(), -2);

    let (status, body) =
        common::send(&app, "GET", "/api/auth/whoami", Some(&expired), None).await?;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], serde_json::json!("Invalid or expired token"));
    Ok(())
}

#[tokio::test]
async fn token_signed_with_foreign_secret_is_401() -> Result<()> {
    let app = common::test_app();

    let claims = opsgate_api::auth::Claims::new(Uuid::new_v4(), chrono::Duration::hours(1));
    let token = opsgate_api::auth::issue(&claims, "some-other-service-secret").unwrap();

    let (status, _) = common::send(
        &app,
        "GET",
        "/api/auth/whoami",
        Some(&format!("Bearer {}", token)),
        None,
    )
    .await?;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn pipeline_rejects_before_any_route_logic() -> Result<()> {
    let app = common::test_app();

    // Every protected route rejects unauthenticated requests the same way,
    // including ones that would otherwise hit the database.
    for (method, uri) in [
        ("GET", "/api/accounts"),
        ("POST", "/api/accounts"),
        ("GET", "/api/opportunities"),
        ("POST", "/api/tenants"),
        ("PUT", "/api/admin/grants/00000000-0000-0000-0000-000000000000"),
    ] {
        let (status, _) = common::send(&app, method, uri, None, None).await?;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{} {}", method, uri);
    }
    Ok(())
}

#[tokio::test]
async fn unknown_route_is_404() -> Result<()> {
    let app = common::test_app();
    let (status, _) = common::send(&app, "GET", "/api/nope", None, None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}
