mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

#[tokio::test]
async fn health_endpoint_responds() -> Result<()> {
    let server = common::spawn_server().await?;

    let res = server.client.get(server.url("/health")).send().await?;
    assert_eq!(res.status(), StatusCode::OK);

    let body: Value = res.json().await?;
    assert_eq!(body["data"]["status"], "ok");
    Ok(())
}

#[tokio::test]
async fn root_lists_endpoints_without_auth() -> Result<()> {
    let server = common::spawn_server().await?;

    let body: Value = server.client.get(server.url("/")).send().await?.json().await?;
    assert_eq!(body["success"], true);
    assert!(body["data"]["endpoints"]["login"].is_string());
    Ok(())
}

#[tokio::test]
async fn login_returns_bearer_token_and_roles() -> Result<()> {
    let server = common::spawn_server().await?;

    let res = server
        .client
        .post(server.url("/auth/login"))
        .json(&json!({ "username": "testuser", "password": "testpass123" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let body: Value = res.json().await?;
    assert_eq!(body["data"]["token_type"], "Bearer");
    assert_eq!(body["data"]["user"]["roles"], json!(["portfolio_manager"]));
    assert!(!body["data"]["access_token"].as_str().unwrap_or_default().is_empty());
    Ok(())
}

#[tokio::test]
async fn login_rejects_wrong_password_and_unknown_user_alike() -> Result<()> {
    let server = common::spawn_server().await?;

    for creds in [
        json!({ "username": "admin", "password": "nope" }),
        json!({ "username": "ghost", "password": "admin123" }),
    ] {
        let res = server.client.post(server.url("/auth/login")).json(&creds).send().await?;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        let body: Value = res.json().await?;
        assert_eq!(body["message"], "Bad username or password");
    }
    Ok(())
}

#[tokio::test]
async fn login_requires_both_fields() -> Result<()> {
    let server = common::spawn_server().await?;

    let res = server
        .client
        .post(server.url("/auth/login"))
        .json(&json!({ "username": "admin" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn protected_routes_require_a_token() -> Result<()> {
    let server = common::spawn_server().await?;

    let res = server.client.get(server.url("/api/clients")).send().await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let (status, _) = server.get("/api/clients", "not-a-jwt").await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn whoami_echoes_the_token_principal() -> Result<()> {
    let server = common::spawn_server().await?;
    let token = server.admin_token().await?;

    let (status, body) = server.get("/api/auth/whoami", &token).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["username"], "admin");
    assert_eq!(body["data"]["roles"], json!(["admin"]));
    Ok(())
}
