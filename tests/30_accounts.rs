mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::json;

#[tokio::test]
async fn creates_account_with_normalized_money() -> Result<()> {
    let server = common::spawn_server().await?;
    let token = server.admin_token().await?;

    let (status, body) = server
        .post(
            "/api/accounts",
            &token,
            json!({ "client_id": 2, "external_ref": "T-900", "market_value": "75000.5" }),
        )
        .await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["market_value"], "75000.50");
    assert_eq!(body["data"]["status"], "Open");

    let (_, body) = server.get("/api/clients/high-value", &token).await?;
    assert_eq!(body["data"].as_array().map(Vec::len), Some(2));
    Ok(())
}

#[tokio::test]
async fn rejects_invalid_market_values() -> Result<()> {
    let server = common::spawn_server().await?;
    let token = server.admin_token().await?;

    for value in [json!("-1"), json!("1.005"), json!("abc"), json!(null)] {
        let (status, body) = server
            .post("/api/accounts", &token, json!({ "client_id": 1, "market_value": value }))
            .await?;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", value);
        assert!(body["field_errors"]["market_value"].is_string());
    }
    Ok(())
}

#[tokio::test]
async fn account_for_missing_client_is_not_found() -> Result<()> {
    let server = common::spawn_server().await?;
    let token = server.admin_token().await?;

    let (status, _) = server
        .post("/api/accounts", &token, json!({ "client_id": 42, "market_value": 10 }))
        .await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = server.get("/api/accounts", &token).await?;
    assert_eq!(body["data"].as_array().map(Vec::len), Some(2));
    Ok(())
}

#[tokio::test]
async fn filters_accounts_by_client() -> Result<()> {
    let server = common::spawn_server().await?;
    let token = server.manager_token().await?;

    let (_, body) = server.get("/api/accounts?client_id=1", &token).await?;
    assert_eq!(body["data"].as_array().map(Vec::len), Some(2));

    let (_, body) = server.get("/api/accounts?client_id=2", &token).await?;
    assert_eq!(body["data"], json!([]));
    Ok(())
}

#[tokio::test]
async fn show_and_delete_account() -> Result<()> {
    let server = common::spawn_server().await?;
    let token = server.admin_token().await?;

    let (status, body) = server.get("/api/accounts/1", &token).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["external_ref"], "F12345");
    assert_eq!(body["data"]["market_value"], "150000.75");

    let (status, _) = server.delete("/api/accounts/1", &token).await?;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = server.get("/api/accounts/1", &token).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn portfolio_manager_cannot_write_accounts() -> Result<()> {
    let server = common::spawn_server().await?;
    let token = server.manager_token().await?;

    let (status, _) = server
        .post("/api/accounts", &token, json!({ "client_id": 1, "market_value": "1.00" }))
        .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = server.delete("/api/accounts/1", &token).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    Ok(())
}

#[tokio::test]
async fn malformed_account_body_is_a_json_bad_request() -> Result<()> {
    let server = common::spawn_server().await?;
    let token = server.admin_token().await?;

    for body in [json!({ "client_id": "one", "market_value": "1.00" }), json!({ "market_value": "1.00" })] {
        let (status, response) = server.post("/api/accounts", &token, body).await?;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(response["code"], "BAD_REQUEST");
    }

    let res = server
        .client
        .post(server.url("/api/accounts"))
        .bearer_auth(&token)
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn capability_is_checked_before_the_body() -> Result<()> {
    let server = common::spawn_server().await?;
    let token = server.manager_token().await?;

    let (status, body) = server
        .post("/api/accounts", &token, json!({ "client_id": "one" }))
        .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "FORBIDDEN");
    Ok(())
}
