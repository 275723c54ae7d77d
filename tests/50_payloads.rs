mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::json;

#[tokio::test]
async fn stores_messages_and_lists_newest_first() -> Result<()> {
    let server = common::spawn_server().await?;
    let token = server.manager_token().await?;

    for message in ["first", "second"] {
        let (status, body) = server.post("/api/data", &token, json!({ "message": message })).await?;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["data"]["data"], message);
    }

    let (status, body) = server.get("/api/data", &token).await?;
    assert_eq!(status, StatusCode::OK);
    let messages: Vec<&str> = body["data"]
        .as_array()
        .map(|rows| rows.iter().filter_map(|p| p["data"].as_str()).collect())
        .unwrap_or_default();
    assert_eq!(messages, vec!["second", "first"]);
    Ok(())
}

#[tokio::test]
async fn empty_message_is_rejected() -> Result<()> {
    let server = common::spawn_server().await?;
    let token = server.admin_token().await?;

    let (status, body) = server.post("/api/data", &token, json!({ "message": "  " })).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["field_errors"]["message"].is_string());

    let (status, _) = server.post("/api/data", &token, json!({})).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn payloads_need_a_token_and_the_capability() -> Result<()> {
    let server = common::spawn_server().await?;

    let res = server.client.get(server.url("/api/data")).send().await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let admin = server.admin_token().await?;
    server
        .put(
            "/api/permissions/portfolio_manager/PayloadsViewSet",
            &admin,
            json!({ "can_read": true, "can_write": false }),
        )
        .await?;

    let manager = server.manager_token().await?;
    let (status, _) = server.post("/api/data", &manager, json!({ "message": "hi" })).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    Ok(())
}
