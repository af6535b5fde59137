mod common;

use common::*;
use serde_json::json;

async fn start_conversation(ctx: &TestContext, token: &str, message: &str) -> String {
    let response = ctx
        .server
        .post("/api/chat")
        .authorization_bearer(token)
        .json(&json!({"message": message}))
        .await;
    let events = parse_events(&response.text());
    events[0]["conversationId"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_health_needs_no_auth() {
    let ctx = setup();
    let response = ctx.server.get("/health").await;
    response.assert_status_ok();
    assert_eq!(response.json::<serde_json::Value>()["status"], "ok");
}

#[tokio::test]
async fn test_conversations_are_private() {
    let ctx = setup();
    let id = start_conversation(&ctx, ALICE_TOKEN, "Alice's question").await;

    let bob_list = ctx
        .server
        .get("/api/conversations")
        .authorization_bearer(BOB_TOKEN)
        .await
        .json::<serde_json::Value>();
    assert!(bob_list["data"].as_array().unwrap().is_empty());

    let response = ctx
        .server
        .get(&format!("/api/conversations/{id}"))
        .authorization_bearer(BOB_TOKEN)
        .await;
    assert_eq!(response.status_code(), 404);

    let response = ctx
        .server
        .delete(&format!("/api/conversations/{id}"))
        .authorization_bearer(BOB_TOKEN)
        .await;
    assert_eq!(response.status_code(), 404);
}

#[tokio::test]
async fn test_long_message_title_is_truncated() {
    let ctx = setup();
    let message = "x".repeat(80);
    start_conversation(&ctx, ALICE_TOKEN, &message).await;

    let list = ctx
        .server
        .get("/api/conversations")
        .authorization_bearer(ALICE_TOKEN)
        .await
        .json::<serde_json::Value>();
    assert_eq!(list["data"][0]["title"], format!("{}...", "x".repeat(50)));
}

#[tokio::test]
async fn test_rename_and_delete_conversation() {
    let ctx = setup();
    let id = start_conversation(&ctx, ALICE_TOKEN, "Original").await;

    let response = ctx
        .server
        .patch(&format!("/api/conversations/{id}"))
        .authorization_bearer(ALICE_TOKEN)
        .json(&json!({"title": "Renamed"}))
        .await;
    response.assert_status_ok();
    assert_eq!(response.json::<serde_json::Value>()["title"], "Renamed");

    let response = ctx
        .server
        .patch(&format!("/api/conversations/{id}"))
        .authorization_bearer(ALICE_TOKEN)
        .json(&json!({"title": "  "}))
        .await;
    assert_eq!(response.status_code(), 400);

    let response = ctx
        .server
        .delete(&format!("/api/conversations/{id}"))
        .authorization_bearer(ALICE_TOKEN)
        .await;
    response.assert_status_ok();
    assert_eq!(response.json::<serde_json::Value>()["deleted"], true);

    let response = ctx
        .server
        .get(&format!("/api/conversations/{id}"))
        .authorization_bearer(ALICE_TOKEN)
        .await;
    assert_eq!(response.status_code(), 404);
}

#[tokio::test]
async fn test_search_usage_counts_web_searches() {
    let ctx = setup_with(TestOptions {
        monthly_quota: 10,
        ..Default::default()
    });

    ctx.server
        .post("/api/chat")
        .authorization_bearer(ALICE_TOKEN)
        .json(&json!({"message": "Look it up", "enableSearch": true}))
        .await
        .assert_status_ok();

    let usage = ctx
        .server
        .get("/api/search-usage")
        .authorization_bearer(ALICE_TOKEN)
        .await
        .json::<serde_json::Value>();
    assert_eq!(usage["used"], 1);
    assert_eq!(usage["limit"], 10);
    assert_eq!(usage["remaining"], 9);

    let other = ctx
        .server
        .get("/api/search-usage")
        .authorization_bearer(BOB_TOKEN)
        .await
        .json::<serde_json::Value>();
    assert_eq!(other["used"], 0);
}
