mod common;

use common::*;
use inference_providers::{ResponseTemplate, SearchResult};
use serde_json::json;

#[tokio::test]
async fn test_chat_requires_bearer_token() {
    let ctx = setup();

    let response = ctx
        .server
        .post("/api/chat")
        .json(&json!({"message": "Hello"}))
        .await;
    assert_eq!(response.status_code(), 401);

    let response = ctx
        .server
        .post("/api/chat")
        .authorization_bearer("unknown")
        .json(&json!({"message": "Hello"}))
        .await;
    assert_eq!(response.status_code(), 401);
    assert_eq!(ctx.provider.call_count(), 0);
}

#[tokio::test]
async fn test_chat_stream_event_sequence() {
    let ctx = setup();
    ctx.provider
        .set_default_response(ResponseTemplate::new("Hello from the mock").with_read_size(5))
        .await;

    let response = ctx
        .server
        .post("/api/chat")
        .authorization_bearer(ALICE_TOKEN)
        .json(&json!({"message": "Hello there"}))
        .await;

    response.assert_status_ok();
    assert!(response
        .header("content-type")
        .to_str()
        .unwrap()
        .starts_with("text/event-stream"));

    let events = parse_events(&response.text());
    assert!(events[0]["conversationId"].is_string());
    assert_eq!(content_of(&events), "Hello from the mock");
    assert_eq!(events.last().unwrap(), &json!({"done": true}));
    assert_eq!(events.iter().filter(|e| e.get("done").is_some()).count(), 1);

    // The finished turn is stored under a title taken from the message
    let list = ctx
        .server
        .get("/api/conversations")
        .authorization_bearer(ALICE_TOKEN)
        .await
        .json::<serde_json::Value>();
    assert_eq!(list["data"].as_array().unwrap().len(), 1);
    assert_eq!(list["data"][0]["title"], "Hello there");

    let id = events[0]["conversationId"].as_str().unwrap();
    let detail = ctx
        .server
        .get(&format!("/api/conversations/{id}"))
        .authorization_bearer(ALICE_TOKEN)
        .await
        .json::<serde_json::Value>();
    let messages = detail["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0]["role"], "user");
    assert_eq!(messages[1]["role"], "assistant");
    assert_eq!(messages[1]["content"], "Hello from the mock");
}

#[tokio::test]
async fn test_chat_stream_reasoning_events() {
    let ctx = setup();
    ctx.provider
        .set_default_response(
            ResponseTemplate::new("The answer")
                .with_inline_reasoning("let me think")
                .with_read_size(3),
        )
        .await;

    let response = ctx
        .server
        .post("/api/chat")
        .authorization_bearer(ALICE_TOKEN)
        .json(&json!({"message": "Question"}))
        .await;

    let events = parse_events(&response.text());
    let reasoning: String = events
        .iter()
        .filter_map(|e| e.get("reasoning").and_then(|r| r.as_str()))
        .collect();
    assert_eq!(reasoning, "let me think");
    assert_eq!(content_of(&events), "The answer");
    assert!(!response.text().contains("<think>"));
}

#[tokio::test]
async fn test_mid_stream_failure_ends_with_error_then_done() {
    let ctx = setup();
    ctx.provider
        .set_default_response(ResponseTemplate::new("partial answer here").with_error_after(1))
        .await;

    let response = ctx
        .server
        .post("/api/chat")
        .authorization_bearer(ALICE_TOKEN)
        .json(&json!({"message": "Hi"}))
        .await;
    response.assert_status_ok();

    let events = parse_events(&response.text());
    let n = events.len();
    assert!(events[n - 2].get("error").is_some());
    assert_eq!(events[n - 1], json!({"done": true}));

    // Only the user message was stored
    let id = events[0]["conversationId"].as_str().unwrap();
    let detail = ctx
        .server
        .get(&format!("/api/conversations/{id}"))
        .authorization_bearer(ALICE_TOKEN)
        .await
        .json::<serde_json::Value>();
    assert_eq!(detail["messages"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_web_search_sources_event() {
    let ctx = setup();

    let response = ctx
        .server
        .post("/api/chat")
        .authorization_bearer(ALICE_TOKEN)
        .json(&json!({"message": "What is Rust?", "enableSearch": true, "searchResultCount": 3}))
        .await;

    let events = parse_events(&response.text());
    assert_eq!(events[1]["sources"][0]["url"], "https://www.rust-lang.org");
    assert_eq!(events[1]["searchUsageRemaining"], 99);

    let sent = ctx.provider.last_request().await.unwrap();
    assert_eq!(sent.search_results.unwrap().len(), 1);
}

#[tokio::test]
async fn test_exhausted_search_quota_is_429() {
    let ctx = setup_with(TestOptions {
        monthly_quota: 0,
        ..Default::default()
    });

    let response = ctx
        .server
        .post("/api/chat")
        .authorization_bearer(ALICE_TOKEN)
        .json(&json!({"message": "Search this", "enableSearch": true}))
        .await;

    assert_eq!(response.status_code(), 429);
    let body = response.json::<serde_json::Value>();
    assert!(body["error"]
        .as_str()
        .unwrap()
        .contains("resets on the 1st of next month"));
    assert_eq!(ctx.provider.call_count(), 0);
}

#[tokio::test]
async fn test_answer_engine_mode() {
    let ctx = setup_with(TestOptions {
        answer_records: vec![
            SearchResult {
                title: "Perplexity".to_string(),
                url: String::new(),
                content: "Paris is the capital of France.".to_string(),
            },
            SearchResult {
                title: "Paris".to_string(),
                url: "https://en.wikipedia.org/wiki/Paris".to_string(),
                content: String::new(),
            },
        ],
        ..Default::default()
    });

    let response = ctx
        .server
        .post("/api/chat")
        .authorization_bearer(ALICE_TOKEN)
        .json(&json!({"message": "Capital of France?", "searchMode": "answer_engine"}))
        .await;

    let events = parse_events(&response.text());
    assert_eq!(events.len(), 4);
    assert_eq!(
        events[1]["sources"][0]["url"],
        "https://en.wikipedia.org/wiki/Paris"
    );
    assert_eq!(content_of(&events), "Paris is the capital of France.");
    assert_eq!(events[3], json!({"done": true}));
    assert_eq!(ctx.provider.call_count(), 0);
}

#[tokio::test]
async fn test_continuing_foreign_conversation_is_404() {
    let ctx = setup();

    let response = ctx
        .server
        .post("/api/chat")
        .authorization_bearer(ALICE_TOKEN)
        .json(&json!({"message": "Mine"}))
        .await;
    let events = parse_events(&response.text());
    let id = events[0]["conversationId"].as_str().unwrap();

    let response = ctx
        .server
        .post("/api/chat")
        .authorization_bearer(BOB_TOKEN)
        .json(&json!({"message": "Not yours", "conversationId": id}))
        .await;
    assert_eq!(response.status_code(), 404);
    assert_eq!(response.json::<serde_json::Value>()["error"], "Chat not found");
}

#[tokio::test]
async fn test_invalid_requests_are_400() {
    let ctx = setup();

    let response = ctx
        .server
        .post("/api/chat")
        .authorization_bearer(ALICE_TOKEN)
        .json(&json!({"message": "   "}))
        .await;
    assert_eq!(response.status_code(), 400);

    let response = ctx
        .server
        .post("/api/chat")
        .authorization_bearer(ALICE_TOKEN)
        .json(&json!({"message": "Hi", "conversationId": "not-a-uuid"}))
        .await;
    assert_eq!(response.status_code(), 400);

    let response = ctx
        .server
        .post("/api/chat")
        .authorization_bearer(ALICE_TOKEN)
        .json(&json!({"message": "Hi", "provider": "mistral"}))
        .await;
    assert_eq!(response.status_code(), 400);
}

#[tokio::test]
async fn test_provider_rejection_is_502() {
    let ctx = setup();
    ctx.provider
        .set_default_response(ResponseTemplate::new("").with_http_error(401, "invalid api key"))
        .await;

    let response = ctx
        .server
        .post("/api/chat")
        .authorization_bearer(ALICE_TOKEN)
        .json(&json!({"message": "Hi"}))
        .await;
    assert_eq!(response.status_code(), 502);
}
