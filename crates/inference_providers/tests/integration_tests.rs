//! Integration tests for the external providers
//!
//! An `httpmock` server stands in for the upstream services, so the full
//! request/response path (headers, body shape, status handling and stream
//! decoding) is exercised without network access.
//! Run with: `cargo test --test integration_tests -- --nocapture`

use futures_util::StreamExt;
use httpmock::prelude::*;
use inference_providers::{
    classify_stream, ChatMessage, CompletionError, ExternalProvider, ExternalProviderConfig,
    GenerationRequest, InferenceProvider, ProviderKind, SearchResult, StreamChunk,
};
use std::collections::HashMap;

fn sse_body(frames: &[&str]) -> String {
    let mut body = String::new();
    for frame in frames {
        body.push_str(&format!("data: {frame}\n\n"));
    }
    body.push_str("data: [DONE]\n\n");
    body
}

fn provider_for(server: &MockServer, kind: ProviderKind) -> ExternalProvider {
    let mut config = ExternalProviderConfig::new(kind);
    config.base_url = server.base_url();
    config.timeout_seconds = 5;
    config.extra = HashMap::from([
        ("referer".to_string(), "https://chat.example.com".to_string()),
        ("title".to_string(), "Example Chat".to_string()),
    ]);
    ExternalProvider::new(config)
}

fn request(api_key: &str) -> GenerationRequest {
    GenerationRequest {
        messages: vec![ChatMessage::user("What is Rust?")],
        api_key: api_key.to_string(),
        model: String::new(),
        search_results: None,
        system_prompt: Some("Be concise.".to_string()),
    }
}

async fn collect(
    provider: &ExternalProvider,
    request: GenerationRequest,
) -> Vec<StreamChunk> {
    let body = provider
        .chat_completion_stream(request)
        .await
        .expect("request should succeed");
    classify_stream(body, provider.frame_decoder())
        .map(|c| c.expect("chunk should decode"))
        .collect()
        .await
}

#[tokio::test]
async fn test_together_streaming_request() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/chat/completions")
                .header("authorization", "Bearer tg-key")
                .json_body_partial(
                    r#"{"model":"meta-llama/Llama-3.3-70B-Instruct-Turbo","stream":true,"max_tokens":4096}"#,
                )
                .body_contains("Be concise.");
            then.status(200)
                .header("content-type", "text/event-stream")
                .body(sse_body(&[
                    r#"{"choices":[{"delta":{"content":"<think>recall</think>"}}]}"#,
                    r#"{"choices":[{"delta":{"content":"A systems"}}]}"#,
                    r#"{"choices":[{"delta":{"content":" language."}}]}"#,
                ]));
        })
        .await;

    let provider = provider_for(&server, ProviderKind::Together);
    let chunks = collect(&provider, request("tg-key")).await;

    mock.assert_async().await;
    assert_eq!(
        chunks,
        vec![
            StreamChunk::Reasoning("recall".into()),
            StreamChunk::Content("A systems".into()),
            StreamChunk::Content(" language.".into()),
        ]
    );
}

#[tokio::test]
async fn test_openrouter_sends_attribution_headers() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/chat/completions")
                .header("authorization", "Bearer or-key")
                .header("HTTP-Referer", "https://chat.example.com")
                .header("X-Title", "Example Chat");
            then.status(200).body(sse_body(&[
                r#"{"choices":[{"delta":{"reasoning":"weighing"}}]}"#,
                r#"{"choices":[{"delta":{"content":"Done"}}]}"#,
            ]));
        })
        .await;

    let provider = provider_for(&server, ProviderKind::OpenRouter);
    let chunks = collect(&provider, request("or-key")).await;

    mock.assert_async().await;
    assert_eq!(
        chunks,
        vec![
            StreamChunk::Reasoning("weighing".into()),
            StreamChunk::Content("Done".into()),
        ]
    );
}

#[tokio::test]
async fn test_search_results_reach_system_prompt() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/chat/completions")
                .body_contains("[1] Rust Book")
                .body_contains("do not include URLs");
            then.status(200).body(sse_body(&[
                r#"{"choices":[{"delta":{"content":"ok"}}]}"#,
            ]));
        })
        .await;

    let provider = provider_for(&server, ProviderKind::Together);
    let mut req = request("tg-key");
    req.search_results = Some(vec![SearchResult {
        title: "Rust Book".to_string(),
        url: "https://doc.rust-lang.org/book/".to_string(),
        content: "The Rust Programming Language".to_string(),
    }]);

    let chunks = collect(&provider, req).await;
    mock.assert_async().await;
    assert_eq!(chunks, vec![StreamChunk::Content("ok".into())]);
}

#[tokio::test]
async fn test_non_success_status_is_reported() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/chat/completions");
            then.status(401).body(r#"{"error":"invalid api key"}"#);
        })
        .await;

    let provider = provider_for(&server, ProviderKind::Together);
    match provider.chat_completion_stream(request("bad-key")).await {
        Err(CompletionError::HttpError {
            status_code,
            message,
        }) => {
            assert_eq!(status_code, 401);
            assert!(message.contains("invalid api key"));
        }
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("expected an HTTP error"),
    }
}

#[tokio::test]
async fn test_missing_key_makes_no_request() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST).path("/chat/completions");
            then.status(200).body(sse_body(&[]));
        })
        .await;

    let provider = provider_for(&server, ProviderKind::OpenRouter);
    let result = provider.chat_completion_stream(request("")).await;

    assert!(matches!(result, Err(CompletionError::MissingCredential(_))));
    assert_eq!(mock.hits_async().await, 0);
}

#[tokio::test]
async fn test_malformed_frames_are_skipped_end_to_end() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/chat/completions");
            then.status(200).body(
                "data: {\"choices\":[{\"delta\":{\"content\":\"one\"}}]}\n\n\
                 data: {\"choices\":[{\"delta\":\n\n\
                 : keep-alive\n\n\
                 data: {\"choices\":[{\"delta\":{\"content\":\" two\"}}]}\n\n\
                 data: [DONE]\n\n",
            );
        })
        .await;

    let provider = provider_for(&server, ProviderKind::Together);
    let chunks = collect(&provider, request("tg-key")).await;
    assert_eq!(
        chunks,
        vec![
            StreamChunk::Content("one".into()),
            StreamChunk::Content(" two".into()),
        ]
    );
}

#[tokio::test]
async fn test_reasoning_content_end_to_end_for_every_provider() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/chat/completions");
            then.status(200).body(sse_body(&[
                r#"{"choices":[{"delta":{"reasoning_content":"weigh options"}}]}"#,
                r#"{"choices":[{"delta":{"content":"Pick B."}}]}"#,
            ]));
        })
        .await;

    for kind in ProviderKind::ALL {
        let provider = provider_for(&server, kind);
        let chunks = collect(&provider, request("key")).await;
        assert_eq!(
            chunks,
            vec![
                StreamChunk::Reasoning("weigh options".into()),
                StreamChunk::Content("Pick B.".into()),
            ],
            "{kind}"
        );
    }
}

#[tokio::test]
async fn test_openrouter_credit_balance() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/credits")
                .header("authorization", "Bearer or-key");
            then.status(200)
                .header("content-type", "application/json")
                .body(r#"{"data":{"total_credits":25.5,"total_usage":10.25}}"#);
        })
        .await;

    let provider = provider_for(&server, ProviderKind::OpenRouter);
    let balance = provider.credit_balance("or-key").await.unwrap();

    mock.assert_async().await;
    assert_eq!(balance.total_credits, 25.5);
    assert_eq!(balance.total_usage, 10.25);
    assert_eq!(balance.remaining(), 15.25);
}

#[tokio::test]
async fn test_openrouter_credit_balance_defaults_missing_fields() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/credits");
            then.status(200).body(r#"{"data":{"total_credits":3}}"#);
        })
        .await;

    let provider = provider_for(&server, ProviderKind::OpenRouter);
    let balance = provider.credit_balance("or-key").await.unwrap();
    assert_eq!(balance.remaining(), 3.0);
}

#[tokio::test]
async fn test_openrouter_credit_balance_rejected() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/credits");
            then.status(401).body(r#"{"error":"no auth"}"#);
        })
        .await;

    let provider = provider_for(&server, ProviderKind::OpenRouter);
    assert!(matches!(
        provider.credit_balance("bad").await,
        Err(CompletionError::HttpError {
            status_code: 401,
            ..
        })
    ));
}

#[tokio::test]
async fn test_together_has_no_credit_balance() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/credits");
            then.status(200).body("{}");
        })
        .await;

    let provider = provider_for(&server, ProviderKind::Together);
    assert!(matches!(
        provider.credit_balance("tg-key").await,
        Err(CompletionError::Unsupported(name)) if name == "together"
    ));
    assert_eq!(mock.hits_async().await, 0);
}
