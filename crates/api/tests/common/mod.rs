#![allow(dead_code)]

use api::{build_app, middleware::AuthState, routes::api::AppState};
use axum_test::TestServer;
use database::Database;
use inference_providers::{MockProvider, ProviderKind, SearchResult};
use services::{
    auth::StaticTokenAuthService,
    chat::{ChatServiceImpl, ChatSettings},
    conversations::ConversationServiceImpl,
    inference_provider_pool::InferenceProviderPool,
    search::{
        ports::{MockAnswerEngineTrait, MockWebSearchProviderTrait},
        SearchAugmentor, SearchSettings,
    },
    templates::TemplateServiceImpl,
    usage::UsageService,
};
use std::{collections::HashMap, sync::Arc};

pub const ALICE_TOKEN: &str = "alice-token";
pub const BOB_TOKEN: &str = "bob-token";

pub struct TestContext {
    pub server: TestServer,
    pub provider: Arc<MockProvider>,
    /// Registered as `openrouter`; answers credit lookups once a balance is set
    pub openrouter: Arc<MockProvider>,
    pub database: Database,
}

pub struct TestOptions {
    pub monthly_quota: i64,
    pub search_results: Vec<SearchResult>,
    pub answer_records: Vec<SearchResult>,
}

impl Default for TestOptions {
    fn default() -> Self {
        Self {
            monthly_quota: 100,
            search_results: vec![SearchResult {
                title: "Rust".to_string(),
                url: "https://www.rust-lang.org".to_string(),
                content: "A language empowering everyone".to_string(),
            }],
            answer_records: Vec::new(),
        }
    }
}

pub fn setup() -> TestContext {
    setup_with(TestOptions::default())
}

pub fn setup_with(options: TestOptions) -> TestContext {
    let database = Database::new();
    let provider = Arc::new(MockProvider::with_name("together"));

    let mut pool = InferenceProviderPool::new(ProviderKind::Together, None);
    pool.register_provider(
        ProviderKind::Together,
        provider.clone(),
        Some("tg-test-key".to_string()),
    );
    let openrouter = Arc::new(MockProvider::with_name("openrouter"));
    pool.register_provider(
        ProviderKind::OpenRouter,
        openrouter.clone(),
        Some("or-test-key".to_string()),
    );
    let providers = Arc::new(pool);

    let results = options.search_results;
    let mut web = MockWebSearchProviderTrait::new();
    web.expect_search()
        .returning(move |_, _, _| Ok(results.clone()));
    let records = options.answer_records;
    let mut engine = MockAnswerEngineTrait::new();
    engine
        .expect_answer()
        .returning(move |_, _| Ok(records.clone()));

    let search = Arc::new(SearchAugmentor::new(
        Arc::new(web),
        Arc::new(engine),
        database.search_quota.clone(),
        SearchSettings {
            tavily_api_key: Some("tvly-test".to_string()),
            perplexity_api_key: Some("pplx-test".to_string()),
            monthly_quota: options.monthly_quota,
            default_max_results: 5,
        },
    ));

    let usage = Arc::new(UsageService::new(database.usage.clone()));
    let app_state = AppState {
        chat_service: Arc::new(ChatServiceImpl::new(
            database.chats.clone(),
            database.templates.clone(),
            providers.clone(),
            search.clone(),
            usage.clone(),
            ChatSettings::default(),
        )),
        conversation_service: Arc::new(ConversationServiceImpl::new(database.chats.clone())),
        template_service: Arc::new(TemplateServiceImpl::new(database.templates.clone())),
        usage,
        providers,
        search,
    };

    let tokens = HashMap::from([
        (ALICE_TOKEN.to_string(), "alice".to_string()),
        (BOB_TOKEN.to_string(), "bob".to_string()),
    ]);
    let auth_state = AuthState::new(Arc::new(StaticTokenAuthService::new(tokens)));

    let server = TestServer::new(build_app(app_state, auth_state)).expect("test server");
    TestContext {
        server,
        provider,
        openrouter,
        database,
    }
}

/// Decode the JSON payload of every `data:` line of an event-stream body
pub fn parse_events(body: &str) -> Vec<serde_json::Value> {
    body.lines()
        .filter_map(|line| line.strip_prefix("data: "))
        .map(|data| serde_json::from_str(data).expect("event payload is JSON"))
        .collect()
}

pub fn content_of(events: &[serde_json::Value]) -> String {
    events
        .iter()
        .filter_map(|e| e.get("content").and_then(|c| c.as_str()))
        .collect()
}
