pub mod middleware;
pub mod models;
pub mod openapi;
pub mod routes;

use crate::{
    middleware::{auth_middleware, AuthState},
    openapi::ApiDoc,
    routes::{
        api::AppState,
        chat::chat_stream,
        conversations::{
            delete_conversation, get_conversation, list_conversations, rename_conversation,
        },
        credits::get_credits,
        health::health_check,
        search_usage::get_search_usage,
        templates::{
            create_template, delete_template, get_template, list_templates, update_template,
        },
        usage::{get_stats, get_usage_history},
    },
};
use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use config::ApiConfig;
use database::Database;
use inference_providers::CompletionError;
use services::{
    auth::{AuthServiceTrait, StaticTokenAuthService},
    chat::{ChatServiceImpl, ChatSettings},
    conversations::ConversationServiceImpl,
    inference_provider_pool::InferenceProviderPool,
    search::{PerplexityAnswerEngine, SearchAugmentor, SearchSettings, TavilyWebSearchProvider},
    templates::TemplateServiceImpl,
    usage::UsageService,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use utoipa::OpenApi;

/// Authentication service backed by the configured token table
pub fn init_auth_service(config: &ApiConfig) -> Arc<dyn AuthServiceTrait> {
    Arc::new(StaticTokenAuthService::new(config.auth.tokens.clone()))
}

/// Wire the domain services from configuration
pub fn init_app_state(config: &ApiConfig, database: &Database) -> Result<AppState, CompletionError> {
    let providers = Arc::new(InferenceProviderPool::from_config(
        &config.providers,
        &config.chat,
    )?);

    let search = Arc::new(SearchAugmentor::new(
        Arc::new(TavilyWebSearchProvider::new(
            config.search.tavily_base_url.clone(),
            config.search.timeout_seconds,
        )),
        Arc::new(PerplexityAnswerEngine::new(
            config.search.perplexity_base_url.clone(),
            config.search.perplexity_model.clone(),
            config.search.timeout_seconds,
        )),
        database.search_quota.clone(),
        SearchSettings::from(&config.search),
    ));

    let usage = Arc::new(UsageService::new(database.usage.clone()));

    let chat_service = Arc::new(ChatServiceImpl::new(
        database.chats.clone(),
        database.templates.clone(),
        providers.clone(),
        search.clone(),
        usage.clone(),
        ChatSettings::from(&config.chat),
    ));
    let conversation_service = Arc::new(ConversationServiceImpl::new(database.chats.clone()));
    let template_service = Arc::new(TemplateServiceImpl::new(database.templates.clone()));

    Ok(AppState {
        chat_service,
        conversation_service,
        template_service,
        usage,
        providers,
        search,
    })
}

/// Build the complete application router
pub fn build_app(app_state: AppState, auth_state: AuthState) -> Router {
    let api_routes = Router::new()
        .route("/chat", post(chat_stream))
        .route("/conversations", get(list_conversations))
        .route(
            "/conversations/{conversation_id}",
            get(get_conversation)
                .patch(rename_conversation)
                .delete(delete_conversation),
        )
        .route("/search-usage", get(get_search_usage))
        .route("/templates", get(list_templates).post(create_template))
        .route(
            "/templates/{template_id}",
            get(get_template)
                .put(update_template)
                .delete(delete_template),
        )
        .route("/credits", get(get_credits))
        .route("/usage", get(get_usage_history))
        .route("/stats", get(get_stats))
        .with_state(app_state)
        .layer(from_fn_with_state(auth_state, auth_middleware));

    Router::new()
        .nest("/api", api_routes)
        .route("/health", get(health_check))
        .merge(build_openapi_routes())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
}

/// Build OpenAPI documentation routes
pub fn build_openapi_routes() -> Router {
    Router::new().route(
        "/api-docs/openapi.json",
        get(|| async { axum::Json(ApiDoc::openapi()) }),
    )
}
