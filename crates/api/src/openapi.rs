use crate::models::*;
use crate::routes::health::HealthResponse;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

/// OpenAPI documentation configuration
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Chat Gateway API",
        description = "Streaming chat over multiple LLM providers with optional web search augmentation.\n\n## Authentication\n\nUse `Authorization: Bearer <token>` with a token configured for your user.",
        version = "1.0.0",
    ),
    paths(
        crate::routes::chat::chat_stream,
        crate::routes::conversations::list_conversations,
        crate::routes::conversations::get_conversation,
        crate::routes::conversations::rename_conversation,
        crate::routes::conversations::delete_conversation,
        crate::routes::search_usage::get_search_usage,
        crate::routes::templates::list_templates,
        crate::routes::templates::create_template,
        crate::routes::templates::get_template,
        crate::routes::templates::update_template,
        crate::routes::templates::delete_template,
        crate::routes::credits::get_credits,
        crate::routes::usage::get_usage_history,
        crate::routes::usage::get_stats,
        crate::routes::health::health_check,
    ),
    components(
        schemas(
            ChatRequestBody, SearchModeParam, ErrorResponse,
            ConversationObject, ConversationList, ConversationDetail, MessageObject, SourceObject,
            RenameConversationRequest, ConversationDeleteResult,
            SearchUsageResponse, HealthResponse,
            TemplateObject, TemplateList, TemplateRequest, TemplateDeleteResult,
            CreditsResponse, UsageHistoryResponse, DailyUsageObject, StatsResponse,
            ModelUsageObject,
        ),
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

/// Security configuration for OpenAPI
pub struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).build()),
            );
        }
    }
}
