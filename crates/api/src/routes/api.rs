use services::{
    chat::ChatServiceTrait, conversations::ConversationServiceTrait,
    inference_provider_pool::InferenceProviderPool, search::SearchAugmentor,
    templates::TemplateServiceTrait, usage::UsageService,
};
use std::sync::Arc;

/// Application state shared across all route handlers
#[derive(Clone)]
pub struct AppState {
    pub chat_service: Arc<dyn ChatServiceTrait>,
    pub conversation_service: Arc<dyn ConversationServiceTrait>,
    pub template_service: Arc<dyn TemplateServiceTrait>,
    pub usage: Arc<UsageService>,
    pub providers: Arc<InferenceProviderPool>,
    pub search: Arc<SearchAugmentor>,
}
