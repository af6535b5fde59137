pub mod auth;
pub mod chat;
pub mod conversations;
pub mod inference_provider_pool;
pub mod search;
pub mod templates;
pub mod usage;

pub use auth::{StaticTokenAuthService, UserId};
pub use chat::ChatServiceImpl as ChatService;
pub use conversations::service::ConversationServiceImpl as ConversationService;
pub use inference_provider_pool::InferenceProviderPool;
pub use search::SearchAugmentor;
pub use templates::TemplateServiceImpl as TemplateService;
pub use usage::UsageService;
