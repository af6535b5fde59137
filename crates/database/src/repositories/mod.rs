pub mod chat;
pub mod search_quota;
pub mod template;
pub mod usage;

pub use chat::InMemoryChatRepository;
pub use search_quota::InMemorySearchQuotaRepository;
pub use template::InMemoryTemplateRepository;
pub use usage::InMemoryUsageRepository;
