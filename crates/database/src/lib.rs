//! Process-local storage for chats, templates, search quotas and usage

pub mod repositories;

pub use repositories::{
    InMemoryChatRepository, InMemorySearchQuotaRepository, InMemoryTemplateRepository,
    InMemoryUsageRepository,
};

use std::sync::Arc;

/// Storage service combining all repositories
#[derive(Clone, Default)]
pub struct Database {
    pub chats: Arc<InMemoryChatRepository>,
    pub search_quota: Arc<InMemorySearchQuotaRepository>,
    pub templates: Arc<InMemoryTemplateRepository>,
    pub usage: Arc<InMemoryUsageRepository>,
}

impl Database {
    pub fn new() -> Self {
        tracing::info!("Using in-memory storage; conversations are not kept across restarts");
        Self::default()
    }
}
