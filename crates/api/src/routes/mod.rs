pub mod api;
pub mod chat;
pub mod common;
pub mod conversations;
pub mod credits;
pub mod health;
pub mod search_usage;
pub mod templates;
pub mod usage;
