//! Chat turn orchestration
//!
//! One request runs on its own task: the conversation is resolved and the
//! user message stored, search augmentation runs if requested, then the
//! provider stream is split into reasoning and content events that are
//! forwarded as they arrive while the answer is accumulated for persistence.

pub mod errors;
pub mod models;
pub mod ports;
pub mod service;

pub use errors::ChatError;
pub use models::{ChatId, ChatRequest, ChatStreamEvent, MessageId, SearchMode};
pub use ports::{ChatEventStream, ChatRepository, ChatServiceTrait};
pub use service::{ChatServiceImpl, ChatSettings};
