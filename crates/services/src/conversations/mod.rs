//! Conversation management outside of chat turns.
//!
//! Every operation is scoped to the requesting user; a conversation owned by
//! someone else is reported as not found.

pub mod errors;
pub mod models;
pub mod ports;
pub mod service;

pub use errors::ConversationError;
pub use models::ConversationWithMessages;
pub use ports::ConversationServiceTrait;
pub use service::ConversationServiceImpl;
