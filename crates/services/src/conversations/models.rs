use serde::Serialize;

use crate::chat::models::{Chat, Message};

/// Longest title accepted when renaming a conversation
pub const MAX_TITLE_CHARS: usize = 200;

/// A conversation together with its stored turns, oldest first
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversationWithMessages {
    pub chat: Chat,
    pub messages: Vec<Message>,
}
