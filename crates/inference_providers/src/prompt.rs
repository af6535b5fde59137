//! System message synthesis shared by every provider adapter

use crate::{ChatMessage, SearchResult};

pub const DEFAULT_SYSTEM_PROMPT: &str =
    "You are a helpful and knowledgeable AI assistant. Answer politely and clearly.";

/// Sources are rendered by the client next to the answer, so the model must
/// not repeat them in the body.
pub const NO_URL_INSTRUCTION: &str = "Important: do not include URLs or references to sources in your answer. \
     The sources are displayed separately by the application. Reply with the answer body only.";

/// Render search results as a numbered list (1-based)
pub fn format_search_results(results: &[SearchResult]) -> String {
    results
        .iter()
        .enumerate()
        .map(|(idx, r)| format!("[{}] {}\n{}", idx + 1, r.title, r.content))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Build the system message prepended to every generation request.
///
/// A blank template falls back to [`DEFAULT_SYSTEM_PROMPT`]. When search
/// results are present they are appended together with the instruction to
/// leave URLs out of the answer.
pub fn build_system_message(template: Option<&str>, search_results: Option<&[SearchResult]>) -> String {
    let base = template
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .unwrap_or(DEFAULT_SYSTEM_PROMPT);

    match search_results {
        Some(results) if !results.is_empty() => format!(
            "{base}\n\nUse the following search results to answer.\n\n{NO_URL_INSTRUCTION}\n\nSearch results:\n{}",
            format_search_results(results)
        ),
        _ => base.to_string(),
    }
}

/// Prepend the synthesized system message to the conversation
pub fn build_messages(
    history: &[ChatMessage],
    template: Option<&str>,
    search_results: Option<&[SearchResult]>,
) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(history.len() + 1);
    messages.push(ChatMessage::system(build_system_message(template, search_results)));
    messages.extend_from_slice(history);
    messages
}
