//! Reasoning/content classification
//!
//! Upstream models report their deliberation in one of two ways:
//!
//! - a dedicated delta field (`reasoning_content` / `reasoning`), normalized by
//!   the provider adapter into [`FrameDelta::reasoning`];
//! - inline `<think>...</think>` tags inside ordinary content.
//!
//! [`ReasoningSplitter`] handles both and turns every frame into zero or more
//! [`StreamChunk`]s. Tag markers are matched within a single payload only: a
//! marker split across two payloads is passed through as literal content. No
//! byte is lost either way.

use crate::{FrameDelta, StreamChunk};

pub const THINK_OPEN: &str = "<think>";
pub const THINK_CLOSE: &str = "</think>";

/// Per-stream tag state. Never shared between streams.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ParserState {
    pub inside_tag: bool,
    pub tag_buffer: String,
}

#[derive(Debug, Default)]
pub struct ReasoningSplitter {
    state: ParserState,
}

impl ReasoningSplitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &ParserState {
        &self.state
    }

    /// Classify one frame.
    ///
    /// Explicit reasoning comes first. Content is then scanned for tags;
    /// content preceding an opening tag is emitted before the tag's reasoning,
    /// and whatever content follows the last tag is emitted at the end.
    pub fn split(&mut self, delta: &FrameDelta) -> Vec<StreamChunk> {
        let mut chunks = Vec::new();

        if let Some(reasoning) = delta.reasoning.as_deref().filter(|r| !r.is_empty()) {
            chunks.push(StreamChunk::Reasoning(reasoning.to_string()));
        }

        if let Some(content) = delta.content.as_deref().filter(|c| !c.is_empty()) {
            self.scan_content(content, &mut chunks);
        }

        chunks
    }

    fn scan_content(&mut self, content: &str, chunks: &mut Vec<StreamChunk>) {
        let mut pending = String::new();
        let mut rest = content;

        while !rest.is_empty() {
            if self.state.inside_tag {
                match rest.find(THINK_CLOSE) {
                    Some(pos) => {
                        self.state.tag_buffer.push_str(&rest[..pos]);
                        self.flush_reasoning(chunks);
                        self.state.inside_tag = false;
                        rest = &rest[pos + THINK_CLOSE.len()..];
                    }
                    None => {
                        self.state.tag_buffer.push_str(rest);
                        rest = "";
                    }
                }
            } else {
                match rest.find(THINK_OPEN) {
                    Some(pos) => {
                        pending.push_str(&rest[..pos]);
                        push_content(&mut pending, chunks);
                        self.state.inside_tag = true;
                        rest = &rest[pos + THINK_OPEN.len()..];
                    }
                    None => {
                        pending.push_str(rest);
                        rest = "";
                    }
                }
            }
        }

        // Reasoning is surfaced as soon as it is seen rather than held until
        // the closing tag arrives in a later payload.
        if self.state.inside_tag {
            self.flush_reasoning(chunks);
        }
        push_content(&mut pending, chunks);
    }

    fn flush_reasoning(&mut self, chunks: &mut Vec<StreamChunk>) {
        if !self.state.tag_buffer.is_empty() {
            chunks.push(StreamChunk::Reasoning(std::mem::take(
                &mut self.state.tag_buffer,
            )));
        }
    }
}

fn push_content(pending: &mut String, chunks: &mut Vec<StreamChunk>) {
    if !pending.is_empty() {
        chunks.push(StreamChunk::Content(std::mem::take(pending)));
    }
}
