//! Server-Sent Events decoding for upstream provider bodies
//!
//! Two layers, both pull-based:
//!
//! - [`LineReassembler`] / [`LineStream`] turn arbitrarily chunked bytes into
//!   complete lines. HTTP chunks carry no alignment guarantee, so a line (or a
//!   multi-byte character) may be split across any number of reads.
//! - [`decode_line`] / [`FrameStream`] pick `data: ` lines out of that sequence,
//!   stop at the `[DONE]` sentinel and parse the payload as JSON.

use crate::CompletionError;
use bytes::Bytes;
use futures_util::Stream;
use std::collections::VecDeque;
use std::pin::Pin;
use std::task::{ready, Context, Poll};

/// Prefix that marks a data line
pub const DATA_PREFIX: &str = "data: ";

/// Payload that terminates a provider stream
pub const DONE_SENTINEL: &str = "[DONE]";

/// Incremental newline splitter.
///
/// The carry-over is kept as raw bytes and a line is decoded only once its
/// terminating `\n` has arrived. `\n` never appears inside a multi-byte UTF-8
/// sequence, so characters straddling a read boundary are reassembled before
/// decoding and never corrupted.
#[derive(Debug, Default)]
pub struct LineReassembler {
    carry: Vec<u8>,
}

impl LineReassembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one read and return every line it completed, in arrival order
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<String> {
        let mut lines = Vec::new();
        let mut rest = bytes;

        while let Some(pos) = rest.iter().position(|b| *b == b'\n') {
            let (head, tail) = rest.split_at(pos);
            let line = if self.carry.is_empty() {
                String::from_utf8_lossy(head).into_owned()
            } else {
                self.carry.extend_from_slice(head);
                let line = String::from_utf8_lossy(&self.carry).into_owned();
                self.carry.clear();
                line
            };
            lines.push(line);
            rest = &tail[1..];
        }

        self.carry.extend_from_slice(rest);
        lines
    }

    /// Number of buffered bytes belonging to an unterminated line
    pub fn pending_len(&self) -> usize {
        self.carry.len()
    }

    /// End of input. An unterminated line can never be a complete frame, so it
    /// is dropped; returns how many bytes were discarded.
    pub fn finish(&mut self) -> usize {
        let discarded = self.carry.len();
        self.carry.clear();
        discarded
    }
}

/// Classification of a single line
#[derive(Debug, Clone, PartialEq)]
pub enum FrameLine {
    Frame(serde_json::Value),
    Done,
    Skip,
}

/// Decode one complete line.
///
/// Lines without the `data: ` prefix, empty payloads and payloads that are not
/// valid JSON are skipped; a malformed frame is never an error.
pub fn decode_line(line: &str) -> FrameLine {
    let Some(data) = line.strip_prefix(DATA_PREFIX) else {
        return FrameLine::Skip;
    };

    let data = data.trim();
    if data == DONE_SENTINEL {
        return FrameLine::Done;
    }
    if data.is_empty() {
        return FrameLine::Skip;
    }

    match serde_json::from_str::<serde_json::Value>(data) {
        Ok(value) => FrameLine::Frame(value),
        Err(e) => {
            tracing::debug!(error = %e, "Skipping malformed SSE frame");
            FrameLine::Skip
        }
    }
}

/// Stream adapter yielding complete lines from a byte stream
pub struct LineStream<S> {
    inner: S,
    reassembler: LineReassembler,
    pending: VecDeque<String>,
    finished: bool,
}

impl<S> LineStream<S>
where
    S: Stream<Item = Result<Bytes, CompletionError>> + Unpin,
{
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            reassembler: LineReassembler::new(),
            pending: VecDeque::new(),
            finished: false,
        }
    }
}

impl<S> Stream for LineStream<S>
where
    S: Stream<Item = Result<Bytes, CompletionError>> + Unpin,
{
    type Item = Result<String, CompletionError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();

        loop {
            if let Some(line) = this.pending.pop_front() {
                return Poll::Ready(Some(Ok(line)));
            }
            if this.finished {
                return Poll::Ready(None);
            }

            match ready!(Pin::new(&mut this.inner).poll_next(cx)) {
                Some(Ok(bytes)) => {
                    let lines = this.reassembler.feed(&bytes);
                    this.pending.extend(lines);
                }
                Some(Err(e)) => return Poll::Ready(Some(Err(e))),
                None => {
                    this.finished = true;
                    let discarded = this.reassembler.finish();
                    if discarded > 0 {
                        tracing::warn!(
                            bytes = discarded,
                            "Discarding incomplete SSE line at end of stream"
                        );
                    }
                }
            }
        }
    }
}

/// Stream adapter yielding decoded JSON frames.
///
/// The underlying byte stream is dropped as soon as `[DONE]` is seen, which
/// releases the upstream connection without waiting for the consumer to drop
/// this adapter.
pub struct FrameStream<S> {
    lines: Option<LineStream<S>>,
}

impl<S> FrameStream<S>
where
    S: Stream<Item = Result<Bytes, CompletionError>> + Unpin,
{
    pub fn new(inner: S) -> Self {
        Self {
            lines: Some(LineStream::new(inner)),
        }
    }
}

impl<S> Stream for FrameStream<S>
where
    S: Stream<Item = Result<Bytes, CompletionError>> + Unpin,
{
    type Item = Result<serde_json::Value, CompletionError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();

        loop {
            let Some(lines) = this.lines.as_mut() else {
                return Poll::Ready(None);
            };

            match ready!(Pin::new(lines).poll_next(cx)) {
                Some(Ok(line)) => match decode_line(&line) {
                    FrameLine::Frame(value) => return Poll::Ready(Some(Ok(value))),
                    FrameLine::Done => {
                        this.lines = None;
                        return Poll::Ready(None);
                    }
                    FrameLine::Skip => continue,
                },
                Some(Err(e)) => return Poll::Ready(Some(Err(e))),
                None => {
                    this.lines = None;
                    return Poll::Ready(None);
                }
            }
        }
    }
}

/// Wrap a provider body in the line and frame decoders
pub fn new_sse_parser<S>(stream: S) -> FrameStream<S>
where
    S: Stream<Item = Result<Bytes, CompletionError>> + Unpin,
{
    FrameStream::new(stream)
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::{stream, StreamExt};
    use serde_json::json;

    fn byte_stream(
        parts: Vec<Vec<u8>>,
    ) -> impl Stream<Item = Result<Bytes, CompletionError>> + Unpin {
        stream::iter(parts.into_iter().map(|p| Ok(Bytes::from(p))))
    }

    async fn collect_frames(parts: Vec<Vec<u8>>) -> Vec<serde_json::Value> {
        new_sse_parser(byte_stream(parts))
            .map(|r| r.expect("frame error"))
            .collect()
            .await
    }

    #[test]
    fn test_reassembler_buffers_partial_line() {
        let mut r = LineReassembler::new();
        assert!(r.feed(b"data: {\"a\"").is_empty());
        assert_eq!(r.pending_len(), 10);
        assert_eq!(r.feed(b":1}\n\nda"), vec!["data: {\"a\":1}", ""]);
        assert_eq!(r.feed(b"ta: x\n"), vec!["data: x"]);
        assert_eq!(r.pending_len(), 0);
    }

    #[test]
    fn test_reassembler_multibyte_split() {
        let text = "data: こんにちは\n";
        let bytes = text.as_bytes();
        // Split inside the first three-byte character
        let mut r = LineReassembler::new();
        assert!(r.feed(&bytes[..7]).is_empty());
        let lines = r.feed(&bytes[7..]);
        assert_eq!(lines, vec!["data: こんにちは"]);
    }

    #[test]
    fn test_reassembler_finish_discards_tail() {
        let mut r = LineReassembler::new();
        r.feed(b"data: {\"incomplete\":");
        assert_eq!(r.finish(), 20);
        assert_eq!(r.pending_len(), 0);
    }

    #[test]
    fn test_decode_line() {
        assert_eq!(
            decode_line(r#"data: {"x":1}"#),
            FrameLine::Frame(json!({"x": 1}))
        );
        assert_eq!(decode_line("data: [DONE]"), FrameLine::Done);
        assert_eq!(decode_line("data:  [DONE]  \r"), FrameLine::Done);
        assert_eq!(decode_line("data: {not json"), FrameLine::Skip);
        assert_eq!(decode_line("data: "), FrameLine::Skip);
        assert_eq!(decode_line(": keep-alive"), FrameLine::Skip);
        assert_eq!(decode_line("event: message"), FrameLine::Skip);
        assert_eq!(decode_line(""), FrameLine::Skip);
        // The marker requires the space
        assert_eq!(decode_line(r#"data:{"x":1}"#), FrameLine::Skip);
    }

    #[tokio::test]
    async fn test_frames_stop_at_done() {
        let body = b"data: {\"n\":1}\n\ndata: [DONE]\n\ndata: {\"n\":2}\n\n".to_vec();
        let frames = collect_frames(vec![body]).await;
        assert_eq!(frames, vec![json!({"n": 1})]);
    }

    #[tokio::test]
    async fn test_malformed_frame_does_not_affect_following_lines() {
        let body = b"data: {\"n\":1}\n\ndata: {broken\n\ndata: {\"n\":3}\n\n".to_vec();
        let frames = collect_frames(vec![body]).await;
        assert_eq!(frames, vec![json!({"n": 1}), json!({"n": 3})]);
    }

    #[tokio::test]
    async fn test_crlf_lines() {
        let body = b"data: {\"n\":1}\r\n\r\ndata: [DONE]\r\n\r\n".to_vec();
        let frames = collect_frames(vec![body]).await;
        assert_eq!(frames, vec![json!({"n": 1})]);
    }

    #[tokio::test]
    async fn test_frames_independent_of_split_point() {
        let body = "data: {\"choices\":[{\"delta\":{\"content\":\"héllo 世界\"}}]}\n\n\
                    : comment\n\
                    data: {\"choices\":[{\"delta\":{\"content\":\"!\"}}]}\n\n\
                    data: [DONE]\n\n"
            .as_bytes()
            .to_vec();

        let expected = collect_frames(vec![body.clone()]).await;
        assert_eq!(expected.len(), 2);

        for split in 0..=body.len() {
            let parts = vec![body[..split].to_vec(), body[split..].to_vec()];
            assert_eq!(collect_frames(parts).await, expected, "split at {split}");
        }

        // One byte per read
        let parts = body.iter().map(|b| vec![*b]).collect();
        assert_eq!(collect_frames(parts).await, expected);
    }

    #[tokio::test]
    async fn test_upstream_error_is_surfaced() {
        let parts: Vec<Result<Bytes, CompletionError>> = vec![
            Ok(Bytes::from_static(b"data: {\"n\":1}\n\n")),
            Err(CompletionError::CompletionError("connection reset".into())),
        ];
        let mut frames = new_sse_parser(stream::iter(parts));

        assert_eq!(frames.next().await.unwrap().unwrap(), json!({"n": 1}));
        assert!(matches!(
            frames.next().await,
            Some(Err(CompletionError::CompletionError(_)))
        ));
    }

    #[tokio::test]
    async fn test_stream_without_done_ends_cleanly() {
        let frames = collect_frames(vec![b"data: {\"n\":1}\n\ndata: {\"n\":".to_vec()]).await;
        assert_eq!(frames, vec![json!({"n": 1})]);
    }
}
