//! Classified chunk stream
//!
//! Composes the whole per-request decoding pipeline: raw bytes are reassembled
//! into lines, lines into JSON frames, frames are translated by the
//! provider's decoder and finally split into reasoning and content.

use crate::{
    reasoning::ReasoningSplitter, sse_parser::FrameStream, CompletionError, FrameDecoder,
    StreamChunk,
};
use bytes::Bytes;
use futures_util::Stream;
use std::collections::VecDeque;
use std::pin::Pin;
use std::task::{ready, Context, Poll};

pub struct ChunkStream<S> {
    frames: FrameStream<S>,
    decode: FrameDecoder,
    splitter: ReasoningSplitter,
    pending: VecDeque<StreamChunk>,
}

impl<S> ChunkStream<S>
where
    S: Stream<Item = Result<Bytes, CompletionError>> + Unpin,
{
    pub fn new(inner: S, decode: FrameDecoder) -> Self {
        Self {
            frames: FrameStream::new(inner),
            decode,
            splitter: ReasoningSplitter::new(),
            pending: VecDeque::new(),
        }
    }
}

impl<S> Stream for ChunkStream<S>
where
    S: Stream<Item = Result<Bytes, CompletionError>> + Unpin,
{
    type Item = Result<StreamChunk, CompletionError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();

        loop {
            if let Some(chunk) = this.pending.pop_front() {
                return Poll::Ready(Some(Ok(chunk)));
            }

            match ready!(Pin::new(&mut this.frames).poll_next(cx)) {
                Some(Ok(frame)) => {
                    let delta = (this.decode)(&frame);
                    if delta.is_empty() {
                        continue;
                    }
                    this.pending.extend(this.splitter.split(&delta));
                }
                Some(Err(e)) => return Poll::Ready(Some(Err(e))),
                None => return Poll::Ready(None),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::external::{decode_openai_frame, decode_together_frame};
    use futures_util::{stream, StreamExt};

    fn body(frames: &[&str]) -> Vec<u8> {
        let mut out = String::new();
        for f in frames {
            out.push_str("data: ");
            out.push_str(f);
            out.push_str("\n\n");
        }
        out.push_str("data: [DONE]\n\n");
        out.into_bytes()
    }

    async fn classify(parts: Vec<Vec<u8>>, decode: FrameDecoder) -> Vec<StreamChunk> {
        let inner = stream::iter(parts.into_iter().map(|p| Ok(Bytes::from(p))));
        ChunkStream::new(inner, decode)
            .map(|r| r.expect("chunk error"))
            .collect()
            .await
    }

    #[tokio::test]
    async fn test_network_split_inside_marker_is_recognized() {
        let payload = body(&[r#"{"choices":[{"delta":{"content":"A<think>B</think>C"}}]}"#]);
        // Cut the read right after "<thi"
        let marker = payload.windows(4).position(|w| w == b"<thi").unwrap() + 4;
        let parts = vec![payload[..marker].to_vec(), payload[marker..].to_vec()];

        let chunks = classify(parts, decode_together_frame).await;
        assert_eq!(
            chunks,
            vec![
                StreamChunk::Content("A".into()),
                StreamChunk::Reasoning("B".into()),
                StreamChunk::Content("C".into()),
            ]
        );
    }

    #[tokio::test]
    async fn test_payload_split_marker_stays_literal() {
        let payload = body(&[
            r#"{"choices":[{"delta":{"content":"A<thi"}}]}"#,
            r#"{"choices":[{"delta":{"content":"nk>B</think>C"}}]}"#,
        ]);
        let chunks = classify(vec![payload], decode_together_frame).await;
        assert_eq!(
            chunks,
            vec![
                StreamChunk::Content("A<thi".into()),
                StreamChunk::Content("nk>B</think>C".into()),
            ]
        );
    }

    #[tokio::test]
    async fn test_explicit_reasoning_then_content() {
        let payload = body(&[
            r#"{"choices":[{"delta":{"reasoning_content":"hmm","content":"ok"}}]}"#,
            r#"{"choices":[{"delta":{},"finish_reason":"stop"}]}"#,
        ]);
        let chunks = classify(vec![payload], decode_openai_frame).await;
        assert_eq!(
            chunks,
            vec![
                StreamChunk::Reasoning("hmm".into()),
                StreamChunk::Content("ok".into()),
            ]
        );
    }

    #[tokio::test]
    async fn test_together_reasoning_content_is_kept() {
        let payload = body(&[r#"{"choices":[{"delta":{"reasoning_content":"hidden","content":"ok"}}]}"#]);
        let chunks = classify(vec![payload], decode_together_frame).await;
        assert_eq!(
            chunks,
            vec![
                StreamChunk::Reasoning("hidden".into()),
                StreamChunk::Content("ok".into()),
            ]
        );
    }

    #[tokio::test]
    async fn test_chunks_independent_of_read_boundaries() {
        let payload = body(&[
            r#"{"choices":[{"delta":{"reasoning_content":"plan ✓","content":"Grüße "}}]}"#,
            r#"{"choices":[{"delta":{"content":"vor<think>denk 思考</think>nach"}}]}"#,
            r#"{"choices":[{"delta":{"content":"<think>offen"}}]}"#,
            r#"{"choices":[{"delta":{"content":" zu</think>ende €"}}]}"#,
        ]);
        let expected = classify(vec![payload.clone()], decode_openai_frame).await;
        assert_eq!(expected.len(), 8);

        for offset in 0..=payload.len() {
            let parts = vec![payload[..offset].to_vec(), payload[offset..].to_vec()];
            let chunks = classify(parts, decode_openai_frame).await;
            assert_eq!(chunks, expected, "split at byte {offset}");
        }

        // One byte per read
        let parts = payload.iter().map(|b| vec![*b]).collect();
        assert_eq!(classify(parts, decode_openai_frame).await, expected);
    }

    #[tokio::test]
    async fn test_malformed_frames_are_skipped() {
        let mut payload = b"data: {oops\n\n".to_vec();
        payload.extend(body(&[r#"{"choices":[{"delta":{"content":"fine"}}]}"#]));
        let chunks = classify(vec![payload], decode_together_frame).await;
        assert_eq!(chunks, vec![StreamChunk::Content("fine".into())]);
    }

    #[tokio::test]
    async fn test_upstream_error_propagates() {
        let parts: Vec<Result<Bytes, CompletionError>> = vec![
            Ok(Bytes::from_static(
                b"data: {\"choices\":[{\"delta\":{\"content\":\"partial\"}}]}\n\n",
            )),
            Err(CompletionError::CompletionError("reset".into())),
        ];
        let mut chunks = ChunkStream::new(stream::iter(parts), decode_together_frame);

        assert_eq!(
            chunks.next().await.unwrap().unwrap(),
            StreamChunk::Content("partial".into())
        );
        assert!(chunks.next().await.unwrap().is_err());
    }
}
