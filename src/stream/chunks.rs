//! Streamed completion chunks from `data:` lines.

use crate::types::ChatCompletionChunk;
use crate::{BoxStream, Error, ErrorContext};
use futures::{stream, StreamExt};

const DONE_SIGNAL: &str = "[DONE]";

/// Turn a line stream into completion chunks.
///
/// - `data: {...}` lines become chunks; the `data:` prefix is optional
/// - `data: [DONE]` ends the stream
/// - comments (`:`) and other SSE fields (`event:`, `id:`, `retry:`) are ignored
/// - a payload that is not a chunk is a decode error and ends the stream
pub fn decode_chunks(lines: BoxStream<'static, String>) -> BoxStream<'static, ChatCompletionChunk> {
    let stream = stream::unfold((lines, false), |(mut lines, done)| async move {
        if done {
            return None;
        }
        loop {
            let line = match lines.next().await? {
                Ok(line) => line,
                Err(e) => return Some((Err(e), (lines, true))),
            };
            let Some(payload) = payload(&line) else {
                continue;
            };
            if payload == DONE_SIGNAL {
                return None;
            }
            return match serde_json::from_str::<ChatCompletionChunk>(payload) {
                Ok(chunk) => Some((Ok(chunk), (lines, false))),
                Err(e) => Some((
                    Err(Error::decode_with_context(
                        format!("invalid stream chunk: {}", e),
                        ErrorContext::new()
                            .with_details(truncate(payload, 120))
                            .with_source("chunk_decoder"),
                    )),
                    (lines, true),
                )),
            };
        }
    });
    Box::pin(stream.fuse())
}

fn payload(line: &str) -> Option<&str> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with(':') {
        return None;
    }
    if let Some(rest) = trimmed.strip_prefix("data:") {
        return Some(rest.trim_start());
    }
    if ["event:", "id:", "retry:"]
        .iter()
        .any(|field| trimmed.starts_with(field))
    {
        return None;
    }
    Some(trimmed)
}

fn truncate(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_string(),
    }
}
