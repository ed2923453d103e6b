//! Incremental line decoding over a response body.
//!
//! The pull-based [`LineDecoder`] is the primary interface: it yields one `Ok(line)` per
//! newline-delimited, non-empty line in arrival order. End-of-stream is `None`. A failure
//! (transport error, invalid UTF-8, cancellation) is yielded once as `Err` and the stream
//! then ends, so the two terminal conditions are never confused.
//!
//! [`spawn_line_channel`] republishes such a stream through a single-slot channel for
//! consumers that want a push hand-off.

use crate::transport::TransportError;
use crate::{BoxStream, Error, ErrorContext, Result};
use bytes::Bytes;
use futures::{stream, StreamExt};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Splits a byte stream into lines. `\n` delimits; a trailing `\r` is dropped; empty lines
/// are skipped; an unterminated final line is still emitted.
#[derive(Debug, Clone, Default)]
pub struct LineDecoder {
    cancel: Option<CancellationToken>,
}

struct State {
    input: BoxStream<'static, Bytes>,
    buf: Vec<u8>,
    line_no: usize,
    cancel: Option<CancellationToken>,
    done: bool,
}

impl LineDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stop reading as soon as `token` fires; the stream then yields one cancellation error.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn decode(&self, input: BoxStream<'static, Bytes>) -> BoxStream<'static, String> {
        let state = State {
            input,
            buf: Vec::new(),
            line_no: 0,
            cancel: self.cancel.clone(),
            done: false,
        };

        let stream = stream::unfold(state, |mut st| async move {
            if st.done {
                return None;
            }
            loop {
                if let Some(idx) = st.buf.iter().position(|b| *b == b'\n') {
                    let mut line: Vec<u8> = st.buf.drain(..=idx).collect();
                    line.pop();
                    st.line_no += 1;
                    match finish_line(line, st.line_no) {
                        Some(Ok(l)) => return Some((Ok(l), st)),
                        Some(Err(e)) => {
                            st.done = true;
                            return Some((Err(e), st));
                        }
                        None => continue,
                    }
                }

                match next_chunk(&mut st.input, st.cancel.as_ref()).await {
                    Some(Ok(bytes)) => st.buf.extend_from_slice(&bytes),
                    Some(Err(e)) => {
                        st.done = true;
                        return Some((Err(e), st));
                    }
                    None => {
                        st.done = true;
                        let rest = std::mem::take(&mut st.buf);
                        st.line_no += 1;
                        return match finish_line(rest, st.line_no) {
                            Some(item) => Some((item, st)),
                            None => None,
                        };
                    }
                }
            }
        });

        Box::pin(stream.fuse())
    }
}

async fn next_chunk(
    input: &mut BoxStream<'static, Bytes>,
    cancel: Option<&CancellationToken>,
) -> Option<Result<Bytes>> {
    match cancel {
        Some(token) => tokio::select! {
            biased;
            _ = token.cancelled() => Some(Err(TransportError::Cancelled.into())),
            next = input.next() => next,
        },
        None => input.next().await,
    }
}

/// `None` for a line that is empty once `\r` is removed.
fn finish_line(mut line: Vec<u8>, line_no: usize) -> Option<Result<String>> {
    if line.last() == Some(&b'\r') {
        line.pop();
    }
    if line.is_empty() {
        return None;
    }
    Some(String::from_utf8(line).map_err(|e| {
        Error::decode_with_context(
            format!("stream line {} is not valid UTF-8: {}", line_no, e),
            ErrorContext::new()
                .with_field_path(format!("line {}", line_no))
                .with_source("line_decoder"),
        )
    }))
}

/// Item handed over by [`spawn_line_channel`]. Exactly one of `End` or `Error` is sent last.
#[derive(Debug)]
pub enum LineEvent {
    Line(String),
    End,
    Error(Error),
}

impl LineEvent {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, LineEvent::Line(_))
    }
}

/// Drive `lines` on a background task and hand each item over a one-slot channel.
///
/// Before pulling the next item the producer waits for the slot to be free again, that is
/// for the consumer to have taken the previous item. At most one item is read from `lines`
/// ahead of the consumer. Dropping the receiver stops the producer before its next pull.
pub fn spawn_line_channel(mut lines: BoxStream<'static, String>) -> mpsc::Receiver<LineEvent> {
    let (tx, rx) = mpsc::channel(1);
    tokio::spawn(async move {
        let mut sent = 0usize;
        loop {
            let permit = match tx.reserve().await {
                Ok(permit) => permit,
                Err(_) => {
                    debug!(lines = sent, "line consumer went away");
                    return;
                }
            };
            match lines.next().await {
                Some(Ok(line)) => {
                    permit.send(LineEvent::Line(line));
                    sent += 1;
                }
                Some(Err(e)) => {
                    debug!(lines = sent, error = %e, "line stream failed");
                    permit.send(LineEvent::Error(e));
                    return;
                }
                None => {
                    debug!(lines = sent, "line stream ended");
                    permit.send(LineEvent::End);
                    return;
                }
            }
        }
    });
    rx
}
