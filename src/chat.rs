//! Synchronous and streaming chat completion calls.

use crate::client::Client;
use crate::request::ChatCompletionRequest;
use crate::stream::{decode_chunks, spawn_line_channel, LineDecoder, LineEvent};
use crate::types::{ChatCompletionChunk, ChatCompletionResponse};
use crate::{BoxStream, Result};
use tokio::sync::mpsc;
use tracing::debug;

const COMPLETIONS_PATH: &str = "/v1/chat/completions";

pub struct Chat<'a> {
    client: &'a Client,
}

impl<'a> Chat<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// One request, one full response.
    pub async fn create(&self, request: &ChatCompletionRequest) -> Result<ChatCompletionResponse> {
        let resp: ChatCompletionResponse = self
            .client
            .transport()
            .post_json(self.client.context(), COMPLETIONS_PATH, Some(request))
            .await?;
        debug!(
            id = %resp.id,
            model = %resp.model,
            total_tokens = resp.usage.total_tokens,
            "chat completion received"
        );
        Ok(resp)
    }

    /// Streamed response as raw non-empty lines, in arrival order.
    ///
    /// The client's cancellation token, if any, also stops the line stream.
    pub async fn create_stream(
        &self,
        request: &ChatCompletionRequest,
    ) -> Result<BoxStream<'static, String>> {
        let body = self
            .client
            .transport()
            .post_stream(self.client.context(), COMPLETIONS_PATH, &request.streaming())
            .await?;
        let mut decoder = LineDecoder::new();
        if let Some(token) = self.client.context().cancellation() {
            decoder = decoder.with_cancellation(token.clone());
        }
        Ok(decoder.decode(body))
    }

    /// Streamed response decoded into completion chunks, ending at `[DONE]`.
    pub async fn create_chunk_stream(
        &self,
        request: &ChatCompletionRequest,
    ) -> Result<BoxStream<'static, ChatCompletionChunk>> {
        let lines = self.create_stream(request).await?;
        Ok(decode_chunks(lines))
    }

    /// Streamed response handed over a one-slot channel, ending with exactly one
    /// [`LineEvent::End`] or [`LineEvent::Error`].
    pub async fn create_line_channel(
        &self,
        request: &ChatCompletionRequest,
    ) -> Result<mpsc::Receiver<LineEvent>> {
        let lines = self.create_stream(request).await?;
        Ok(spawn_line_channel(lines))
    }
}
