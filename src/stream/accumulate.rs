use crate::types::completion::{ChatCompletionChunk, FunctionCallDelta, CHAT_COMPLETION_OBJECT};
use crate::types::message::AssistantMessage;
use crate::types::tool::ToolCall;
use crate::types::{ChatCompletionResponse, Choice, FinishReason, Usage};
use crate::{BoxStream, Result};
use futures::StreamExt;
use std::collections::BTreeMap;

/// Folds streamed chunks into the equivalent full [`ChatCompletionResponse`].
///
/// Content deltas are concatenated per choice. Tool call fragments are grouped by their
/// `index`; the id and name come from whichever fragment carries them and argument text is
/// appended in arrival order. Arguments are kept as raw text, never parsed.
#[derive(Debug, Default)]
pub struct CompletionAccumulator {
    id: String,
    model: String,
    created: i64,
    system_fingerprint: Option<String>,
    usage: Option<Usage>,
    choices: BTreeMap<u32, ChoiceState>,
}

#[derive(Debug, Default)]
struct ChoiceState {
    content: Option<String>,
    refusal: Option<String>,
    tool_calls: BTreeMap<u32, PartialToolCall>,
    finish_reason: Option<FinishReason>,
}

#[derive(Debug, Default)]
struct PartialToolCall {
    id: String,
    name: String,
    arguments: String,
}

impl CompletionAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, chunk: &ChatCompletionChunk) {
        if self.id.is_empty() {
            self.id = chunk.id.clone();
        }
        if self.model.is_empty() {
            self.model = chunk.model.clone();
        }
        if self.created == 0 {
            self.created = chunk.created;
        }
        if chunk.system_fingerprint.is_some() {
            self.system_fingerprint = chunk.system_fingerprint.clone();
        }
        if let Some(usage) = chunk.usage {
            self.usage = Some(usage);
        }

        for c in &chunk.choices {
            let state = self.choices.entry(c.index).or_default();
            if let Some(text) = &c.delta.content {
                state.content.get_or_insert_with(String::new).push_str(text);
            }
            if let Some(text) = &c.delta.refusal {
                state.refusal.get_or_insert_with(String::new).push_str(text);
            }
            for tc in c.delta.tool_calls.iter().flatten() {
                let call = state.tool_calls.entry(tc.index).or_default();
                if let Some(id) = &tc.id {
                    if call.id.is_empty() {
                        call.id = id.clone();
                    }
                }
                if let Some(FunctionCallDelta { name, arguments }) = &tc.function {
                    if let Some(name) = name {
                        call.name.push_str(name);
                    }
                    if let Some(args) = arguments {
                        call.arguments.push_str(args);
                    }
                }
            }
            if c.finish_reason.is_some() {
                state.finish_reason = c.finish_reason;
            }
        }
    }

    pub fn finish(self) -> ChatCompletionResponse {
        let choices = self
            .choices
            .into_iter()
            .map(|(index, st)| Choice {
                index,
                message: AssistantMessage {
                    content: st.content,
                    name: None,
                    refusal: st.refusal,
                    tool_calls: st
                        .tool_calls
                        .into_values()
                        .map(|p| ToolCall::function(p.id, p.name, p.arguments))
                        .collect(),
                },
                finish_reason: st.finish_reason,
            })
            .collect();

        ChatCompletionResponse {
            id: self.id,
            object: CHAT_COMPLETION_OBJECT.to_string(),
            created: self.created,
            model: self.model,
            usage: self.usage.unwrap_or_default(),
            choices,
            service_tier: None,
            system_fingerprint: self.system_fingerprint,
        }
    }
}

/// Drain a chunk stream into one response. The first stream error is returned as-is.
pub async fn collect_completion(
    mut chunks: BoxStream<'static, ChatCompletionChunk>,
) -> Result<ChatCompletionResponse> {
    let mut acc = CompletionAccumulator::new();
    while let Some(chunk) = chunks.next().await {
        acc.push(&chunk?);
    }
    Ok(acc.finish())
}
