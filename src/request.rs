//! Request assembly: an ordered envelope sequence plus tool definitions, validated once and
//! frozen into a [`ChatCompletionRequest`].

use crate::types::message::Message;
use crate::types::tool::{ToolChoice, ToolDefinition, MAX_TOOLS_PER_REQUEST};
use crate::{Error, ErrorContext, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::warn;

/// Model used when none is given.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Finalized chat completion payload. Immutable once built.
///
/// Used as the body of a synchronous/streaming completion call and as the `body` of a batch
/// submission record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatCompletionRequest {
    model: String,
    messages: Vec<Message>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    tools: Vec<ToolDefinition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_choice: Option<ToolChoice>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    stream: Option<bool>,
}

impl ChatCompletionRequest {
    pub fn builder(model: impl Into<String>) -> RequestBuilder {
        RequestBuilder::new(model)
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn tools(&self) -> &[ToolDefinition] {
        &self.tools
    }

    pub fn tool_choice(&self) -> Option<&ToolChoice> {
        self.tool_choice.as_ref()
    }

    pub fn max_tokens(&self) -> Option<u32> {
        self.max_tokens
    }

    pub fn temperature(&self) -> Option<f64> {
        self.temperature
    }

    pub fn is_stream(&self) -> bool {
        self.stream.unwrap_or(false)
    }

    /// Copy of this payload with streaming switched on.
    pub(crate) fn streaming(&self) -> Self {
        let mut req = self.clone();
        req.stream = Some(true);
        req
    }
}

/// Builder for [`ChatCompletionRequest`].
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    model: String,
    messages: Vec<Message>,
    tools: Vec<ToolDefinition>,
    tool_choice: Option<ToolChoice>,
    max_tokens: Option<u32>,
    temperature: Option<f64>,
}

impl Default for RequestBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_MODEL)
    }
}

impl RequestBuilder {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            messages: Vec::new(),
            tools: Vec::new(),
            tool_choice: None,
            max_tokens: None,
            temperature: None,
        }
    }

    /// Append one envelope. Conversation order is preserved.
    pub fn message(mut self, message: Message) -> Self {
        self.messages.push(message);
        self
    }

    pub fn messages(mut self, messages: impl IntoIterator<Item = Message>) -> Self {
        self.messages.extend(messages);
        self
    }

    pub fn tool(mut self, tool: ToolDefinition) -> Self {
        self.tools.push(tool);
        self
    }

    pub fn tools(mut self, tools: impl IntoIterator<Item = ToolDefinition>) -> Self {
        self.tools.extend(tools);
        self
    }

    pub fn tool_choice(mut self, choice: ToolChoice) -> Self {
        self.tool_choice = Some(choice);
        self
    }

    /// Upper bound on generated tokens (roughly four characters each).
    pub fn max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = Some(max);
        self
    }

    pub fn temperature(mut self, temp: f64) -> Self {
        self.temperature = Some(temp);
        self
    }

    /// Validate and freeze.
    pub fn build(self) -> Result<ChatCompletionRequest> {
        if self.model.trim().is_empty() {
            return Err(invalid("model must not be empty", "model"));
        }
        if self.messages.is_empty() {
            return Err(invalid("at least one message is required", "messages"));
        }
        self.validate_tools()?;
        validate_tool_links(&self.messages)?;

        Ok(ChatCompletionRequest {
            model: self.model,
            messages: self.messages,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            tools: self.tools,
            tool_choice: self.tool_choice,
            stream: None,
        })
    }

    fn validate_tools(&self) -> Result<()> {
        if self.tools.len() > MAX_TOOLS_PER_REQUEST {
            return Err(Error::validation_with_context(
                format!(
                    "too many tool definitions: {} (limit {})",
                    self.tools.len(),
                    MAX_TOOLS_PER_REQUEST
                ),
                ErrorContext::new()
                    .with_field_path("tools")
                    .with_source("request_builder"),
            ));
        }

        let mut names = HashSet::new();
        for (i, tool) in self.tools.iter().enumerate() {
            if tool.name().trim().is_empty() {
                return Err(invalid(
                    "tool name must not be empty",
                    format!("tools[{}].function.name", i),
                ));
            }
            if !names.insert(tool.name()) {
                return Err(invalid(
                    format!("duplicate tool name '{}'", tool.name()),
                    format!("tools[{}].function.name", i),
                ));
            }
        }

        match &self.tool_choice {
            Some(ToolChoice::Required) if self.tools.is_empty() => Err(invalid(
                "tool_choice 'required' needs at least one tool",
                "tool_choice",
            )),
            Some(ToolChoice::Function(name)) if !names.contains(name.as_str()) => Err(invalid(
                format!("tool_choice names undefined function '{}'", name),
                "tool_choice.function.name",
            )),
            _ => Ok(()),
        }
    }
}

/// Every tool result must answer exactly one earlier invocation, and each invocation may be
/// answered at most once. Invocation ids must be unique within their assistant turn.
fn validate_tool_links(messages: &[Message]) -> Result<()> {
    let mut issued: HashSet<&str> = HashSet::new();
    let mut answered: HashSet<&str> = HashSet::new();

    for (i, msg) in messages.iter().enumerate() {
        let mut turn: HashSet<&str> = HashSet::new();
        for call in msg.tool_calls() {
            if !turn.insert(call.id.as_str()) {
                return Err(invalid(
                    format!("duplicate invocation id '{}' in one assistant turn", call.id),
                    format!("messages[{}].tool_calls", i),
                ));
            }
            issued.insert(call.id.as_str());
        }

        if let Some(id) = msg.tool_call_id() {
            if !issued.contains(id) {
                return Err(invalid(
                    format!("tool result references unknown invocation id '{}'", id),
                    format!("messages[{}].tool_call_id", i),
                ));
            }
            if !answered.insert(id) {
                return Err(invalid(
                    format!("invocation id '{}' answered more than once", id),
                    format!("messages[{}].tool_call_id", i),
                ));
            }
        }
    }

    let pending: Vec<&&str> = issued.difference(&answered).collect();
    if !pending.is_empty() {
        warn!(?pending, "tool invocations without a tool result");
    }
    Ok(())
}

fn invalid(msg: impl Into<String>, field: impl Into<String>) -> Error {
    Error::validation_with_context(
        msg,
        ErrorContext::new()
            .with_field_path(field)
            .with_source("request_builder"),
    )
}
