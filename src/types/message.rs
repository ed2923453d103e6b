//! Conversational envelopes.
//!
//! Every variant serializes to the flat wire shape `{"role": ..., "content": ...}` where
//! `content` is either a string or an ordered array of typed parts; the role tag decides
//! which shapes are legal, and the Rust types make the illegal ones unrepresentable.

use super::image::{ImageDetail, ImageUrl};
use super::tool::ToolCall;
use crate::Result;
use serde::{Deserialize, Deserializer, Serialize};

/// Message role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::Tool => "tool",
        }
    }
}

/// One conversational turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum Message {
    System(SystemMessage),
    User(UserMessage),
    Assistant(AssistantMessage),
    Tool(ToolMessage),
}

/// Instructions that steer the assistant. Text only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemMessage {
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// User input: plain text or ordered text/image parts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserMessage {
    pub content: MessageContent,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Model output, optionally carrying tool invocations to be answered by [`ToolMessage`]s.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AssistantMessage {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refusal: Option<String>,
    #[serde(
        default,
        deserialize_with = "null_as_empty",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub tool_calls: Vec<ToolCall>,
}

/// Result of one tool invocation, correlated by `tool_call_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolMessage {
    pub content: String,
    pub tool_call_id: String,
}

/// Message content (can be string or array of content parts)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

/// Typed content part.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

impl ContentPart {
    pub fn text(text: impl Into<String>) -> Self {
        ContentPart::Text { text: text.into() }
    }

    pub fn image(image_url: ImageUrl) -> Self {
        ContentPart::ImageUrl { image_url }
    }
}

impl Message {
    pub fn system(text: impl Into<String>) -> Self {
        Message::System(SystemMessage {
            content: text.into(),
            name: None,
        })
    }

    pub fn user(text: impl Into<String>) -> Self {
        Message::User(UserMessage {
            content: MessageContent::Text(text.into()),
            name: None,
        })
    }

    /// Image followed by a text prompt, at `low` detail.
    pub fn user_image(text: impl Into<String>, image_url: impl Into<String>) -> Self {
        Self::user_image_with_detail(text, image_url, ImageDetail::Low)
    }

    pub fn user_image_with_detail(
        text: impl Into<String>,
        image_url: impl Into<String>,
        detail: ImageDetail,
    ) -> Self {
        Self::user_parts(vec![
            ContentPart::image(ImageUrl::new(image_url).with_detail(detail)),
            ContentPart::text(text),
        ])
    }

    pub fn user_parts(parts: Vec<ContentPart>) -> Self {
        Message::User(UserMessage {
            content: MessageContent::Parts(parts),
            name: None,
        })
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Message::Assistant(AssistantMessage {
            content: Some(text.into()),
            ..Default::default()
        })
    }

    pub fn assistant_tool_calls(content: Option<String>, tool_calls: Vec<ToolCall>) -> Self {
        Message::Assistant(AssistantMessage {
            content,
            tool_calls,
            ..Default::default()
        })
    }

    pub fn tool(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Message::Tool(ToolMessage {
            content: content.into(),
            tool_call_id: tool_call_id.into(),
        })
    }

    /// Tool result whose content is `value` encoded as JSON text.
    pub fn tool_json<T: Serialize>(tool_call_id: impl Into<String>, value: &T) -> Result<Self> {
        let content = serde_json::to_string(value)?;
        Ok(Self::tool(tool_call_id, content))
    }

    /// Set the participant name. No effect on tool messages.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        let name = Some(name.into());
        match &mut self {
            Message::System(m) => m.name = name,
            Message::User(m) => m.name = name,
            Message::Assistant(m) => m.name = name,
            Message::Tool(_) => {}
        }
        self
    }

    pub fn role(&self) -> Role {
        match self {
            Message::System(_) => Role::System,
            Message::User(_) => Role::User,
            Message::Assistant(_) => Role::Assistant,
            Message::Tool(_) => Role::Tool,
        }
    }

    /// Concatenated text content, ignoring image parts.
    pub fn text(&self) -> Option<String> {
        match self {
            Message::System(m) => Some(m.content.clone()),
            Message::User(m) => match &m.content {
                MessageContent::Text(t) => Some(t.clone()),
                MessageContent::Parts(parts) => {
                    let text: Vec<&str> = parts
                        .iter()
                        .filter_map(|p| match p {
                            ContentPart::Text { text } => Some(text.as_str()),
                            ContentPart::ImageUrl { .. } => None,
                        })
                        .collect();
                    if text.is_empty() {
                        None
                    } else {
                        Some(text.join("\n"))
                    }
                }
            },
            Message::Assistant(m) => m.content.clone(),
            Message::Tool(m) => Some(m.content.clone()),
        }
    }

    pub fn images(&self) -> Vec<&ImageUrl> {
        match self {
            Message::User(UserMessage {
                content: MessageContent::Parts(parts),
                ..
            }) => parts
                .iter()
                .filter_map(|p| match p {
                    ContentPart::ImageUrl { image_url } => Some(image_url),
                    ContentPart::Text { .. } => None,
                })
                .collect(),
            _ => Vec::new(),
        }
    }

    pub fn contains_image(&self) -> bool {
        !self.images().is_empty()
    }

    /// Invocations requested by an assistant turn; empty for every other role.
    pub fn tool_calls(&self) -> &[ToolCall] {
        match self {
            Message::Assistant(m) => &m.tool_calls,
            _ => &[],
        }
    }

    pub fn tool_call_id(&self) -> Option<&str> {
        match self {
            Message::Tool(m) => Some(&m.tool_call_id),
            _ => None,
        }
    }
}

impl From<AssistantMessage> for Message {
    fn from(m: AssistantMessage) -> Self {
        Message::Assistant(m)
    }
}

fn null_as_empty<'de, D, T>(deserializer: D) -> std::result::Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::tool::ToolCall;
    use serde_json::json;

    #[test]
    fn test_text_envelopes_use_flat_shape() {
        assert_eq!(
            serde_json::to_value(Message::system("be brief")).unwrap(),
            json!({"role": "system", "content": "be brief"})
        );
        assert_eq!(
            serde_json::to_value(Message::user("hi")).unwrap(),
            json!({"role": "user", "content": "hi"})
        );
        assert_eq!(
            serde_json::to_value(Message::assistant("hello")).unwrap(),
            json!({"role": "assistant", "content": "hello"})
        );
    }

    #[test]
    fn test_user_image_parts() {
        let msg = Message::user_image("what is this?", "https://img.example/cat.png");
        let v = serde_json::to_value(&msg).unwrap();
        assert_eq!(
            v,
            json!({
                "role": "user",
                "content": [
                    {"type": "image_url", "image_url": {"url": "https://img.example/cat.png", "detail": "low"}},
                    {"type": "text", "text": "what is this?"}
                ]
            })
        );
        assert!(msg.contains_image());
        assert_eq!(msg.text().as_deref(), Some("what is this?"));
    }

    #[test]
    fn test_assistant_tool_calls_and_tool_result() {
        let call = ToolCall::function("call_1", "get_weather", r#"{"city":"Taipei"}"#);
        let msg = Message::assistant_tool_calls(None, vec![call]);
        let v = serde_json::to_value(&msg).unwrap();
        assert_eq!(v["role"], "assistant");
        assert!(v["content"].is_null());
        assert_eq!(v["tool_calls"][0]["id"], "call_1");
        assert_eq!(v["tool_calls"][0]["type"], "function");
        assert_eq!(v["tool_calls"][0]["function"]["arguments"], r#"{"city":"Taipei"}"#);

        let result = Message::tool_json("call_1", &json!({"temp": 31})).unwrap();
        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            json!({"role": "tool", "content": "{\"temp\":31}", "tool_call_id": "call_1"})
        );
        assert_eq!(result.tool_call_id(), Some("call_1"));
    }

    #[test]
    fn test_decode_dispatches_on_role() {
        let msg: Message = serde_json::from_value(json!({
            "role": "assistant",
            "content": null,
            "tool_calls": null,
            "refusal": null
        }))
        .unwrap();
        assert_eq!(msg.role(), Role::Assistant);
        assert!(msg.tool_calls().is_empty());

        let user: Message = serde_json::from_value(json!({
            "role": "user",
            "content": [{"type": "text", "text": "a"}]
        }))
        .unwrap();
        assert!(matches!(
            user,
            Message::User(UserMessage { content: MessageContent::Parts(_), .. })
        ));

        let bad = serde_json::from_value::<Message>(json!({"role": "moderator", "content": "x"}));
        assert!(bad.is_err());
    }

    #[test]
    fn test_with_name() {
        let v = serde_json::to_value(Message::user("x").with_name("alice")).unwrap();
        assert_eq!(v["name"], "alice");
    }
}
