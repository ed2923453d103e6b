//! 类型系统模块：对话信封、工具调用与响应体的强类型表示。
//!
//! # Types Module
//!
//! Strongly typed representations of everything that crosses the wire: conversational
//! envelopes, content parts, tool definitions and invocations, and the response bodies a
//! batch result line can carry.
//!
//! ## Key Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Message`] | One conversational turn; closed set of role variants |
//! | [`MessageContent`] | Plain text or ordered [`ContentPart`]s |
//! | [`ImageUrl`] / [`ImageDetail`] | Image part and its tiling/token mode |
//! | [`ToolDefinition`] | Function the model may call |
//! | [`ToolCall`] | Invocation produced by the model |
//! | [`ToolChoice`] | `auto`, `none`, `required` or a pinned function |
//! | [`ChatCompletionResponse`] | Completion body (`kind = completions`) |
//! | [`EmbeddingsResponse`] | Embedding body (`kind = embeddings`) |
//!
//! ## Example
//!
//! ```rust
//! use ai_batch_rust::types::{Message, ParameterSchema, ToolDefinition};
//!
//! let system = Message::system("You are a helpful assistant");
//! let user = Message::user_image("What is in this picture?", "https://example.com/cat.png");
//!
//! let tool = ToolDefinition::function(
//!     "get_weather",
//!     "Get current weather for a location",
//!     ParameterSchema::new().param("location", "string", "City name").build(),
//! );
//! ```

pub mod completion;
pub mod embeddings;
pub mod image;
pub mod message;
pub mod tool;

pub use completion::{ChatCompletionChunk, ChatCompletionResponse, Choice, FinishReason, Usage};
pub use embeddings::{EmbeddingInput, EmbeddingsRequest, EmbeddingsResponse};
pub use image::{ImageDetail, ImageUrl};
pub use message::{
    AssistantMessage, ContentPart, Message, MessageContent, Role, SystemMessage, ToolMessage,
    UserMessage,
};
pub use tool::{ParameterSchema, ToolCall, ToolChoice, ToolDefinition, MAX_TOOLS_PER_REQUEST};
