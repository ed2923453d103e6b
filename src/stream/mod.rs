//! 流式解码模块：将增量响应体拆分为有序的行、数据块与完整响应。
//!
//! # Streaming
//!
//! | Stage | Entry point | Output |
//! |-------|-------------|--------|
//! | bytes → lines | [`LineDecoder`] | `BoxStream<String>` |
//! | lines → push hand-off | [`spawn_line_channel`] | `mpsc::Receiver<LineEvent>` |
//! | lines → chunks | [`decode_chunks`] | `BoxStream<ChatCompletionChunk>` |
//! | chunks → response | [`CompletionAccumulator`], [`collect_completion`] | [`ChatCompletionResponse`](crate::types::ChatCompletionResponse) |
//!
//! Every stage is pull-based: nothing is read from the network until the consumer asks for
//! the next item.

mod accumulate;
mod chunks;
mod lines;

pub use accumulate::{collect_completion, CompletionAccumulator};
pub use chunks::decode_chunks;
pub use lines::{spawn_line_channel, LineDecoder, LineEvent};
