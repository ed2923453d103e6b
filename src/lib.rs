//! # ai-batch-rust
//!
//! 面向 OpenAI 兼容服务的批处理作业客户端：对话信封模型、JSONL 编解码与作业生命周期编排。
//!
//! Client library for driving large-volume asynchronous inference jobs against an
//! OpenAI-compatible completion service, plus the typed envelope model used to describe
//! conversational turns (text, images, tool invocations and tool results).
//!
//! ## Overview
//!
//! A batch run has four steps, each a single call:
//!
//! 1. Build requests with [`RequestBuilder`] and encode them as JSONL [`BatchRecord`]s
//! 2. Upload the file with [`Files::upload_file`](files::Files::upload_file)
//! 3. Submit, poll or cancel the job with [`Batches`](batch::Batches)
//! 4. Fetch and decode the results as [`ResultRecord`]s
//!
//! Nothing is retried and no remote state is cached: every operation reports what the
//! service reports. Local preconditions (id syntax, file size and extension, tool linkage)
//! fail before any network call.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ai_batch_rust::{write_jsonl_file, BatchRecord, Client, FilePurpose, Message, ResultKind};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> ai_batch_rust::Result<()> {
//!     let client = Client::builder().api_key("sk-...").build()?;
//!
//!     let records: Vec<BatchRecord> = ["Tokyo", "Paris", "Lima"]
//!         .iter()
//!         .enumerate()
//!         .map(|(i, city)| {
//!             let req = client
//!                 .request()
//!                 .message(Message::system("Answer in one sentence."))
//!                 .message(Message::user(format!("Describe {}.", city)))
//!                 .max_tokens(100)
//!                 .build()?;
//!             Ok(BatchRecord::chat(format!("req-{}", i), req))
//!         })
//!         .collect::<ai_batch_rust::Result<_>>()?;
//!
//!     write_jsonl_file("cities.jsonl", &records).await?;
//!     let file = client.files().upload_file("cities.jsonl", FilePurpose::Batch).await?;
//!     let job = client.batches().submit_job(&file.id).await?;
//!     let job = client
//!         .batches()
//!         .wait_for_terminal(&job.id, Duration::from_secs(60))
//!         .await?;
//!
//!     for record in client.batches().fetch_results(&job.id, ResultKind::Completions).await? {
//!         println!("{} -> {:?}", record.custom_id, record.content());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`types`] | Envelopes, content parts, images, tools, response bodies |
//! | [`request`] | Validated, immutable chat completion payloads |
//! | [`jsonl`] | Batch submission encoding and result decoding |
//! | [`batch`] | Job state machine and lifecycle operations |
//! | [`files`] | File upload, listing, content and deletion |
//! | [`chat`] | Synchronous and streaming completion calls |
//! | [`stream`] | Line, chunk and accumulation stages for streamed bodies |
//! | [`client`] | Client, builder, configuration and call context |
//! | [`transport`] | HTTP round trips and error mapping |

pub mod batch;
pub mod chat;
pub mod client;
pub mod files;
pub mod jsonl;
pub mod request;
pub mod stream;
pub mod transport;
pub mod types;

// Re-export main types for convenience
pub use batch::{BatchJob, BatchStatus, StatusTracker};
pub use client::{BatchEndpoint, CallContext, Client, ClientBuilder, ClientConfig};
pub use files::{FilePurpose, FileRecord};
pub use jsonl::{
    decode_results, encode_records, write_jsonl_file, BatchRecord, DecodeOptions,
    KindMismatchPolicy, MalformedLinePolicy, ResultKind, ResultRecord,
};
pub use request::{ChatCompletionRequest, RequestBuilder};
pub use stream::{CompletionAccumulator, LineDecoder, LineEvent};
pub use types::{
    ContentPart, ImageDetail, ImageUrl, Message, ParameterSchema, Role, ToolCall, ToolChoice,
    ToolDefinition,
};

use futures::Stream;
use std::pin::Pin;

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// A unified pinned, boxed stream that emits `Result<T>`
pub type BoxStream<'a, T> = Pin<Box<dyn Stream<Item = Result<T>> + Send + 'a>>;

/// Error type for the library
pub mod error;
pub use error::{ApiError, Error, ErrorContext};
pub use transport::TransportError;
