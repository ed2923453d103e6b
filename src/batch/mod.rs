//! 批处理作业模块：提交、轮询、取消与结果获取。
//!
//! # Batch Job Lifecycle
//!
//! Asynchronous bulk inference jobs tracked by a remote id and a monotonic status.
//!
//! ## Key Components
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`Batches`] | Submit, poll, cancel, list, fetch results, wait |
//! | [`BatchJob`] | Snapshot returned by every call; never cached |
//! | [`BatchStatus`] | `validating → in_progress → finalizing → completed/failed/expired`, or `→ cancelling → cancelled` |
//! | [`StatusTracker`] | Checks observed snapshots only move forward |
//!
//! ## Example
//!
//! ```rust,no_run
//! use ai_batch_rust::{Client, ResultKind};
//! use std::time::Duration;
//!
//! # async fn run() -> ai_batch_rust::Result<()> {
//! let client = Client::from_env()?;
//! let job = client.batches().submit_job("file-abc123").await?;
//! let done = client
//!     .batches()
//!     .wait_for_terminal(&job.id, Duration::from_secs(30))
//!     .await?;
//! let records = client
//!     .batches()
//!     .fetch_results(&done.id, ResultKind::Completions)
//!     .await?;
//! for r in records {
//!     println!("{}: {:?}", r.custom_id, r.content());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! Failures are never retried here: a non-2xx response is returned as
//! [`Error::Api`](crate::Error::Api) untouched.

mod orchestrator;
mod status;
mod types;

pub use orchestrator::Batches;
pub use status::{BatchStatus, StatusTracker, Transition};
pub use types::{
    BatchErrorEntry, BatchErrors, BatchJob, BatchList, ListBatchesQuery, RequestCounts,
    DEFAULT_COMPLETION_WINDOW,
};
