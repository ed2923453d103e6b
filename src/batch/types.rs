//! Batch job wire types.

use super::status::BatchStatus;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Completion window every job is submitted with.
pub const DEFAULT_COMPLETION_WINDOW: &str = "24h";

/// Snapshot of a remote batch job. A fresh value is returned by every poll.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchJob {
    pub id: String,
    #[serde(default)]
    pub object: String,
    #[serde(default)]
    pub endpoint: String,
    pub status: BatchStatus,
    #[serde(default)]
    pub input_file_id: String,
    #[serde(default)]
    pub output_file_id: Option<String>,
    #[serde(default)]
    pub error_file_id: Option<String>,
    #[serde(default)]
    pub completion_window: String,
    #[serde(default)]
    pub errors: Option<BatchErrors>,
    #[serde(default)]
    pub request_counts: RequestCounts,
    #[serde(default)]
    pub metadata: Option<HashMap<String, String>>,

    /// Unix seconds.
    #[serde(default)]
    pub created_at: i64,
    #[serde(default)]
    pub in_progress_at: Option<i64>,
    #[serde(default)]
    pub expires_at: Option<i64>,
    #[serde(default)]
    pub finalizing_at: Option<i64>,
    #[serde(default)]
    pub completed_at: Option<i64>,
    #[serde(default)]
    pub failed_at: Option<i64>,
    #[serde(default)]
    pub expired_at: Option<i64>,
    #[serde(default)]
    pub cancelling_at: Option<i64>,
    #[serde(default)]
    pub cancelled_at: Option<i64>,
}

impl BatchJob {
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Output file id, treating `""` as absent.
    pub fn output_file(&self) -> Option<&str> {
        non_empty(&self.output_file_id)
    }

    pub fn error_file(&self) -> Option<&str> {
        non_empty(&self.error_file_id)
    }

    /// Whether results can be fetched: completed, or any terminal state with an error file.
    pub fn has_results(&self) -> bool {
        match self.status {
            BatchStatus::Completed => self.output_file().is_some() || self.error_file().is_some(),
            s if s.is_terminal() => self.error_file().is_some(),
            _ => false,
        }
    }
}

fn non_empty(id: &Option<String>) -> Option<&str> {
    id.as_deref().filter(|s| !s.is_empty())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RequestCounts {
    pub total: u32,
    pub completed: u32,
    pub failed: u32,
}

impl RequestCounts {
    pub fn pending(&self) -> u32 {
        self.total.saturating_sub(self.completed + self.failed)
    }
}

/// Job-level validation errors (as opposed to per-request failures in the error file).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchErrors {
    pub object: String,
    pub data: Vec<BatchErrorEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchErrorEntry {
    pub code: String,
    pub message: String,
    pub param: Option<String>,
    pub line: Option<u64>,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct CreateBatchRequest<'a> {
    pub input_file_id: &'a str,
    pub endpoint: &'a str,
    pub completion_window: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<&'a HashMap<String, String>>,
}

/// One page of jobs, newest first.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchList {
    pub object: String,
    pub data: Vec<BatchJob>,
    pub first_id: Option<String>,
    pub last_id: Option<String>,
    pub has_more: bool,
}

/// Cursor pagination for listing jobs.
#[derive(Debug, Clone, Default)]
pub struct ListBatchesQuery {
    after: Option<String>,
    limit: Option<u32>,
}

impl ListBatchesQuery {
    pub const DEFAULT_LIMIT: u32 = 20;
    pub const MAX_LIMIT: u32 = 100;

    pub fn new() -> Self {
        Self::default()
    }

    /// Return jobs after this id (the previous page's `last_id`).
    pub fn after(mut self, id: impl Into<String>) -> Self {
        self.after = Some(id.into());
        self
    }

    /// Page size. Values outside `1..=100` fall back to 20.
    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub(crate) fn effective_limit(&self) -> u32 {
        match self.limit {
            Some(l) if (1..=Self::MAX_LIMIT).contains(&l) => l,
            _ => Self::DEFAULT_LIMIT,
        }
    }

    pub(crate) fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut q = vec![("limit", self.effective_limit().to_string())];
        if let Some(after) = &self.after {
            q.push(("after", after.clone()));
        }
        q
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_batch_job() {
        let job: BatchJob = serde_json::from_value(json!({
            "id": "batch_abc123",
            "object": "batch",
            "endpoint": "/v1/chat/completions",
            "errors": null,
            "input_file_id": "file-abc123",
            "completion_window": "24h",
            "status": "in_progress",
            "output_file_id": null,
            "error_file_id": "",
            "created_at": 1711471533,
            "in_progress_at": 1711471538,
            "expires_at": 1711557933,
            "request_counts": {"total": 100, "completed": 40, "failed": 2},
            "metadata": {"customer_id": "user_123"}
        }))
        .unwrap();
        assert_eq!(job.status, BatchStatus::InProgress);
        assert_eq!(job.request_counts.pending(), 58);
        assert_eq!(job.output_file(), None);
        assert_eq!(job.error_file(), None);
        assert_eq!(job.in_progress_at, Some(1711471538));
        assert_eq!(job.completed_at, None);
        assert!(!job.has_results());
        assert_eq!(
            job.metadata.as_ref().and_then(|m| m.get("customer_id")).map(String::as_str),
            Some("user_123")
        );
    }

    #[test]
    fn test_failed_job_errors() {
        let job: BatchJob = serde_json::from_value(json!({
            "id": "batch_x",
            "status": "failed",
            "errors": {"object": "list", "data": [
                {"code": "invalid_json_line", "message": "bad line", "param": null, "line": 3}
            ]}
        }))
        .unwrap();
        let errors = job.errors.unwrap();
        assert_eq!(errors.data[0].line, Some(3));
        assert!(job.status.is_terminal());
    }

    #[test]
    fn test_list_limit_clamp() {
        assert_eq!(ListBatchesQuery::new().effective_limit(), 20);
        assert_eq!(ListBatchesQuery::new().limit(0).effective_limit(), 20);
        assert_eq!(ListBatchesQuery::new().limit(101).effective_limit(), 20);
        assert_eq!(ListBatchesQuery::new().limit(100).effective_limit(), 100);
        let q = ListBatchesQuery::new().limit(5).after("batch_prev").to_query();
        assert_eq!(
            q,
            vec![("limit", "5".to_string()), ("after", "batch_prev".to_string())]
        );
    }

    #[test]
    fn test_create_request_shape() {
        let req = CreateBatchRequest {
            input_file_id: "file-1",
            endpoint: "/v1/chat/completions",
            completion_window: DEFAULT_COMPLETION_WINDOW,
            metadata: None,
        };
        assert_eq!(
            serde_json::to_value(&req).unwrap(),
            json!({"input_file_id": "file-1", "endpoint": "/v1/chat/completions", "completion_window": "24h"})
        );
    }
}
