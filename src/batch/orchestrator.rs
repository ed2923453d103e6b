//! Batch job lifecycle: submit, poll, cancel, list, fetch results.
//!
//! Every operation is exactly one request/response round trip (fetching results is one per
//! result file). Nothing is cached between calls; polling cadence and retries belong to
//! the caller.

use super::status::StatusTracker;
use super::types::{BatchJob, BatchList, CreateBatchRequest, ListBatchesQuery};
use crate::client::validation::{validate_batch_id, validate_file_id};
use crate::client::Client;
use crate::jsonl::{decode_results_with, DecodeOptions, ResultKind, ResultRecord};
use crate::{Error, ErrorContext, Result};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info};

const BATCHES_PATH: &str = "/v1/batches";

/// Batch job operations, borrowed from a [`Client`].
pub struct Batches<'a> {
    client: &'a Client,
}

impl<'a> Batches<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// Create a job over an uploaded, processed input file.
    ///
    /// Endpoint and completion window come from the client configuration.
    pub async fn submit_job(&self, input_file_id: &str) -> Result<BatchJob> {
        self.create(input_file_id, None).await
    }

    /// Like [`submit_job`](Self::submit_job), tagging the job with caller metadata.
    pub async fn submit_job_with_metadata(
        &self,
        input_file_id: &str,
        metadata: &HashMap<String, String>,
    ) -> Result<BatchJob> {
        self.create(input_file_id, Some(metadata)).await
    }

    async fn create(
        &self,
        input_file_id: &str,
        metadata: Option<&HashMap<String, String>>,
    ) -> Result<BatchJob> {
        validate_file_id(input_file_id, "input_file_id")?;
        let config = self.client.config();
        let body = CreateBatchRequest {
            input_file_id,
            endpoint: config.batch_endpoint.path(),
            completion_window: &config.completion_window,
            metadata,
        };
        let job: BatchJob = self
            .client
            .transport()
            .post_json(self.client.context(), BATCHES_PATH, Some(&body))
            .await?;
        info!(
            job_id = %job.id,
            input_file_id,
            status = %job.status,
            "batch submitted"
        );
        Ok(job)
    }

    /// Fresh snapshot of the job's remote status.
    pub async fn poll_job(&self, job_id: &str) -> Result<BatchJob> {
        validate_batch_id(job_id, "job_id")?;
        let job: BatchJob = self
            .client
            .transport()
            .get_json(self.client.context(), &job_path(job_id), &[])
            .await?;
        debug!(
            job_id,
            status = %job.status,
            completed = job.request_counts.completed,
            failed = job.request_counts.failed,
            total = job.request_counts.total,
            "batch polled"
        );
        Ok(job)
    }

    /// Ask the service to cancel. Success means the request was accepted; the job is
    /// `cancelling` until a later poll observes `cancelled`.
    pub async fn cancel_job(&self, job_id: &str) -> Result<BatchJob> {
        validate_batch_id(job_id, "job_id")?;
        let path = format!("{}/cancel", job_path(job_id));
        let job: BatchJob = self
            .client
            .transport()
            .post_json::<(), _>(self.client.context(), &path, None)
            .await?;
        info!(job_id, status = %job.status, "batch cancel requested");
        Ok(job)
    }

    pub async fn list_jobs(&self, query: &ListBatchesQuery) -> Result<BatchList> {
        self.client
            .transport()
            .get_json(self.client.context(), BATCHES_PATH, &query.to_query())
            .await
    }

    /// Decode the job's output file, then its error file, with strict default options.
    ///
    /// `kind` selects the body shape and is not checked against the data; see
    /// [`KindMismatchPolicy`](crate::jsonl::KindMismatchPolicy).
    pub async fn fetch_results(&self, job_id: &str, kind: ResultKind) -> Result<Vec<ResultRecord>> {
        self.fetch_results_with(job_id, kind, &DecodeOptions::default())
            .await
    }

    pub async fn fetch_results_with(
        &self,
        job_id: &str,
        kind: ResultKind,
        options: &DecodeOptions,
    ) -> Result<Vec<ResultRecord>> {
        let job = self.poll_job(job_id).await?;
        if !job.has_results() {
            return Err(Error::validation_with_context(
                format!(
                    "batch {} has no results to fetch (status '{}')",
                    job_id, job.status
                ),
                ErrorContext::new()
                    .with_field_path("status")
                    .with_source("batch_orchestrator"),
            ));
        }

        let files = self.client.files();
        let mut records = Vec::new();
        for file_id in [job.output_file(), job.error_file()].into_iter().flatten() {
            let content = files.retrieve_content(file_id).await?;
            let decoded = decode_results_with(&content, kind, options)?;
            debug!(job_id, file_id, records = decoded.len(), "result file decoded");
            records.extend(decoded);
        }
        info!(job_id, records = records.len(), "batch results fetched");
        Ok(records)
    }

    /// Poll every `interval` until the job is terminal and return that snapshot.
    ///
    /// Each observed status is checked against the state machine; a regression or any
    /// failed poll ends the wait with that error. Honors the client's call context while
    /// sleeping.
    pub async fn wait_for_terminal(&self, job_id: &str, interval: Duration) -> Result<BatchJob> {
        let mut tracker = StatusTracker::new(job_id);
        loop {
            let job = self.poll_job(job_id).await?;
            tracker.observe(job.status)?;
            if job.is_terminal() {
                return Ok(job);
            }
            self.client
                .context()
                .run(async {
                    tokio::time::sleep(interval).await;
                    Ok(())
                })
                .await?;
        }
    }
}

fn job_path(job_id: &str) -> String {
    format!("{}/{}", BATCHES_PATH, job_id)
}
