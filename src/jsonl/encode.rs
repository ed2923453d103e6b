//! Submission side: one `{custom_id, method, url, body}` object per line.

use crate::request::ChatCompletionRequest;
use crate::{Error, ErrorContext, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, info, warn};

/// Hard upper bound on a submission file (1 GiB).
pub const BATCH_FILE_SIZE_LIMIT: u64 = 1024 * 1024 * 1024;

/// Endpoint path of chat completion records.
pub const CHAT_COMPLETIONS_URL: &str = "/v1/chat/completions";
/// Endpoint path of embedding records.
pub const EMBEDDINGS_URL: &str = "/v1/embeddings";

/// One line of a batch submission file.
///
/// `B` is the request body; chat completion payloads by default, [`EmbeddingsRequest`] for
/// embedding batches.
///
/// [`EmbeddingsRequest`]: crate::types::EmbeddingsRequest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchRecord<B = ChatCompletionRequest> {
    pub custom_id: String,
    pub method: String,
    pub url: String,
    pub body: B,
}

impl BatchRecord<ChatCompletionRequest> {
    pub fn chat(custom_id: impl Into<String>, body: ChatCompletionRequest) -> Self {
        Self::new(custom_id, CHAT_COMPLETIONS_URL, body)
    }
}

impl BatchRecord<crate::types::EmbeddingsRequest> {
    pub fn embeddings(custom_id: impl Into<String>, body: crate::types::EmbeddingsRequest) -> Self {
        Self::new(custom_id, EMBEDDINGS_URL, body)
    }
}

impl<B> BatchRecord<B> {
    pub fn new(custom_id: impl Into<String>, url: impl Into<String>, body: B) -> Self {
        Self {
            custom_id: custom_id.into(),
            method: "POST".to_string(),
            url: url.into(),
            body,
        }
    }
}

/// Encode records as JSONL. Every line is newline-terminated; there are no blank lines.
///
/// Fails before producing anything if the set is empty, a `custom_id` is empty or repeated,
/// or the output would exceed [`BATCH_FILE_SIZE_LIMIT`].
pub fn encode_records<B: Serialize>(records: &[BatchRecord<B>]) -> Result<Vec<u8>> {
    validate_records(records)?;

    let mut out = Vec::new();
    for (i, record) in records.iter().enumerate() {
        serde_json::to_writer(&mut out, record)?;
        out.push(b'\n');
        check_size(out.len() as u64, i)?;
    }
    debug!(records = records.len(), bytes = out.len(), "encoded batch records");
    Ok(out)
}

/// Write records to a `.jsonl` file, streaming line by line. Returns the byte count written.
///
/// The size limit is enforced while writing. On any failure after the file is created the
/// partial file is removed before the error is returned.
pub async fn write_jsonl_file<B: Serialize>(
    path: impl AsRef<Path>,
    records: &[BatchRecord<B>],
) -> Result<u64> {
    let path = path.as_ref();
    if path.extension().and_then(|e| e.to_str()) != Some("jsonl") {
        return Err(Error::validation_with_context(
            format!("batch file must have a .jsonl extension: {}", path.display()),
            ErrorContext::new()
                .with_field_path("path")
                .with_source("jsonl_encoder"),
        ));
    }
    validate_records(records)?;

    let file = tokio::fs::File::create(path).await?;
    let written = match write_lines(file, records).await {
        Ok(written) => written,
        Err(e) => {
            match tokio::fs::remove_file(path).await {
                Ok(()) => warn!(path = %path.display(), error = %e, "removed partial batch file"),
                Err(rm) => warn!(
                    path = %path.display(),
                    error = %e,
                    remove_error = %rm,
                    "could not remove partial batch file"
                ),
            }
            return Err(e);
        }
    };

    info!(
        path = %path.display(),
        records = records.len(),
        bytes = written,
        "wrote batch file"
    );
    Ok(written)
}

async fn write_lines<B: Serialize>(
    file: tokio::fs::File,
    records: &[BatchRecord<B>],
) -> Result<u64> {
    let mut writer = BufWriter::new(file);
    let mut written: u64 = 0;
    let mut line = Vec::new();
    for (i, record) in records.iter().enumerate() {
        line.clear();
        serde_json::to_writer(&mut line, record)?;
        line.push(b'\n');
        written += line.len() as u64;
        check_size(written, i)?;
        writer.write_all(&line).await?;
    }
    writer.flush().await?;
    Ok(written)
}

/// Parse a submission file back into records. Blank lines are skipped; any malformed line fails.
pub fn decode_records<B: DeserializeOwned>(data: &[u8]) -> Result<Vec<BatchRecord<B>>> {
    let mut records = Vec::new();
    for (lineno, line) in super::lines(data) {
        let record = serde_json::from_slice(line).map_err(|e| {
            Error::decode_with_context(
                format!("malformed submission record on line {}: {}", lineno, e),
                ErrorContext::new()
                    .with_field_path(format!("line {}", lineno))
                    .with_source("jsonl_decoder"),
            )
        })?;
        records.push(record);
    }
    Ok(records)
}

fn validate_records<B>(records: &[BatchRecord<B>]) -> Result<()> {
    if records.is_empty() {
        return Err(Error::validation_with_context(
            "batch must contain at least one record",
            ErrorContext::new()
                .with_field_path("records")
                .with_source("jsonl_encoder"),
        ));
    }
    let mut seen = HashSet::with_capacity(records.len());
    for (i, record) in records.iter().enumerate() {
        if record.custom_id.is_empty() {
            return Err(Error::validation_with_context(
                "custom_id must not be empty",
                ErrorContext::new()
                    .with_field_path(format!("records[{}].custom_id", i))
                    .with_source("jsonl_encoder"),
            ));
        }
        if !seen.insert(record.custom_id.as_str()) {
            return Err(Error::validation_with_context(
                format!("duplicate custom_id '{}'", record.custom_id),
                ErrorContext::new()
                    .with_field_path(format!("records[{}].custom_id", i))
                    .with_source("jsonl_encoder"),
            ));
        }
    }
    Ok(())
}

fn check_size(total: u64, index: usize) -> Result<()> {
    if total > BATCH_FILE_SIZE_LIMIT {
        return Err(Error::validation_with_context(
            format!(
                "batch file exceeds {} bytes at record {}",
                BATCH_FILE_SIZE_LIMIT, index
            ),
            ErrorContext::new()
                .with_field_path(format!("records[{}]", index))
                .with_source("jsonl_encoder"),
        ));
    }
    Ok(())
}
