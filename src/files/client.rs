//! File operations. Uploads stream straight from disk into the multipart body.

use super::types::{DeletedFile, FileList, FilePurpose, FileRecord};
use crate::client::validation::validate_file_id;
use crate::client::Client;
use crate::jsonl::BATCH_FILE_SIZE_LIMIT;
use crate::{Error, ErrorContext, Result};
use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use std::path::Path;
use tokio_util::io::ReaderStream;
use tracing::info;

const FILES_PATH: &str = "/v1/files";

pub struct Files<'a> {
    client: &'a Client,
}

impl<'a> Files<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// Upload a file from disk without reading it into memory.
    ///
    /// Size (at most 1 GiB) and extension are checked before any network call.
    pub async fn upload_file(
        &self,
        path: impl AsRef<Path>,
        purpose: FilePurpose,
    ) -> Result<FileRecord> {
        let path = path.as_ref();
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| upload_error(format!("no usable file name in '{}'", path.display()), "path"))?
            .to_string();
        check_extension(&filename, purpose)?;

        let file = tokio::fs::File::open(path).await?;
        let len = file.metadata().await?.len();
        check_size(len)?;

        let body = reqwest::Body::wrap_stream(ReaderStream::new(file));
        let part = Part::stream_with_length(body, len).file_name(filename.clone());
        self.send_upload(part, &filename, len, purpose).await
    }

    /// Upload in-memory content under `filename`. Same checks as [`upload_file`](Self::upload_file).
    pub async fn upload_bytes(
        &self,
        filename: impl Into<String>,
        data: impl Into<Bytes>,
        purpose: FilePurpose,
    ) -> Result<FileRecord> {
        let filename = filename.into();
        let data: Bytes = data.into();
        check_extension(&filename, purpose)?;
        let len = data.len() as u64;
        check_size(len)?;

        let part = Part::stream_with_length(reqwest::Body::from(data), len)
            .file_name(filename.clone());
        self.send_upload(part, &filename, len, purpose).await
    }

    async fn send_upload(
        &self,
        part: Part,
        filename: &str,
        len: u64,
        purpose: FilePurpose,
    ) -> Result<FileRecord> {
        let form = Form::new()
            .part("file", part)
            .text("purpose", purpose.as_str());
        let record: FileRecord = self
            .client
            .transport()
            .post_multipart(self.client.context(), FILES_PATH, form)
            .await?;
        info!(
            file_id = %record.id,
            filename,
            bytes = len,
            %purpose,
            "file uploaded"
        );
        Ok(record)
    }

    /// All files, optionally only those with `purpose`.
    pub async fn list_files(&self, purpose: Option<FilePurpose>) -> Result<FileList> {
        let query: Vec<(&str, String)> = purpose
            .map(|p| vec![("purpose", p.as_str().to_string())])
            .unwrap_or_default();
        self.client
            .transport()
            .get_json(self.client.context(), FILES_PATH, &query)
            .await
    }

    pub async fn retrieve_file(&self, file_id: &str) -> Result<FileRecord> {
        validate_file_id(file_id, "file_id")?;
        self.client
            .transport()
            .get_json(self.client.context(), &file_path(file_id), &[])
            .await
    }

    /// Raw content of a file, e.g. a batch output file.
    pub async fn retrieve_content(&self, file_id: &str) -> Result<Bytes> {
        validate_file_id(file_id, "file_id")?;
        let path = format!("{}/content", file_path(file_id));
        self.client
            .transport()
            .get_bytes(self.client.context(), &path)
            .await
    }

    pub async fn delete_file(&self, file_id: &str) -> Result<DeletedFile> {
        validate_file_id(file_id, "file_id")?;
        let deleted: DeletedFile = self
            .client
            .transport()
            .delete_json(self.client.context(), &file_path(file_id))
            .await?;
        info!(file_id, deleted = deleted.deleted, "file delete requested");
        Ok(deleted)
    }
}

fn file_path(file_id: &str) -> String {
    format!("{}/{}", FILES_PATH, file_id)
}

fn check_extension(filename: &str, purpose: FilePurpose) -> Result<()> {
    if purpose.requires_jsonl()
        && Path::new(filename).extension().and_then(|e| e.to_str()) != Some("jsonl")
    {
        return Err(upload_error(
            format!("'{}' uploads must be .jsonl files, got '{}'", purpose, filename),
            "filename",
        ));
    }
    Ok(())
}

fn check_size(len: u64) -> Result<()> {
    if len > BATCH_FILE_SIZE_LIMIT {
        return Err(upload_error(
            format!(
                "file is {} bytes, limit is {} bytes",
                len, BATCH_FILE_SIZE_LIMIT
            ),
            "file",
        ));
    }
    Ok(())
}

fn upload_error(msg: String, field: &str) -> Error {
    Error::validation_with_context(
        msg,
        ErrorContext::new()
            .with_field_path(field)
            .with_source("file_upload"),
    )
}
