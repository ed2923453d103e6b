//! 文件模块：上传、列出、查询、下载与删除远端文件。
//!
//! # Files
//!
//! | Operation | Endpoint |
//! |-----------|----------|
//! | [`Files::upload_file`] / [`Files::upload_bytes`] | `POST /v1/files` (multipart) |
//! | [`Files::list_files`] | `GET /v1/files` |
//! | [`Files::retrieve_file`] | `GET /v1/files/{id}` |
//! | [`Files::retrieve_content`] | `GET /v1/files/{id}/content` |
//! | [`Files::delete_file`] | `DELETE /v1/files/{id}` |
//!
//! A batch input file must be uploaded with [`FilePurpose::Batch`] and fully processed by
//! the service before a job can be submitted against it.

mod client;
mod types;

pub use client::Files;
pub use types::{DeletedFile, FileList, FilePurpose, FileRecord};
