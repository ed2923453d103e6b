//! 资源标识校验：在发起任何网络请求之前检查文件/批处理 id 的语法。
//!
//! Local id syntax checks.

use crate::{Error, ErrorContext, Result};
use once_cell::sync::Lazy;
use regex::Regex;

static FILE_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^file-[A-Za-z0-9_-]+$").expect("file id pattern"));
static BATCH_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^batch_[A-Za-z0-9_-]+$").expect("batch id pattern"));

/// Reject a file reference that cannot possibly name a remote file.
pub(crate) fn validate_file_id(id: &str, field: &str) -> Result<()> {
    validate(&FILE_ID, id, field, "file id", "file-")
}

pub(crate) fn validate_batch_id(id: &str, field: &str) -> Result<()> {
    validate(&BATCH_ID, id, field, "batch id", "batch_")
}

fn validate(pattern: &Regex, id: &str, field: &str, what: &str, prefix: &str) -> Result<()> {
    if pattern.is_match(id) {
        return Ok(());
    }
    Err(Error::validation_with_context(
        format!("malformed {} '{}'", what, id),
        ErrorContext::new()
            .with_field_path(field)
            .with_details(format!("expected '{}' followed by [A-Za-z0-9_-]", prefix))
            .with_source("id_validator"),
    ))
}
