//! Result side: heterogeneous result lines decoded by a caller-declared kind.
//!
//! Result lines are not self-describing about which endpoint produced them, so the caller
//! passes [`ResultKind`]. A wrong kind does not fail by default: the body decodes to the
//! kind's zero value and a warning is logged. Use [`KindMismatchPolicy::Reject`] to make
//! that a hard error.

use crate::types::completion::CHAT_COMPLETION_OBJECT;
use crate::types::embeddings::EMBEDDINGS_OBJECT;
use crate::types::{ChatCompletionResponse, EmbeddingsResponse};
use crate::{Error, ErrorContext, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

/// Shape of the `response.body` in a result file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultKind {
    #[default]
    Completions,
    Embeddings,
}

impl ResultKind {
    /// `object` tag a body of this kind carries.
    pub fn object_tag(&self) -> &'static str {
        match self {
            ResultKind::Completions => CHAT_COMPLETION_OBJECT,
            ResultKind::Embeddings => EMBEDDINGS_OBJECT,
        }
    }
}

/// What to do with a line that is not valid JSON or violates the record schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MalformedLinePolicy {
    /// Abort the whole decode at the first bad line.
    #[default]
    FailFast,
    /// Drop the line with a warning and keep going.
    Skip,
}

/// What to do when a body's `object` tag disagrees with the requested [`ResultKind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KindMismatchPolicy {
    /// Substitute the kind's zero-valued body.
    #[default]
    ZeroValue,
    Reject,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DecodeOptions {
    pub malformed: MalformedLinePolicy,
    pub kind_mismatch: KindMismatchPolicy,
}

impl DecodeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn malformed(mut self, policy: MalformedLinePolicy) -> Self {
        self.malformed = policy;
        self
    }

    pub fn kind_mismatch(mut self, policy: KindMismatchPolicy) -> Self {
        self.kind_mismatch = policy;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ResultBody {
    Completion(ChatCompletionResponse),
    Embeddings(EmbeddingsResponse),
}

impl ResultBody {
    pub fn kind(&self) -> ResultKind {
        match self {
            ResultBody::Completion(_) => ResultKind::Completions,
            ResultBody::Embeddings(_) => ResultKind::Embeddings,
        }
    }

    pub fn completion(&self) -> Option<&ChatCompletionResponse> {
        match self {
            ResultBody::Completion(c) => Some(c),
            _ => None,
        }
    }

    pub fn embeddings(&self) -> Option<&EmbeddingsResponse> {
        match self {
            ResultBody::Embeddings(e) => Some(e),
            _ => None,
        }
    }

    /// True for the zero-valued body substituted on a kind mismatch.
    pub fn is_zero(&self) -> bool {
        match self {
            ResultBody::Completion(c) => c.is_empty(),
            ResultBody::Embeddings(e) => *e == EmbeddingsResponse::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResultResponse {
    pub status_code: u16,
    pub request_id: String,
    pub body: ResultBody,
}

/// Per-request failure recorded in a result line.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RecordError {
    /// Numeric codes are kept as their decimal text.
    #[serde(default, deserialize_with = "crate::error::lenient_code")]
    pub code: Option<String>,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub param: Option<String>,
    /// Line of the submission file the failure refers to, when the service reports it.
    #[serde(default)]
    pub line: Option<u64>,
}

/// One decoded result line. `error` is present iff the request failed.
///
/// `response` only carries 2xx bodies. For a non-2xx line the body's error becomes `error`,
/// `response` is `None` and the HTTP status stays available in `status_code`.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultRecord {
    pub id: String,
    pub custom_id: String,
    pub status_code: Option<u16>,
    pub response: Option<ResultResponse>,
    pub error: Option<RecordError>,
}

impl ResultRecord {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
            && self
                .status_code
                .map_or(false, |s| (200..300).contains(&s))
    }

    pub fn body(&self) -> Option<&ResultBody> {
        self.response.as_ref().map(|r| &r.body)
    }

    /// Text of the first choice for completion results.
    pub fn content(&self) -> Option<&str> {
        self.body()
            .and_then(|b| b.completion())
            .and_then(|c| c.content())
    }
}

#[derive(Deserialize)]
struct RawRecord {
    #[serde(default)]
    id: String,
    custom_id: String,
    #[serde(default)]
    response: Option<RawResponse>,
    #[serde(default)]
    error: Option<RecordError>,
}

#[derive(Deserialize)]
struct RawResponse {
    status_code: u16,
    #[serde(default)]
    request_id: String,
    #[serde(default)]
    body: Value,
}

#[derive(Deserialize)]
struct BodyError {
    error: RecordError,
}

/// Decode a result file with the default strict options.
pub fn decode_results(data: &[u8], kind: ResultKind) -> Result<Vec<ResultRecord>> {
    decode_results_with(data, kind, &DecodeOptions::default())
}

pub fn decode_results_with(
    data: &[u8],
    kind: ResultKind,
    options: &DecodeOptions,
) -> Result<Vec<ResultRecord>> {
    let mut records = Vec::new();
    let mut skipped = 0usize;
    for (lineno, line) in super::lines(data) {
        match decode_line(line, lineno, kind, options) {
            Ok(record) => records.push(record),
            Err(e) if e.is_decode() && options.malformed == MalformedLinePolicy::Skip => {
                warn!(line = lineno, error = %e, "skipping malformed result line");
                skipped += 1;
            }
            Err(e) => return Err(e),
        }
    }
    debug!(records = records.len(), skipped, ?kind, "decoded result file");
    Ok(records)
}

fn decode_line(
    line: &[u8],
    lineno: usize,
    kind: ResultKind,
    options: &DecodeOptions,
) -> Result<ResultRecord> {
    let raw: RawRecord = serde_json::from_slice(line).map_err(|e| {
        malformed(lineno, format!("malformed result line {}: {}", lineno, e))
    })?;

    let mut error = raw.error;
    let status_code = raw.response.as_ref().map(|r| r.status_code);
    let response = match raw.response {
        Some(resp) if (200..300).contains(&resp.status_code) => {
            let body = decode_body(resp.body, lineno, kind, options)?;
            Some(ResultResponse {
                status_code: resp.status_code,
                request_id: resp.request_id,
                body,
            })
        }
        Some(resp) => {
            if error.is_none() {
                error = Some(lift_body_error(resp.body, resp.status_code));
            }
            None
        }
        None => None,
    };

    Ok(ResultRecord {
        id: raw.id,
        custom_id: raw.custom_id,
        status_code,
        response,
        error,
    })
}

/// Error carried by a non-2xx body, or a generic one naming the status when the body has none.
fn lift_body_error(body: Value, status_code: u16) -> RecordError {
    match serde_json::from_value::<BodyError>(body) {
        Ok(b) => b.error,
        Err(_) => RecordError {
            message: format!("request failed with HTTP status {}", status_code),
            ..Default::default()
        },
    }
}

fn decode_body(
    body: Value,
    lineno: usize,
    kind: ResultKind,
    options: &DecodeOptions,
) -> Result<ResultBody> {
    let tag = body.get("object").and_then(Value::as_str);
    if let Some(tag) = tag {
        if tag != kind.object_tag() {
            match options.kind_mismatch {
                KindMismatchPolicy::ZeroValue => {
                    warn!(
                        line = lineno,
                        expected = kind.object_tag(),
                        found = tag,
                        "result body kind mismatch, substituting zero value"
                    );
                    return Ok(zero_body(kind));
                }
                KindMismatchPolicy::Reject => {
                    return Err(Error::decode_with_context(
                        format!(
                            "result body on line {} is '{}', expected '{}'",
                            lineno,
                            tag,
                            kind.object_tag()
                        ),
                        ErrorContext::new()
                            .with_field_path(format!("line {}.response.body.object", lineno))
                            .with_source("jsonl_decoder"),
                    ));
                }
            }
        }
    }

    match kind {
        ResultKind::Completions => parse_body(body, lineno).map(ResultBody::Completion),
        ResultKind::Embeddings => parse_body(body, lineno).map(ResultBody::Embeddings),
    }
}

fn parse_body<T: DeserializeOwned>(body: Value, lineno: usize) -> Result<T> {
    if body.is_null() {
        return serde_json::from_value(Value::Object(Default::default()))
            .map_err(|e| malformed(lineno, format!("empty body on line {}: {}", lineno, e)));
    }
    serde_json::from_value(body).map_err(|e| {
        malformed(
            lineno,
            format!("result body on line {} violates schema: {}", lineno, e),
        )
    })
}

fn zero_body(kind: ResultKind) -> ResultBody {
    match kind {
        ResultKind::Completions => ResultBody::Completion(ChatCompletionResponse::default()),
        ResultKind::Embeddings => ResultBody::Embeddings(EmbeddingsResponse::default()),
    }
}

fn malformed(lineno: usize, msg: String) -> Error {
    Error::decode_with_context(
        msg,
        ErrorContext::new()
            .with_field_path(format!("line {}", lineno))
            .with_source("jsonl_decoder"),
    )
}
