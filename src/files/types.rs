//! File wire types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// What an uploaded file is for. Constrains which content the service accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FilePurpose {
    #[serde(rename = "fine-tune")]
    FineTune,
    #[serde(rename = "fine-tune-results")]
    FineTuneResults,
    #[serde(rename = "assistants")]
    Assistants,
    #[serde(rename = "assistants_output")]
    AssistantsOutput,
    #[serde(rename = "batch")]
    Batch,
    #[serde(rename = "batch_output")]
    BatchOutput,
    #[serde(rename = "user_data")]
    UserData,
    #[serde(rename = "responses")]
    Responses,
    #[serde(rename = "vision")]
    Vision,
    #[serde(rename = "evals")]
    Evals,
}

impl FilePurpose {
    pub fn as_str(&self) -> &'static str {
        match self {
            FilePurpose::FineTune => "fine-tune",
            FilePurpose::FineTuneResults => "fine-tune-results",
            FilePurpose::Assistants => "assistants",
            FilePurpose::AssistantsOutput => "assistants_output",
            FilePurpose::Batch => "batch",
            FilePurpose::BatchOutput => "batch_output",
            FilePurpose::UserData => "user_data",
            FilePurpose::Responses => "responses",
            FilePurpose::Vision => "vision",
            FilePurpose::Evals => "evals",
        }
    }

    /// Purposes whose uploads must be `.jsonl` files.
    pub fn requires_jsonl(&self) -> bool {
        matches!(self, FilePurpose::Batch | FilePurpose::FineTune)
    }
}

impl fmt::Display for FilePurpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Metadata of an uploaded file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    pub id: String,
    #[serde(default)]
    pub object: String,
    #[serde(default)]
    pub bytes: u64,
    #[serde(default)]
    pub created_at: i64,
    #[serde(default)]
    pub filename: String,
    /// Kept as text: the service may report purposes this client does not model.
    #[serde(default)]
    pub purpose: String,
}

impl FileRecord {
    pub fn purpose(&self) -> Option<FilePurpose> {
        serde_json::from_value(serde_json::Value::String(self.purpose.clone())).ok()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileList {
    pub object: String,
    pub data: Vec<FileRecord>,
    pub has_more: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DeletedFile {
    pub id: String,
    pub object: String,
    pub deleted: bool,
}
