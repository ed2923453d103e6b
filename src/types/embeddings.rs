//! Embedding request and response bodies used by embedding batches.

use serde::{Deserialize, Serialize};

/// `object` tag of an embeddings response body.
pub const EMBEDDINGS_OBJECT: &str = "list";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingsRequest {
    pub model: String,
    pub input: EmbeddingInput,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encoding_format: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EmbeddingInput {
    Single(String),
    Batch(Vec<String>),
}

impl EmbeddingsRequest {
    pub fn single(model: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            input: EmbeddingInput::Single(text.into()),
            dimensions: None,
            encoding_format: None,
        }
    }

    pub fn batch(model: impl Into<String>, texts: Vec<String>) -> Self {
        Self {
            model: model.into(),
            input: EmbeddingInput::Batch(texts),
            dimensions: None,
            encoding_format: None,
        }
    }

    pub fn with_dimensions(mut self, dimensions: usize) -> Self {
        self.dimensions = Some(dimensions);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingsResponse {
    pub object: String,
    pub data: Vec<Embedding>,
    pub model: String,
    pub usage: EmbeddingUsage,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Embedding {
    pub object: String,
    pub index: usize,
    pub embedding: Vec<f32>,
}

impl Embedding {
    pub fn dimensions(&self) -> usize {
        self.embedding.len()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingUsage {
    pub prompt_tokens: u32,
    pub total_tokens: u32,
}

impl EmbeddingsResponse {
    pub fn first(&self) -> Option<&Embedding> {
        self.data.first()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_input_shapes() {
        let one = serde_json::to_value(EmbeddingsRequest::single("text-embedding-3-small", "hi")).unwrap();
        assert_eq!(one["input"], "hi");
        let many = serde_json::to_value(
            EmbeddingsRequest::batch("text-embedding-3-small", vec!["a".into(), "b".into()])
                .with_dimensions(256),
        )
        .unwrap();
        assert_eq!(many["input"], json!(["a", "b"]));
        assert_eq!(many["dimensions"], 256);
    }

    #[test]
    fn test_decode_response() {
        let resp: EmbeddingsResponse = serde_json::from_value(json!({
            "object": "list",
            "data": [{"object": "embedding", "index": 0, "embedding": [0.5, -0.25, 1.0]}],
            "model": "text-embedding-3-small",
            "usage": {"prompt_tokens": 2, "total_tokens": 2}
        }))
        .unwrap();
        assert_eq!(resp.len(), 1);
        assert_eq!(resp.first().map(|e| e.dimensions()), Some(3));
        assert_eq!(resp.usage.total_tokens, 2);
    }
}
