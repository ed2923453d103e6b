//! Mock HTTP server setup for integration tests

use ai_batch_rust::Client;
use mockito::{Matcher, Mock, Server, ServerGuard};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

pub const TEST_API_KEY: &str = "sk-test-key";

/// Test fixture that manages a mock server
pub struct MockServerFixture {
    pub server: Arc<Mutex<ServerGuard>>,
    pub base_url: String,
}

impl MockServerFixture {
    pub async fn new() -> Self {
        init_tracing();
        let server = Server::new_async().await;
        let base_url = server.url();
        Self {
            server: Arc::new(Mutex::new(server)),
            base_url,
        }
    }

    /// Client pointed at the mock server with a fixed test key
    pub fn client(&self) -> Client {
        Client::builder()
            .api_key(TEST_API_KEY)
            .base_url(&self.base_url)
            .timeout(Duration::from_secs(5))
            .build()
            .expect("test client")
    }

    /// JSON response for `method path`, requiring the bearer token
    pub async fn mock_json(&self, method: &str, path: &str, status: usize, body: &str) -> Mock {
        let mut server = self.server.lock().await;
        server
            .mock(method, path)
            .match_header("authorization", format!("Bearer {}", TEST_API_KEY).as_str())
            .with_status(status)
            .with_header("content-type", "application/json")
            .with_body(body)
            .create_async()
            .await
    }

    /// Mock that must never be hit
    pub async fn mock_never(&self, method: &str, path: Matcher) -> Mock {
        let mut server = self.server.lock().await;
        server
            .mock(method, path)
            .with_status(500)
            .expect(0)
            .create_async()
            .await
    }

    /// Plain-text body, e.g. a JSONL result file
    pub async fn mock_text(&self, method: &str, path: &str, body: &str) -> Mock {
        let mut server = self.server.lock().await;
        server
            .mock(method, path)
            .with_status(200)
            .with_header("content-type", "application/octet-stream")
            .with_body(body)
            .create_async()
            .await
    }

    /// Each hit answers with the next body in `bodies`; the last one repeats.
    pub async fn mock_json_sequence(&self, method: &str, path: &str, bodies: Vec<String>) -> Mock {
        let hits = Arc::new(AtomicUsize::new(0));
        let mut server = self.server.lock().await;
        server
            .mock(method, path)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body_from_request(move |_| {
                let i = hits.fetch_add(1, Ordering::SeqCst);
                bodies[i.min(bodies.len() - 1)].clone().into_bytes()
            })
            .create_async()
            .await
    }

    /// Line-delimited streaming body for `POST path`
    pub async fn mock_stream(&self, path: &str, body: &str) -> Mock {
        let mut server = self.server.lock().await;
        server
            .mock("POST", path)
            .match_body(Matcher::PartialJsonString(r#"{"stream": true}"#.to_string()))
            .with_status(200)
            .with_header("content-type", "text/event-stream")
            .with_body(body)
            .create_async()
            .await
    }
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Batch job JSON in the service's shape
pub fn batch_json(id: &str, status: &str, output: Option<&str>, error: Option<&str>) -> String {
    serde_json::json!({
        "id": id,
        "object": "batch",
        "endpoint": "/v1/chat/completions",
        "errors": null,
        "input_file_id": "file-input1",
        "completion_window": "24h",
        "status": status,
        "output_file_id": output,
        "error_file_id": error,
        "created_at": 1714508499,
        "in_progress_at": null,
        "expires_at": 1714594899,
        "completed_at": null,
        "failed_at": null,
        "expired_at": null,
        "request_counts": {"total": 3, "completed": 2, "failed": 1},
        "metadata": null
    })
    .to_string()
}
