//! Batch job lifecycle against a mock service: submit, poll, cancel, list, fetch, wait.

mod integration;

use ai_batch_rust::batch::ListBatchesQuery;
use ai_batch_rust::{BatchStatus, CallContext, Error, ResultKind, TransportError};
use integration::mock_server::{batch_json, MockServerFixture};
use mockito::Matcher;
use serde_json::json;
use std::collections::HashMap;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

const SUCCESS_1: &str = r#"{"id":"batch_req_1","custom_id":"req-1","response":{"status_code":200,"request_id":"r1","body":{"id":"chatcmpl-1","object":"chat.completion","created":1,"model":"gpt-4o-mini","choices":[{"index":0,"message":{"role":"assistant","content":"Tokyo is big."},"finish_reason":"stop"}],"usage":{"prompt_tokens":10,"completion_tokens":4,"total_tokens":14}}},"error":null}"#;
const SUCCESS_2: &str = r#"{"id":"batch_req_2","custom_id":"req-2","response":{"status_code":200,"request_id":"r2","body":{"id":"chatcmpl-2","object":"chat.completion","created":1,"model":"gpt-4o-mini","choices":[{"index":0,"message":{"role":"assistant","content":"Paris is old."},"finish_reason":"stop"}],"usage":{"prompt_tokens":10,"completion_tokens":4,"total_tokens":14}}},"error":null}"#;
const FAILURE_400: &str = r#"{"id":"batch_req_4","custom_id":"req-4","response":{"status_code":400,"request_id":"r4","body":{"error":{"message":"Invalid 'messages[0].content'","type":"invalid_request_error","param":"messages","code":null}}},"error":null}"#;
const FAILURE_3: &str = r#"{"id":"batch_req_3","custom_id":"req-3","response":null,"error":{"code":"model_not_found","message":"The model does not exist"}}"#;

#[tokio::test]
async fn test_submit_job_uses_fixed_configuration() {
    let fixture = MockServerFixture::new().await;
    let mock = {
        let mut server = fixture.server.lock().await;
        server
            .mock("POST", "/v1/batches")
            .match_body(Matcher::Json(json!({
                "input_file_id": "file-input1",
                "endpoint": "/v1/chat/completions",
                "completion_window": "24h"
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(batch_json("batch_abc", "validating", None, None))
            .create_async()
            .await
    };

    let client = fixture.client();
    let job = client.batches().submit_job("file-input1").await.unwrap();
    assert_eq!(job.id, "batch_abc");
    assert_eq!(job.status, BatchStatus::Created);
    assert_eq!(job.completion_window, "24h");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_submit_job_with_metadata() {
    let fixture = MockServerFixture::new().await;
    let mock = {
        let mut server = fixture.server.lock().await;
        server
            .mock("POST", "/v1/batches")
            .match_body(Matcher::PartialJson(json!({"metadata": {"run": "nightly"}})))
            .with_status(200)
            .with_body(batch_json("batch_meta", "validating", None, None))
            .create_async()
            .await
    };

    let client = fixture.client();
    let metadata = HashMap::from([("run".to_string(), "nightly".to_string())]);
    let job = client
        .batches()
        .submit_job_with_metadata("file-input1", &metadata)
        .await
        .unwrap();
    assert_eq!(job.id, "batch_meta");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_malformed_file_id_fails_before_network() {
    let fixture = MockServerFixture::new().await;
    let never = fixture
        .mock_never("POST", Matcher::Regex("^/v1/batches".to_string()))
        .await;

    let client = fixture.client();
    let err = client.batches().submit_job("input.jsonl").await.unwrap_err();
    assert!(err.is_validation());
    let err = client.batches().cancel_job("file-123").await.unwrap_err();
    assert!(err.is_validation());
    never.assert_async().await;
}

#[tokio::test]
async fn test_rejected_submission_surfaces_api_error() {
    let fixture = MockServerFixture::new().await;
    let _mock = fixture
        .mock_json(
            "POST",
            "/v1/batches",
            400,
            r#"{"error":{"message":"File is still processing","type":"invalid_request_error","param":"input_file_id","code":"file_not_ready"}}"#,
        )
        .await;

    let client = fixture.client();
    let err = client.batches().submit_job("file-input1").await.unwrap_err();
    let api = err.api_error().expect("api error");
    assert_eq!(api.status, 400);
    assert_eq!(api.code.as_deref(), Some("file_not_ready"));
    assert_eq!(api.param.as_deref(), Some("input_file_id"));
    assert_eq!(api.message, "File is still processing");
}

#[tokio::test]
async fn test_poll_and_cancel() {
    let fixture = MockServerFixture::new().await;
    let _poll = fixture
        .mock_json(
            "GET",
            "/v1/batches/batch_abc",
            200,
            &batch_json("batch_abc", "in_progress", None, None),
        )
        .await;
    let _cancel = fixture
        .mock_json(
            "POST",
            "/v1/batches/batch_abc/cancel",
            200,
            &batch_json("batch_abc", "cancelling", None, None),
        )
        .await;

    let client = fixture.client();
    let first = client.batches().poll_job("batch_abc").await.unwrap();
    let second = client.batches().poll_job("batch_abc").await.unwrap();
    assert_eq!(first, second);
    assert_eq!(first.status, BatchStatus::InProgress);
    assert_eq!(first.request_counts.total, 3);

    let cancelled = client.batches().cancel_job("batch_abc").await.unwrap();
    assert_eq!(cancelled.status, BatchStatus::Cancelling);
    assert!(!cancelled.is_terminal());
}

#[tokio::test]
async fn test_list_jobs_clamps_limit() {
    let fixture = MockServerFixture::new().await;
    let mock = {
        let mut server = fixture.server.lock().await;
        server
            .mock("GET", "/v1/batches")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("limit".into(), "20".into()),
                Matcher::UrlEncoded("after".into(), "batch_prev".into()),
            ]))
            .with_status(200)
            .with_body(format!(
                r#"{{"object":"list","data":[{}],"first_id":"batch_abc","last_id":"batch_abc","has_more":false}}"#,
                batch_json("batch_abc", "completed", Some("file-out1"), None)
            ))
            .create_async()
            .await
    };

    let client = fixture.client();
    let page = client
        .batches()
        .list_jobs(&ListBatchesQuery::new().limit(500).after("batch_prev"))
        .await
        .unwrap();
    assert_eq!(page.data.len(), 1);
    assert_eq!(page.last_id.as_deref(), Some("batch_abc"));
    assert!(!page.has_more);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_fetch_results_success_and_error_records() {
    let fixture = MockServerFixture::new().await;
    let _job = fixture
        .mock_json(
            "GET",
            "/v1/batches/batch_done",
            200,
            &batch_json("batch_done", "completed", Some("file-out1"), Some("file-err1")),
        )
        .await;
    let _out = fixture
        .mock_text(
            "GET",
            "/v1/files/file-out1/content",
            &format!("{}\n{}\n", SUCCESS_1, SUCCESS_2),
        )
        .await;
    let _err = fixture
        .mock_text("GET", "/v1/files/file-err1/content", &format!("{}\n", FAILURE_3))
        .await;

    let client = fixture.client();
    let records = client
        .batches()
        .fetch_results("batch_done", ResultKind::Completions)
        .await
        .unwrap();

    let ids: Vec<&str> = records.iter().map(|r| r.custom_id.as_str()).collect();
    assert_eq!(ids, vec!["req-1", "req-2", "req-3"]);

    assert!(records[0].response.is_some() && records[0].error.is_none());
    assert_eq!(records[0].content(), Some("Tokyo is big."));
    assert!(records[1].response.is_some() && records[1].error.is_none());
    assert!(records[2].response.is_none());
    assert_eq!(
        records[2].error.as_ref().and_then(|e| e.code.as_deref()),
        Some("model_not_found")
    );
}

#[tokio::test]
async fn test_fetch_results_failed_request_with_error_body() {
    let fixture = MockServerFixture::new().await;
    let _job = fixture
        .mock_json(
            "GET",
            "/v1/batches/batch_done",
            200,
            &batch_json("batch_done", "completed", Some("file-out1"), Some("file-err1")),
        )
        .await;
    let _out = fixture
        .mock_text("GET", "/v1/files/file-out1/content", &format!("{}\n", SUCCESS_1))
        .await;
    let _err = fixture
        .mock_text("GET", "/v1/files/file-err1/content", &format!("{}\n", FAILURE_400))
        .await;

    let client = fixture.client();
    let records = client
        .batches()
        .fetch_results("batch_done", ResultKind::Completions)
        .await
        .unwrap();
    assert_eq!(records.len(), 2);

    assert!(records[0].is_success());
    assert!(records[0].response.is_some() && records[0].error.is_none());

    let failed = &records[1];
    assert_eq!(failed.custom_id, "req-4");
    assert!(!failed.is_success());
    assert!(failed.response.is_none());
    assert_eq!(failed.status_code, Some(400));
    let err = failed.error.as_ref().unwrap();
    assert_eq!(err.message, "Invalid 'messages[0].content'");
    assert_eq!(err.param.as_deref(), Some("messages"));
}

#[tokio::test]
async fn test_fetch_results_with_wrong_kind_yields_zero_bodies() {
    let fixture = MockServerFixture::new().await;
    let _job = fixture
        .mock_json(
            "GET",
            "/v1/batches/batch_done",
            200,
            &batch_json("batch_done", "completed", Some("file-out1"), None),
        )
        .await;
    let _out = fixture
        .mock_text("GET", "/v1/files/file-out1/content", &format!("{}\n", SUCCESS_1))
        .await;

    let client = fixture.client();
    let records = client
        .batches()
        .fetch_results("batch_done", ResultKind::Embeddings)
        .await
        .unwrap();
    assert_eq!(records.len(), 1);
    let body = records[0].body().unwrap();
    assert!(body.is_zero());
    assert!(body.embeddings().unwrap().data.is_empty());
}

#[tokio::test]
async fn test_fetch_results_fails_fast_on_malformed_line() {
    let fixture = MockServerFixture::new().await;
    let _job = fixture
        .mock_json(
            "GET",
            "/v1/batches/batch_done",
            200,
            &batch_json("batch_done", "completed", Some("file-out1"), None),
        )
        .await;
    let _out = fixture
        .mock_text(
            "GET",
            "/v1/files/file-out1/content",
            &format!("{}\n{{\"custom_id\": \n{}\n", SUCCESS_1, SUCCESS_2),
        )
        .await;

    let client = fixture.client();
    let err = client
        .batches()
        .fetch_results("batch_done", ResultKind::Completions)
        .await
        .unwrap_err();
    assert!(err.is_decode());
}

#[tokio::test]
async fn test_fetch_results_requires_finished_job() {
    let fixture = MockServerFixture::new().await;
    let _job = fixture
        .mock_json(
            "GET",
            "/v1/batches/batch_busy",
            200,
            &batch_json("batch_busy", "in_progress", None, None),
        )
        .await;

    let client = fixture.client();
    let err = client
        .batches()
        .fetch_results("batch_busy", ResultKind::Completions)
        .await
        .unwrap_err();
    assert!(err.is_validation());
}

#[tokio::test]
async fn test_wait_for_terminal_follows_forward_path() {
    let fixture = MockServerFixture::new().await;
    let _seq = fixture
        .mock_json_sequence(
            "GET",
            "/v1/batches/batch_seq",
            vec![
                batch_json("batch_seq", "validating", None, None),
                batch_json("batch_seq", "in_progress", None, None),
                batch_json("batch_seq", "in_progress", None, None),
                batch_json("batch_seq", "finalizing", None, None),
                batch_json("batch_seq", "completed", Some("file-out1"), None),
            ],
        )
        .await;

    let client = fixture.client();
    let job = client
        .batches()
        .wait_for_terminal("batch_seq", Duration::from_millis(5))
        .await
        .unwrap();
    assert_eq!(job.status, BatchStatus::Completed);
    assert_eq!(job.output_file(), Some("file-out1"));
}

#[tokio::test]
async fn test_wait_for_terminal_rejects_regression() {
    let fixture = MockServerFixture::new().await;
    let _seq = fixture
        .mock_json_sequence(
            "GET",
            "/v1/batches/batch_back",
            vec![
                batch_json("batch_back", "finalizing", None, None),
                batch_json("batch_back", "in_progress", None, None),
            ],
        )
        .await;

    let client = fixture.client();
    let err = client
        .batches()
        .wait_for_terminal("batch_back", Duration::from_millis(5))
        .await
        .unwrap_err();
    assert!(err.is_decode());
}

#[tokio::test]
async fn test_cancelled_context_stops_calls() {
    let fixture = MockServerFixture::new().await;
    let never = fixture
        .mock_never("GET", Matcher::Regex("^/v1/batches".to_string()))
        .await;

    let token = CancellationToken::new();
    token.cancel();
    let client = fixture
        .client()
        .with_context(CallContext::new().with_cancellation(token));
    let err = client.batches().poll_job("batch_abc").await.unwrap_err();
    assert!(matches!(err, Error::Transport(TransportError::Cancelled)));
    never.assert_async().await;
}
