//! File operations against a mock service.

mod integration;

use ai_batch_rust::{FilePurpose, Message, RequestBuilder};
use ai_batch_rust::{write_jsonl_file, BatchRecord};
use integration::mock_server::MockServerFixture;
use mockito::Matcher;

const FILE_JSON: &str = r#"{"id":"file-abc123","object":"file","bytes":321,"created_at":1714508499,"filename":"requests.jsonl","purpose":"batch"}"#;

fn temp_dir() -> std::path::PathBuf {
    let dir = std::env::temp_dir().join(format!("ai-batch-files-{}", uuid::Uuid::new_v4()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

#[tokio::test]
async fn test_upload_file_streams_multipart() {
    let fixture = MockServerFixture::new().await;
    let dir = temp_dir();
    let path = dir.join("requests.jsonl");

    let record = BatchRecord::chat(
        "req-1",
        RequestBuilder::new("gpt-4o-mini")
            .message(Message::user("hello"))
            .build()
            .unwrap(),
    );
    write_jsonl_file(&path, &[record]).await.unwrap();

    let mock = {
        let mut server = fixture.server.lock().await;
        server
            .mock("POST", "/v1/files")
            .match_header(
                "content-type",
                Matcher::Regex("^multipart/form-data; boundary=".to_string()),
            )
            .match_body(Matcher::AllOf(vec![
                Matcher::Regex(r#"name="purpose"\r\n\r\nbatch"#.to_string()),
                Matcher::Regex(r#"name="file"; filename="requests.jsonl""#.to_string()),
                Matcher::Regex(r#""custom_id":"req-1""#.to_string()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(FILE_JSON)
            .create_async()
            .await
    };

    let client = fixture.client();
    let uploaded = client
        .files()
        .upload_file(&path, FilePurpose::Batch)
        .await
        .unwrap();
    assert_eq!(uploaded.id, "file-abc123");
    assert_eq!(uploaded.purpose(), Some(FilePurpose::Batch));
    mock.assert_async().await;

    std::fs::remove_dir_all(&dir).unwrap();
}

#[tokio::test]
async fn test_upload_rejects_non_jsonl_batch_file() {
    let fixture = MockServerFixture::new().await;
    let never = fixture.mock_never("POST", Matcher::Exact("/v1/files".to_string())).await;
    let dir = temp_dir();
    let path = dir.join("requests.json");
    std::fs::write(&path, b"{}\n").unwrap();

    let client = fixture.client();
    let err = client
        .files()
        .upload_file(&path, FilePurpose::Batch)
        .await
        .unwrap_err();
    assert!(err.is_validation());

    let err = client
        .files()
        .upload_bytes("notes.txt", b"x".to_vec(), FilePurpose::FineTune)
        .await
        .unwrap_err();
    assert!(err.is_validation());

    never.assert_async().await;
    std::fs::remove_dir_all(&dir).unwrap();
}

#[tokio::test]
async fn test_upload_bytes() {
    let fixture = MockServerFixture::new().await;
    let mock = {
        let mut server = fixture.server.lock().await;
        server
            .mock("POST", "/v1/files")
            .match_body(Matcher::Regex(r#"name="purpose"\r\n\r\nvision"#.to_string()))
            .with_status(200)
            .with_body(
                r#"{"id":"file-img1","object":"file","bytes":4,"created_at":1,"filename":"cat.png","purpose":"vision"}"#,
            )
            .create_async()
            .await
    };

    let client = fixture.client();
    let rec = client
        .files()
        .upload_bytes("cat.png", vec![0x89, b'P', b'N', b'G'], FilePurpose::Vision)
        .await
        .unwrap();
    assert_eq!(rec.bytes, 4);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_list_retrieve_content_delete() {
    let fixture = MockServerFixture::new().await;
    let list = {
        let mut server = fixture.server.lock().await;
        server
            .mock("GET", "/v1/files")
            .match_query(Matcher::UrlEncoded("purpose".into(), "batch".into()))
            .with_status(200)
            .with_body(format!(r#"{{"object":"list","data":[{}],"has_more":false}}"#, FILE_JSON))
            .create_async()
            .await
    };
    let _meta = fixture
        .mock_json("GET", "/v1/files/file-abc123", 200, FILE_JSON)
        .await;
    let _content = fixture
        .mock_text("GET", "/v1/files/file-abc123/content", "line one\nline two\n")
        .await;
    let _delete = fixture
        .mock_json(
            "DELETE",
            "/v1/files/file-abc123",
            200,
            r#"{"id":"file-abc123","object":"file","deleted":true}"#,
        )
        .await;

    let client = fixture.client();
    let files = client.files();

    let page = files.list_files(Some(FilePurpose::Batch)).await.unwrap();
    assert_eq!(page.data.len(), 1);
    list.assert_async().await;

    let meta = files.retrieve_file("file-abc123").await.unwrap();
    assert_eq!(meta.filename, "requests.jsonl");

    let content = files.retrieve_content("file-abc123").await.unwrap();
    assert_eq!(&content[..], b"line one\nline two\n");

    let deleted = files.delete_file("file-abc123").await.unwrap();
    assert!(deleted.deleted);
}

#[tokio::test]
async fn test_missing_file_is_api_error() {
    let fixture = MockServerFixture::new().await;
    let _mock = fixture
        .mock_json(
            "GET",
            "/v1/files/file-gone",
            404,
            r#"{"error":{"message":"No such File object: file-gone","type":"invalid_request_error","param":"id","code":null}}"#,
        )
        .await;

    let client = fixture.client();
    let err = client.files().retrieve_file("file-gone").await.unwrap_err();
    let api = err.api_error().unwrap();
    assert_eq!(api.status, 404);
    assert_eq!(api.code, None);
    assert_eq!(api.param.as_deref(), Some("id"));

    let err = client.files().delete_file("../etc").await.unwrap_err();
    assert!(err.is_validation());
}
