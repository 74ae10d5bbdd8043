use std::sync::Arc;

use axum::body::{Body, Bytes};
use axum::http::{self, HeaderMap, Request, StatusCode};
use tower::ServiceExt;

use async_trait::async_trait;
use tasklist_blob::{BlobDownload, BlobError, BlobMetadata, BlobStore, IngestStream};
use tasklist_blob_memory::MemoryBlobStore;
use tasklist_core::BlobId;
use tasklist_items::ItemRepository;
use tasklist_items_memory::MemoryItemRepository;
use tasklist_server::api::AppState;
use tasklist_server::config::{CorsConfig, UploadsConfig};

const BOUNDARY: &str = "tasklist-test-boundary";

// -- Multipart bodies -----------------------------------------------------

enum FormPart<'a> {
    Text(&'a str, &'a str),
    File(&'a str, &'a str, &'a [u8]),
}

fn multipart_body(parts: &[FormPart<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match part {
            FormPart::Text(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n")
                        .as_bytes(),
                );
            }
            FormPart::File(name, filename, content) => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\n\
                         Content-Type: application/octet-stream\r\n\r\n"
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(content);
                body.extend_from_slice(b"\r\n");
            }
        }
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn multipart_request(method: http::Method, uri: &str, parts: &[FormPart<'_>]) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(
            http::header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart_body(parts)))
        .unwrap()
}

fn sample_bytes(len: usize, seed: u8) -> Vec<u8> {
    (0..len)
        .map(|i| u8::try_from(i % 251).unwrap().wrapping_add(seed))
        .collect()
}

// -- Harness --------------------------------------------------------------

/// Blob store that refuses uploads with one filename and delegates the rest.
struct RefusingBlobStore {
    inner: MemoryBlobStore,
    refused: &'static str,
}

#[async_trait]
impl BlobStore for RefusingBlobStore {
    async fn ingest(
        &self,
        filename: &str,
        content: IngestStream<'_>,
    ) -> Result<BlobMetadata, BlobError> {
        if filename == self.refused {
            return Err(BlobError::Backend("disk quota exceeded".into()));
        }
        self.inner.ingest(filename, content).await
    }

    async fn retrieve(&self, id: &BlobId) -> Result<BlobDownload, BlobError> {
        self.inner.retrieve(id).await
    }

    async fn metadata(&self, id: &BlobId) -> Result<Option<BlobMetadata>, BlobError> {
        self.inner.metadata(id).await
    }

    async fn list(&self) -> Result<Vec<BlobMetadata>, BlobError> {
        self.inner.list().await
    }

    async fn delete(&self, id: &BlobId) -> Result<bool, BlobError> {
        self.inner.delete(id).await
    }
}

struct TestApp {
    router: axum::Router,
    items: Arc<MemoryItemRepository>,
    blobs: Arc<dyn BlobStore>,
}

impl TestApp {
    fn new() -> Self {
        Self::with_limit(UploadsConfig::default().max_bytes)
    }

    fn with_limit(max_bytes: u64) -> Self {
        Self::with_blobs(Arc::new(MemoryBlobStore::with_chunk_size(1024)), max_bytes)
    }

    fn with_blobs(blobs: Arc<dyn BlobStore>, max_bytes: u64) -> Self {
        let items = Arc::new(MemoryItemRepository::new());
        let state = AppState::new(
            Arc::clone(&items) as Arc<dyn ItemRepository>,
            Arc::clone(&blobs),
            &UploadsConfig { max_bytes },
        );
        let router = tasklist_server::api::router(state, &CorsConfig::default());
        Self {
            router,
            items,
            blobs,
        }
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, HeaderMap, Bytes) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, headers, body)
    }

    async fn send_json(&self, request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let (status, _, body) = self.send(request).await;
        let json = if body.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&body).unwrap()
        };
        (status, json)
    }

    async fn get(&self, uri: &str) -> (StatusCode, HeaderMap, Bytes) {
        self.send(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
    }

    async fn list(&self) -> Vec<serde_json::Value> {
        let (status, _, body) = self.get("/items").await;
        assert_eq!(status, StatusCode::OK);
        serde_json::from_slice(&body).unwrap()
    }

    async fn create(&self, parts: &[FormPart<'_>]) -> serde_json::Value {
        let (status, json) = self
            .send_json(multipart_request(http::Method::POST, "/items", parts))
            .await;
        assert_eq!(status, StatusCode::CREATED, "create failed: {json}");
        json
    }

    async fn blob_count(&self) -> usize {
        self.blobs.list().await.unwrap().len()
    }

    async fn delete(&self, id: &str) -> StatusCode {
        let (status, _, _) = self
            .send(
                Request::builder()
                    .method(http::Method::DELETE)
                    .uri(format!("/items/{id}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await;
        status
    }
}

// -- Tests ----------------------------------------------------------------

#[tokio::test]
async fn health_returns_200() {
    let app = TestApp::new();
    let (status, _, body) = app.get("/health").await;
    assert_eq!(status, StatusCode::OK);
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn create_then_list_contains_new_item() {
    let app = TestApp::new();
    assert!(app.list().await.is_empty());

    let created = app
        .create(&[
            FormPart::Text("name", "Buy milk"),
            FormPart::Text("description", "Semi-skimmed"),
        ])
        .await;

    assert_eq!(created["name"], "Buy milk");
    assert_eq!(created["description"], "Semi-skimmed");
    assert_eq!(created["completed"], false);
    assert!(created["id"].is_string());
    assert!(created["createdAt"].is_string());
    assert!(created.get("imageId").is_none());
    assert!(created.get("audioId").is_none());

    let items = app.list().await;
    assert_eq!(items.len(), 1);
    assert_eq!(items[0], created);
}

#[tokio::test]
async fn attached_files_stream_back_unchanged() {
    let app = TestApp::new();
    let image = sample_bytes(5 * 1024 + 3, 7);
    let audio = sample_bytes(12 * 1024, 42);

    let created = app
        .create(&[
            FormPart::Text("name", "Record song"),
            FormPart::File("image", "cover.png", &image),
            FormPart::File("audio", "take1.mp3", &audio),
        ])
        .await;
    assert_eq!(app.blob_count().await, 2);

    for (key, expected) in [("imageId", &image), ("audioId", &audio)] {
        let id = created[key].as_str().expect("blob id should be linked");
        let (status, headers, body) = app.get(&format!("/files/{id}")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(headers[http::header::CONTENT_TYPE], "application/octet-stream");
        assert_eq!(headers[http::header::CONTENT_DISPOSITION], "inline");
        assert_eq!(
            headers[http::header::CONTENT_LENGTH],
            expected.len().to_string().as_str()
        );
        assert_eq!(body.as_ref(), expected.as_slice(), "{key} content differs");
    }
}

#[tokio::test]
async fn create_honours_completed_flag() {
    let app = TestApp::new();
    let created = app
        .create(&[
            FormPart::Text("name", "Already done"),
            FormPart::Text("completed", "true"),
        ])
        .await;
    assert_eq!(created["completed"], true);
}

#[tokio::test]
async fn update_with_only_completed_changes_only_completed() {
    let app = TestApp::new();
    let image = sample_bytes(300, 1);
    let created = app
        .create(&[
            FormPart::Text("name", "Walk dog"),
            FormPart::Text("description", "Around the block"),
            FormPart::File("image", "dog.jpg", &image),
        ])
        .await;
    let id = created["id"].as_str().unwrap();

    let (status, updated) = app
        .send_json(multipart_request(
            http::Method::PUT,
            &format!("/items/{id}"),
            &[FormPart::Text("completed", "true")],
        ))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["completed"], true);
    for key in ["id", "name", "description", "imageId", "createdAt"] {
        assert_eq!(updated[key], created[key], "{key} should be unchanged");
    }
    assert!(updated.get("audioId").is_none());
    assert_eq!(app.blob_count().await, 1);
}

#[tokio::test]
async fn update_replaces_file_link_and_keeps_old_blob() {
    let app = TestApp::new();
    let first = sample_bytes(100, 3);
    let second = sample_bytes(200, 9);
    let created = app
        .create(&[
            FormPart::Text("name", "Photo"),
            FormPart::File("image", "a.jpg", &first),
        ])
        .await;
    let id = created["id"].as_str().unwrap();
    let old_image = created["imageId"].as_str().unwrap().to_owned();

    let (status, updated) = app
        .send_json(multipart_request(
            http::Method::PUT,
            &format!("/items/{id}"),
            &[FormPart::File("image", "b.jpg", &second)],
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    let new_image = updated["imageId"].as_str().unwrap();
    assert_ne!(new_image, old_image);

    let (_, _, body) = app.get(&format!("/files/{new_image}")).await;
    assert_eq!(body.as_ref(), second.as_slice());
    let (status, _, body) = app.get(&format!("/files/{old_image}")).await;
    assert_eq!(status, StatusCode::OK, "replaced blob is not deleted");
    assert_eq!(body.as_ref(), first.as_slice());
}

#[tokio::test]
async fn delete_removes_item_and_second_delete_is_404() {
    let app = TestApp::new();
    let audio = sample_bytes(64, 0);
    let created = app
        .create(&[
            FormPart::Text("name", "Short-lived"),
            FormPart::File("audio", "a.wav", &audio),
        ])
        .await;
    let id = created["id"].as_str().unwrap();

    assert_eq!(app.delete(id).await, StatusCode::NO_CONTENT);
    assert!(app.list().await.is_empty());
    assert_eq!(app.delete(id).await, StatusCode::NOT_FOUND);

    // Attachments outlive the item.
    let audio_id = created["audioId"].as_str().unwrap();
    let (status, _, _) = app.get(&format!("/files/{audio_id}")).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn empty_name_is_rejected_without_leaving_blobs() {
    let app = TestApp::new();
    let image = sample_bytes(2048, 5);

    let (status, json) = app
        .send_json(multipart_request(
            http::Method::POST,
            "/items",
            &[
                FormPart::File("image", "early.png", &image),
                FormPart::Text("name", ""),
            ],
        ))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "\"name\" is not allowed to be empty");
    assert!(app.items.is_empty());
    assert_eq!(app.blob_count().await, 0, "ingested image should be rolled back");
}

#[tokio::test]
async fn missing_name_is_rejected() {
    let app = TestApp::new();
    let audio = sample_bytes(10, 0);
    let (status, json) = app
        .send_json(multipart_request(
            http::Method::POST,
            "/items",
            &[FormPart::File("audio", "clip.ogg", &audio)],
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "\"name\" is required");
    assert_eq!(app.blob_count().await, 0);
}

#[tokio::test]
async fn unknown_and_invalid_fields_are_rejected() {
    let app = TestApp::new();

    let (status, json) = app
        .send_json(multipart_request(
            http::Method::POST,
            "/items",
            &[FormPart::Text("name", "x"), FormPart::Text("priority", "high")],
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "\"priority\" is not allowed");

    let (status, json) = app
        .send_json(multipart_request(
            http::Method::POST,
            "/items",
            &[FormPart::Text("name", "x"), FormPart::Text("completed", "maybe")],
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "\"completed\" must be a boolean");

    assert!(app.list().await.is_empty());
}

#[tokio::test]
async fn blank_file_inputs_are_ignored() {
    let app = TestApp::new();
    let created = app
        .create(&[
            FormPart::Text("name", "No attachment"),
            FormPart::File("image", "", b""),
        ])
        .await;
    assert!(created.get("imageId").is_none());
    assert_eq!(app.blob_count().await, 0);
}

#[tokio::test]
async fn text_values_under_file_fields_are_ignored() {
    let app = TestApp::new();
    let created = app
        .create(&[
            FormPart::Text("name", "x"),
            FormPart::Text("image", ""),
            FormPart::Text("audio", "null"),
        ])
        .await;
    assert_eq!(created["name"], "x");
    assert!(created.get("imageId").is_none());
    assert!(created.get("audioId").is_none());
    assert_eq!(app.blob_count().await, 0);
}

#[tokio::test]
async fn unknown_file_returns_404() {
    let app = TestApp::new();
    for id in ["65f1c0ffee0000000000abcd", "not-an-id"] {
        let (status, _, body) = app.get(&format!("/files/{id}")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "File not found");
    }
}

#[tokio::test]
async fn update_of_unknown_item_is_404_and_stores_nothing() {
    let app = TestApp::new();
    let image = sample_bytes(512, 2);
    let (status, json) = app
        .send_json(multipart_request(
            http::Method::PUT,
            "/items/65f1c0ffee0000000000abcd",
            &[FormPart::File("image", "x.png", &image)],
        ))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"], "Item not found");
    assert_eq!(app.blob_count().await, 0);
}

#[tokio::test]
async fn rejected_update_rolls_back_its_files() {
    let app = TestApp::new();
    let created = app.create(&[FormPart::Text("name", "Keep me")]).await;
    let id = created["id"].as_str().unwrap();
    let image = sample_bytes(700, 4);

    let (status, _) = app
        .send_json(multipart_request(
            http::Method::PUT,
            &format!("/items/{id}"),
            &[
                FormPart::File("image", "x.png", &image),
                FormPart::Text("name", ""),
            ],
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(app.blob_count().await, 0);

    let items = app.list().await;
    assert_eq!(items[0]["name"], "Keep me");
    assert!(items[0].get("imageId").is_none());
}

#[tokio::test]
async fn files_beyond_ceiling_are_rejected_without_leaving_blobs() {
    let app = TestApp::with_limit(4096);
    let image = sample_bytes(3000, 1);
    let audio = sample_bytes(3000, 2);

    let (status, _, _) = app
        .send(multipart_request(
            http::Method::POST,
            "/items",
            &[
                FormPart::Text("name", "Too big"),
                FormPart::File("image", "a.png", &image),
                FormPart::File("audio", "b.mp3", &audio),
            ],
        ))
        .await;

    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert!(app.items.is_empty());
    assert_eq!(app.blob_count().await, 0);
}

#[tokio::test]
async fn declared_length_beyond_ceiling_is_rejected_up_front() {
    let app = TestApp::with_limit(1024);
    let image = sample_bytes(2048, 1);
    let body = multipart_body(&[
        FormPart::Text("name", "Too big"),
        FormPart::File("image", "a.png", &image),
    ]);

    let request = Request::builder()
        .method(http::Method::POST)
        .uri("/items")
        .header(
            http::header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .header(http::header::CONTENT_LENGTH, body.len())
        .body(Body::from(body))
        .unwrap();

    let (status, _, body) = app.send(request).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(
        json["error"],
        "Payload content length greater than maximum allowed: 1024"
    );
    assert_eq!(app.blob_count().await, 0);
}

#[tokio::test]
async fn storage_failure_is_500_and_rolls_back_earlier_files() {
    let app = TestApp::with_blobs(
        Arc::new(RefusingBlobStore {
            inner: MemoryBlobStore::with_chunk_size(1024),
            refused: "clip.mp3",
        }),
        UploadsConfig::default().max_bytes,
    );
    let image = sample_bytes(1500, 3);
    let audio = sample_bytes(800, 5);

    let (status, json) = app
        .send_json(multipart_request(
            http::Method::POST,
            "/items",
            &[
                FormPart::Text("name", "Unlucky"),
                FormPart::File("image", "photo.png", &image),
                FormPart::File("audio", "clip.mp3", &audio),
            ],
        ))
        .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["error"], "Internal server error");
    assert!(app.items.is_empty());
    assert_eq!(app.blob_count().await, 0);
}

#[tokio::test]
async fn non_multipart_body_is_a_bad_request() {
    let app = TestApp::new();
    let (status, json) = app
        .send_json(
            Request::builder()
                .method(http::Method::POST)
                .uri("/items")
                .header(http::header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"name":"x"}"#))
                .unwrap(),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].is_string());
}

#[tokio::test]
async fn cors_allows_only_configured_origin() {
    let app = TestApp::new();
    let preflight = |origin: &str| {
        Request::builder()
            .method(http::Method::OPTIONS)
            .uri("/items")
            .header(http::header::ORIGIN, origin)
            .header(http::header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .body(Body::empty())
            .unwrap()
    };

    let (_, headers, _) = app.send(preflight("http://localhost:4200")).await;
    assert_eq!(
        headers[http::header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "http://localhost:4200"
    );

    let (_, headers, _) = app.send(preflight("http://evil.example")).await;
    assert!(
        headers
            .get(http::header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .is_none()
    );
}

#[tokio::test]
async fn openapi_document_lists_item_routes() {
    let app = TestApp::new();
    let (status, _, body) = app.get("/api-doc/openapi.json").await;
    assert_eq!(status, StatusCode::OK);
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert!(json["paths"]["/items"].is_object());
    assert!(json["paths"]["/items/{id}"].is_object());
    assert!(json["paths"]["/files/{id}"].is_object());
}
