use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::error;

use tasklist_blob::BlobError;
use tasklist_core::ValidationError;
use tasklist_items::ItemError;

/// Message returned to clients for storage failures; the detail is logged.
const STORAGE_FAILURE: &str = "Internal server error";

/// Errors that can occur when running the Tasklist server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// A configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// An I/O error (e.g. binding the listener).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The request carried invalid or unexpected fields.
    #[error("{0}")]
    Validation(String),

    /// The addressed item or file does not exist.
    #[error("{0}")]
    NotFound(String),

    /// The request body exceeded the upload ceiling.
    #[error("{0}")]
    PayloadTooLarge(String),

    /// An item or blob backend failed.
    #[error("storage error: {0}")]
    Storage(String),
}

impl ServerError {
    /// Upload ceiling exceeded, worded after the configured limit.
    pub fn too_large(max_bytes: u64) -> Self {
        Self::PayloadTooLarge(format!(
            "Payload content length greater than maximum allowed: {max_bytes}"
        ))
    }
}

impl From<ValidationError> for ServerError {
    fn from(e: ValidationError) -> Self {
        Self::Validation(e.0)
    }
}

impl From<ItemError> for ServerError {
    fn from(e: ItemError) -> Self {
        match e {
            ItemError::Validation(msg) => Self::Validation(msg),
            ItemError::NotFound(_) => Self::NotFound("Item not found".to_owned()),
            ItemError::Backend(_) | ItemError::Serialization(_) => Self::Storage(e.to_string()),
        }
    }
}

impl From<BlobError> for ServerError {
    fn from(e: BlobError) -> Self {
        match e {
            BlobError::NotFound(_) => Self::NotFound("File not found".to_owned()),
            BlobError::Write(_) | BlobError::Read(_) | BlobError::Backend(_) => {
                Self::Storage(e.to_string())
            }
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            Self::PayloadTooLarge(msg) => (StatusCode::PAYLOAD_TOO_LARGE, msg.clone()),
            Self::Storage(detail) => {
                error!(error = %detail, "storage operation failed");
                (StatusCode::INTERNAL_SERVER_ERROR, STORAGE_FAILURE.to_owned())
            }
            Self::Config(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
            Self::Io(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(err: ServerError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn item_errors_map_to_status_codes() {
        let (status, json) = body_json(ItemError::NotFound("abc".into()).into()).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["error"], "Item not found");

        let (status, json) = body_json(ItemError::Validation("\"name\" is required".into()).into()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "\"name\" is required");
    }

    #[tokio::test]
    async fn missing_blob_is_file_not_found() {
        let (status, json) = body_json(BlobError::NotFound("abc".into()).into()).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["error"], "File not found");
    }

    #[tokio::test]
    async fn storage_detail_is_not_leaked() {
        let err: ServerError = ItemError::Backend("connection refused to 10.0.0.5".into()).into();
        let (status, json) = body_json(err).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["error"], STORAGE_FAILURE);
    }

    #[tokio::test]
    async fn too_large_names_the_limit() {
        let (status, json) = body_json(ServerError::too_large(1024)).await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(
            json["error"],
            "Payload content length greater than maximum allowed: 1024"
        );
    }
}
