use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_LENGTH, CONTENT_TYPE};
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use tracing::debug;

use tasklist_core::BlobId;

use super::AppState;
use super::schemas::ErrorResponse;
use crate::error::ServerError;

/// `GET /files/{id}` -- stream a stored file.
#[utoipa::path(
    get,
    path = "/files/{id}",
    tag = "Files",
    summary = "Download file",
    description = "Streams the raw bytes of an uploaded image or audio file.",
    params(("id" = String, Path, description = "Blob identifier taken from an item's `imageId` or `audioId`")),
    responses(
        (status = 200, description = "File content", content_type = "application/octet-stream", body = Vec<u8>),
        (status = 404, description = "File not found", body = ErrorResponse)
    )
)]
pub async fn get_file(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ServerError> {
    let download = state.blobs.retrieve(&BlobId::new(id)).await?;
    debug!(
        blob_id = %download.metadata.id,
        length = download.metadata.length,
        "streaming file"
    );

    let headers = [
        (
            CONTENT_TYPE,
            HeaderValue::from_static("application/octet-stream"),
        ),
        (CONTENT_DISPOSITION, HeaderValue::from_static("inline")),
        (CONTENT_LENGTH, HeaderValue::from(download.metadata.length)),
    ];
    Ok((StatusCode::OK, headers, Body::from_stream(download.content)).into_response())
}
