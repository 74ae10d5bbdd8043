use axum::Json;
use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use tracing::info;

use tasklist_core::{Item, ItemId};

use super::AppState;
use super::schemas::{CreateItemForm, ErrorResponse, UpdateItemForm};
use crate::error::ServerError;

fn multipart_body(multipart: Result<Multipart, MultipartRejection>) -> Result<Multipart, ServerError> {
    multipart.map_err(|e| ServerError::Validation(e.body_text()))
}

/// `GET /items` -- list every item, oldest first.
#[utoipa::path(
    get,
    path = "/items",
    tag = "Items",
    summary = "List items",
    responses(
        (status = 200, description = "All items", body = Vec<Item>),
        (status = 500, description = "Storage failure", body = ErrorResponse)
    )
)]
pub async fn list_items(State(state): State<AppState>) -> Result<Json<Vec<Item>>, ServerError> {
    Ok(Json(state.items.list().await?))
}

/// `POST /items` -- create an item, storing any attached files.
#[utoipa::path(
    post,
    path = "/items",
    tag = "Items",
    summary = "Create item",
    description = "Accepts a multipart form. File parts named `image` and `audio` are stored and linked to the new item.",
    request_body(content = CreateItemForm, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Item created", body = Item),
        (status = 400, description = "Invalid or unexpected field", body = ErrorResponse),
        (status = 413, description = "Upload exceeds the size ceiling", body = ErrorResponse),
        (status = 500, description = "Storage failure", body = ErrorResponse)
    )
)]
pub async fn create_item(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<(StatusCode, Json<Item>), ServerError> {
    let item = state.uploads.create(multipart_body(multipart)?).await?;
    info!(
        item_id = %item.id,
        image = item.image_id.is_some(),
        audio = item.audio_id.is_some(),
        "item created"
    );
    Ok((StatusCode::CREATED, Json(item)))
}

/// `PUT /items/{id}` -- partially update an item.
#[utoipa::path(
    put,
    path = "/items/{id}",
    tag = "Items",
    summary = "Update item",
    description = "Only the fields present in the form change. A new `image` or `audio` file replaces the previous link; the old blob is kept.",
    params(("id" = String, Path, description = "Item identifier")),
    request_body(content = UpdateItemForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Item updated", body = Item),
        (status = 400, description = "Invalid or unexpected field", body = ErrorResponse),
        (status = 404, description = "Item not found", body = ErrorResponse),
        (status = 413, description = "Upload exceeds the size ceiling", body = ErrorResponse),
        (status = 500, description = "Storage failure", body = ErrorResponse)
    )
)]
pub async fn update_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<Item>, ServerError> {
    let id = ItemId::new(id);
    let item = state.uploads.update(&id, multipart_body(multipart)?).await?;
    info!(item_id = %item.id, "item updated");
    Ok(Json(item))
}

/// `DELETE /items/{id}` -- remove an item. Attached files are kept.
#[utoipa::path(
    delete,
    path = "/items/{id}",
    tag = "Items",
    summary = "Delete item",
    params(("id" = String, Path, description = "Item identifier")),
    responses(
        (status = 204, description = "Item deleted"),
        (status = 404, description = "Item not found", body = ErrorResponse),
        (status = 500, description = "Storage failure", body = ErrorResponse)
    )
)]
pub async fn delete_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ServerError> {
    let id = ItemId::new(id);
    state.items.delete(&id).await?;
    info!(item_id = %id, "item deleted");
    Ok(StatusCode::NO_CONTENT)
}
