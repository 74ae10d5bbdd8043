#![allow(clippy::needless_for_each)]

use tasklist_core::Item;

use super::schemas::{CreateItemForm, ErrorResponse, HealthResponse, UpdateItemForm};

#[derive(utoipa::OpenApi)]
#[openapi(
    info(
        title = "Tasklist API",
        version = "0.1.0",
        description = "HTTP API for to-do items with image and audio attachments.",
        license(name = "Apache-2.0")
    ),
    tags(
        (name = "Health", description = "Service health"),
        (name = "Items", description = "Item management with multipart uploads"),
        (name = "Files", description = "Attachment download")
    ),
    paths(
        super::health::health,
        super::items::list_items,
        super::items::create_item,
        super::items::update_item,
        super::items::delete_item,
        super::files::get_file,
    ),
    components(schemas(
        Item,
        HealthResponse, ErrorResponse,
        CreateItemForm, UpdateItemForm,
    ))
)]
pub struct ApiDoc;
