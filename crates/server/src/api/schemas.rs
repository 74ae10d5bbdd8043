use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Health check response.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Service status indicator.
    #[schema(example = "ok")]
    pub status: String,
}

/// Error body returned by every failing request.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Human-readable error message.
    #[schema(example = "Item not found")]
    pub error: String,
}

/// Multipart form accepted by `POST /items`.
#[derive(Debug, ToSchema)]
pub struct CreateItemForm {
    /// Item name. Must not be empty.
    #[schema(example = "Buy milk")]
    pub name: String,
    /// Optional free-form description. Must not be empty when sent.
    pub description: Option<String>,
    /// `true` or `false`. Defaults to `false`.
    #[schema(value_type = Option<String>, example = "false")]
    pub completed: Option<String>,
    /// Image file to attach.
    #[schema(value_type = Option<String>, format = Binary)]
    pub image: Option<Vec<u8>>,
    /// Audio file to attach.
    #[schema(value_type = Option<String>, format = Binary)]
    pub audio: Option<Vec<u8>>,
}

/// Multipart form accepted by `PUT /items/{id}`. Absent fields keep their
/// stored value; a new file replaces the previous link.
#[derive(Debug, ToSchema)]
pub struct UpdateItemForm {
    pub name: Option<String>,
    pub description: Option<String>,
    #[schema(value_type = Option<String>, example = "true")]
    pub completed: Option<String>,
    #[schema(value_type = Option<String>, format = Binary)]
    pub image: Option<Vec<u8>>,
    #[schema(value_type = Option<String>, format = Binary)]
    pub audio: Option<Vec<u8>>,
}
