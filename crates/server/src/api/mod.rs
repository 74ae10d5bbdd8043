pub mod files;
pub mod health;
pub mod items;
pub mod openapi;
pub mod schemas;

use std::sync::Arc;

use axum::Router;
use axum::extract::{DefaultBodyLimit, Request, State};
use axum::http::{HeaderName, HeaderValue, Method, header};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tasklist_blob::BlobStore;
use tasklist_items::ItemRepository;

use crate::config::{CorsConfig, UploadsConfig};
use crate::error::ServerError;
use crate::upload::UploadPipeline;

use self::openapi::ApiDoc;

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Item records.
    pub items: Arc<dyn ItemRepository>,
    /// Uploaded file content.
    pub blobs: Arc<dyn BlobStore>,
    /// Multipart create/update flow over `items` and `blobs`.
    pub uploads: UploadPipeline,
    /// Request body ceiling for upload routes, in bytes.
    pub upload_limit: usize,
}

impl AppState {
    pub fn new(
        items: Arc<dyn ItemRepository>,
        blobs: Arc<dyn BlobStore>,
        uploads: &UploadsConfig,
    ) -> Self {
        Self {
            uploads: UploadPipeline::new(Arc::clone(&items), Arc::clone(&blobs), uploads),
            items,
            blobs,
            upload_limit: uploads.max_bytes_usize(),
        }
    }
}

/// Build the CORS layer from configuration. Entries that are not valid
/// header values are logged and skipped.
pub fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| {
            HeaderValue::from_str(origin)
                .inspect_err(|_| tracing::warn!(%origin, "ignoring invalid CORS origin"))
                .ok()
        })
        .collect();
    let headers: Vec<HeaderName> = config
        .allowed_headers
        .iter()
        .filter_map(|header| {
            HeaderName::from_bytes(header.as_bytes())
                .inspect_err(|_| tracing::warn!(%header, "ignoring invalid CORS header"))
                .ok()
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(headers)
}

/// Answer a request whose declared `Content-Length` is over the upload
/// ceiling before any of its body is read.
async fn reject_declared_oversize(
    State(limit): State<usize>,
    request: Request,
    next: Next,
) -> Response {
    let max_bytes = u64::try_from(limit).unwrap_or(u64::MAX);
    let declared = request
        .headers()
        .get(header::CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<u64>().ok());
    if declared.is_some_and(|length| length > max_bytes) {
        return ServerError::too_large(max_bytes).into_response();
    }
    next.run(request).await
}

/// Build the Axum router with all API routes, middleware, and Swagger UI.
pub fn router(state: AppState, cors: &CorsConfig) -> Router {
    let upload_limit = state.upload_limit;

    let items = Router::new()
        .route(
            "/items",
            get(items::list_items).post(items::create_item),
        )
        .route(
            "/items/{id}",
            axum::routing::put(items::update_item).delete(items::delete_item),
        )
        // Multipart bodies are streamed; the ceiling is enforced here rather
        // than by the extractor default.
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(upload_limit))
        .layer(middleware::from_fn_with_state(
            upload_limit,
            reject_declared_oversize,
        ));

    Router::new()
        .route("/health", get(health::health))
        .route("/files/{id}", get(files::get_file))
        .merge(items)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(cors))
}
