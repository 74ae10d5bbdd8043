//! Multipart item uploads.
//!
//! File parts are streamed straight into the blob store as they arrive;
//! text parts are validated as they arrive. The item is only written once
//! the whole body has been consumed. If anything fails along the way, every
//! blob stored for the request is deleted again so no orphan is left
//! behind.

mod form;
mod parts;

pub use form::{FileSlot, ItemForm, parse_completed};
pub use parts::Part;

use std::sync::Arc;

use axum::extract::Multipart;
use axum::extract::multipart::{Field, MultipartError};
use axum::http::StatusCode;
use bytes::Bytes;
use futures::StreamExt;
use tracing::{debug, warn};

use tasklist_blob::{BlobMetadata, BlobStore};
use tasklist_core::{BlobId, Item, ItemId};
use tasklist_items::ItemRepository;

use crate::config::UploadsConfig;
use crate::error::ServerError;

/// Drives item creation and update from a multipart request.
#[derive(Clone)]
pub struct UploadPipeline {
    items: Arc<dyn ItemRepository>,
    blobs: Arc<dyn BlobStore>,
    max_bytes: u64,
}

impl UploadPipeline {
    pub fn new(
        items: Arc<dyn ItemRepository>,
        blobs: Arc<dyn BlobStore>,
        config: &UploadsConfig,
    ) -> Self {
        Self {
            items,
            blobs,
            max_bytes: config.max_bytes,
        }
    }

    /// Create an item from a multipart form.
    pub async fn create(&self, mut multipart: Multipart) -> Result<Item, ServerError> {
        let mut ingested = Vec::new();
        let result = self.create_from(&mut multipart, &mut ingested).await;
        self.finish(result, &ingested).await
    }

    /// Apply a multipart form to an existing item.
    pub async fn update(&self, id: &ItemId, mut multipart: Multipart) -> Result<Item, ServerError> {
        if self.items.get(id).await?.is_none() {
            return Err(ServerError::NotFound("Item not found".to_owned()));
        }

        let mut ingested = Vec::new();
        let result = self.update_from(id, &mut multipart, &mut ingested).await;
        self.finish(result, &ingested).await
    }

    async fn create_from(
        &self,
        multipart: &mut Multipart,
        ingested: &mut Vec<BlobId>,
    ) -> Result<Item, ServerError> {
        let form = self.collect(multipart, ingested).await?;
        let new_item = form.into_new_item()?;
        Ok(self.items.create(new_item).await?)
    }

    async fn update_from(
        &self,
        id: &ItemId,
        multipart: &mut Multipart,
        ingested: &mut Vec<BlobId>,
    ) -> Result<Item, ServerError> {
        let form = self.collect(multipart, ingested).await?;
        Ok(self.items.update(id, form.into_changes()).await?)
    }

    async fn finish(
        &self,
        result: Result<Item, ServerError>,
        ingested: &[BlobId],
    ) -> Result<Item, ServerError> {
        if result.is_err() {
            self.rollback(ingested).await;
        }
        result
    }

    /// Read every part of the body into a form, storing files on the way.
    async fn collect(
        &self,
        multipart: &mut Multipart,
        ingested: &mut Vec<BlobId>,
    ) -> Result<ItemForm, ServerError> {
        let mut form = ItemForm::default();
        let mut received: u64 = 0;

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| self.multipart_error(&e))?
        {
            let part = Part::from_field(field)
                .await
                .map_err(|e| self.multipart_error(&e))?;
            let Some(part) = part else {
                continue;
            };
            debug!(field = part.name(), "multipart part received");

            match part {
                Part::Text { name, value } => form.set_text(&name, value)?,
                Part::File {
                    name,
                    filename,
                    field,
                } => {
                    let slot = form.claim_file(&name)?;
                    let metadata = self.ingest(&filename, field, &mut received).await?;
                    debug!(
                        field = %name,
                        blob_id = %metadata.id,
                        length = metadata.length,
                        "file stored"
                    );
                    ingested.push(metadata.id.clone());
                    form.attach(slot, metadata.id);
                }
            }
        }

        Ok(form)
    }

    /// Stream one file part into the blob store, counting bytes against the
    /// request-wide ceiling.
    async fn ingest(
        &self,
        filename: &str,
        field: Field<'_>,
        received: &mut u64,
    ) -> Result<BlobMetadata, ServerError> {
        let max_bytes = self.max_bytes;
        let mut failure: Option<ServerError> = None;

        let content = field.map(|chunk: Result<Bytes, MultipartError>| -> Result<Bytes, std::io::Error> {
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(e) => {
                    let message = e.body_text();
                    failure = Some(self.multipart_error(&e));
                    return Err(std::io::Error::other(message));
                }
            };
            *received += chunk.len() as u64;
            if *received > max_bytes {
                failure = Some(ServerError::too_large(max_bytes));
                return Err(std::io::Error::other("upload size ceiling exceeded"));
            }
            Ok(chunk)
        });

        let result = self.blobs.ingest(filename, content.boxed()).await;
        match result {
            Ok(metadata) => Ok(metadata),
            Err(e) => Err(failure.unwrap_or_else(|| e.into())),
        }
    }

    fn multipart_error(&self, e: &MultipartError) -> ServerError {
        if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ServerError::too_large(self.max_bytes)
        } else {
            ServerError::Validation(e.body_text())
        }
    }

    /// Delete blobs stored for a request that did not complete.
    async fn rollback(&self, ingested: &[BlobId]) {
        for id in ingested {
            match self.blobs.delete(id).await {
                Ok(_) => debug!(blob_id = %id, "rolled back blob"),
                Err(e) => warn!(blob_id = %id, error = %e, "failed to roll back blob"),
            }
        }
    }
}
