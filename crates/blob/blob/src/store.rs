use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;

use tasklist_core::BlobId;

use crate::error::BlobError;
use crate::types::{BlobDownload, BlobMetadata};

/// Source bytes handed to [`BlobStore::ingest`].
///
/// The stream may borrow from the request it is read from; an `Err` item
/// aborts the ingest.
pub type IngestStream<'a> = BoxStream<'a, Result<Bytes, std::io::Error>>;

/// Content returned by [`BlobStore::retrieve`].
pub type BlobStream = BoxStream<'static, Result<Bytes, BlobError>>;

/// Chunked, write-once binary storage for item attachments.
///
/// Implementations must stream in both directions: memory held per call is
/// bounded by the chunk size, not the blob size.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Consume `content` to completion and store it as a new blob.
    ///
    /// On any error nothing becomes retrievable under the returned or any
    /// other identifier.
    async fn ingest(
        &self,
        filename: &str,
        content: IngestStream<'_>,
    ) -> Result<BlobMetadata, BlobError>;

    /// Open a blob for reading.
    ///
    /// Returns [`BlobError::NotFound`] if the blob does not exist or `id` is
    /// not a valid identifier for this backend.
    async fn retrieve(&self, id: &BlobId) -> Result<BlobDownload, BlobError>;

    /// Look up metadata without opening the content.
    async fn metadata(&self, id: &BlobId) -> Result<Option<BlobMetadata>, BlobError>;

    /// List every stored blob.
    async fn list(&self) -> Result<Vec<BlobMetadata>, BlobError>;

    /// Remove a blob and its chunks. Returns `true` if the blob existed.
    ///
    /// Only used to compensate for uploads whose item mutation failed.
    async fn delete(&self, id: &BlobId) -> Result<bool, BlobError>;
}
