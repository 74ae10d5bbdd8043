use std::sync::Arc;

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use chrono::Utc;
use dashmap::DashMap;
use futures::StreamExt;
use uuid::Uuid;

use tasklist_blob::{BlobDownload, BlobError, BlobMetadata, BlobStore, IngestStream};
use tasklist_core::BlobId;

/// Default chunk size, matching the `GridFS` default of 255 KiB.
pub const DEFAULT_CHUNK_SIZE: usize = 255 * 1024;

/// A completed upload: metadata plus its fixed-size chunks.
#[derive(Debug, Clone)]
struct StoredBlob {
    metadata: BlobMetadata,
    chunks: Arc<[Bytes]>,
}

/// In-memory [`BlobStore`] backed by a [`DashMap`].
///
/// Content is re-chunked into `chunk_size` pieces on ingest. A blob is only
/// inserted once its source stream has been fully consumed, so a failed
/// upload is never observable.
#[derive(Debug)]
pub struct MemoryBlobStore {
    blobs: DashMap<String, StoredBlob>,
    chunk_size: usize,
}

impl Default for MemoryBlobStore {
    fn default() -> Self {
        Self::with_chunk_size(DEFAULT_CHUNK_SIZE)
    }
}

impl MemoryBlobStore {
    /// Create a new, empty in-memory blob store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that splits content into `chunk_size`-byte chunks.
    pub fn with_chunk_size(chunk_size: usize) -> Self {
        Self {
            blobs: DashMap::new(),
            chunk_size: chunk_size.max(1),
        }
    }

    /// Number of chunks a stored blob occupies. `None` if it does not exist.
    pub fn chunk_count(&self, id: &BlobId) -> Option<usize> {
        self.blobs.get(id.as_str()).map(|b| b.chunks.len())
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn ingest(
        &self,
        filename: &str,
        mut content: IngestStream<'_>,
    ) -> Result<BlobMetadata, BlobError> {
        let mut chunks = Vec::new();
        let mut pending = BytesMut::with_capacity(self.chunk_size);
        let mut length: u64 = 0;

        while let Some(next) = content.next().await {
            let mut bytes = next.map_err(|e| BlobError::Write(e.to_string()))?;
            length += bytes.len() as u64;
            while !bytes.is_empty() {
                let take = (self.chunk_size - pending.len()).min(bytes.len());
                pending.extend_from_slice(&bytes.split_to(take));
                if pending.len() == self.chunk_size {
                    chunks.push(pending.split().freeze());
                }
            }
        }
        if !pending.is_empty() {
            chunks.push(pending.freeze());
        }

        let metadata = BlobMetadata {
            id: BlobId::new(Uuid::new_v4().to_string()),
            filename: filename.to_owned(),
            length,
            uploaded_at: Utc::now(),
        };
        self.blobs.insert(
            metadata.id.to_string(),
            StoredBlob {
                metadata: metadata.clone(),
                chunks: chunks.into(),
            },
        );
        Ok(metadata)
    }

    async fn retrieve(&self, id: &BlobId) -> Result<BlobDownload, BlobError> {
        let stored = self
            .blobs
            .get(id.as_str())
            .map(|entry| entry.value().clone())
            .ok_or_else(|| BlobError::NotFound(id.to_string()))?;

        let chunks = stored.chunks;
        let content = futures::stream::iter(
            (0..chunks.len()).map(move |i| Ok::<_, BlobError>(chunks[i].clone())),
        );

        Ok(BlobDownload {
            metadata: stored.metadata,
            content: content.boxed(),
        })
    }

    async fn metadata(&self, id: &BlobId) -> Result<Option<BlobMetadata>, BlobError> {
        Ok(self
            .blobs
            .get(id.as_str())
            .map(|entry| entry.metadata.clone()))
    }

    async fn list(&self) -> Result<Vec<BlobMetadata>, BlobError> {
        let mut all: Vec<BlobMetadata> = self
            .blobs
            .iter()
            .map(|entry| entry.metadata.clone())
            .collect();
        all.sort_by_key(|m| m.uploaded_at);
        Ok(all)
    }

    async fn delete(&self, id: &BlobId) -> Result<bool, BlobError> {
        Ok(self.blobs.remove(id.as_str()).is_some())
    }
}
