use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tasklist_core::BlobId;

use crate::store::BlobStream;

/// Metadata for a stored blob.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlobMetadata {
    /// Unique blob identifier.
    pub id: BlobId,
    /// Filename supplied by the uploader. Not used for lookup.
    pub filename: String,
    /// Total size in bytes.
    pub length: u64,
    /// When the upload completed.
    pub uploaded_at: DateTime<Utc>,
}

/// An opened blob: metadata plus a stream over its content.
///
/// Dropping the download releases any backend resources held by the stream.
pub struct BlobDownload {
    /// Blob metadata.
    pub metadata: BlobMetadata,
    /// Content, starting at byte zero.
    pub content: BlobStream,
}

impl std::fmt::Debug for BlobDownload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlobDownload")
            .field("metadata", &self.metadata)
            .finish_non_exhaustive()
    }
}
