use thiserror::Error;

/// Errors that can occur during blob storage operations.
#[derive(Debug, Error)]
pub enum BlobError {
    /// No blob exists for the identifier, or the identifier is malformed.
    #[error("blob not found: {0}")]
    NotFound(String),

    /// Persisting the blob failed, either in the backend or because the
    /// source stream errored mid-transfer.
    #[error("blob write failed: {0}")]
    Write(String),

    /// Reading stored content failed.
    #[error("blob read failed: {0}")]
    Read(String),

    /// Any other storage backend error.
    #[error("blob storage error: {0}")]
    Backend(String),
}
