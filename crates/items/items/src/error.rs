use tasklist_core::ValidationError;
use thiserror::Error;

/// Errors that can occur during item repository operations.
#[derive(Debug, Error)]
pub enum ItemError {
    /// A supplied field violates the item constraints.
    #[error("{0}")]
    Validation(String),

    /// No item exists for the identifier, or the identifier is malformed.
    #[error("item not found: {0}")]
    NotFound(String),

    /// The storage backend failed.
    #[error("item storage error: {0}")]
    Backend(String),

    /// A stored record could not be converted to or from its persisted form.
    #[error("item serialization error: {0}")]
    Serialization(String),
}

impl From<ValidationError> for ItemError {
    fn from(e: ValidationError) -> Self {
        Self::Validation(e.0)
    }
}
