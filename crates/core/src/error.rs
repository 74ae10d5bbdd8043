use thiserror::Error;

/// A caller-supplied field failed validation.
///
/// The message is safe to return to clients verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ValidationError(pub String);

impl ValidationError {
    /// Build a validation error for a required field that was missing or empty.
    #[must_use]
    pub fn empty(field: &str) -> Self {
        Self(format!("\"{field}\" is not allowed to be empty"))
    }

    /// Build a validation error for a required field that was not supplied.
    #[must_use]
    pub fn required(field: &str) -> Self {
        Self(format!("\"{field}\" is required"))
    }
}
