use serde::Deserialize;

/// Limits applied to multipart item uploads.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadsConfig {
    /// Maximum request payload in bytes, and ceiling on the combined size of
    /// all files in one request.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: u64,
}

impl Default for UploadsConfig {
    fn default() -> Self {
        Self {
            max_bytes: default_max_bytes(),
        }
    }
}

impl UploadsConfig {
    /// The ceiling as a `usize`, saturating on narrow targets.
    pub fn max_bytes_usize(&self) -> usize {
        usize::try_from(self.max_bytes).unwrap_or(usize::MAX)
    }
}

fn default_max_bytes() -> u64 {
    10 * 1024 * 1024
}
