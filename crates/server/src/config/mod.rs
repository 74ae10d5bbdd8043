mod cors;
mod server;
mod storage;
mod uploads;


pub use cors::*;
pub use server::*;
pub use storage::*;
pub use uploads::*;

use std::path::Path;

use serde::Deserialize;

use crate::error::ServerError;

/// Top-level configuration for the Tasklist server, loaded from a TOML file.
#[derive(Debug, Default, Deserialize)]
pub struct TasklistConfig {
    /// HTTP server bind configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Cross-origin access for the browser client.
    #[serde(default)]
    pub cors: CorsConfig,
    /// Item and blob storage backend.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Multipart upload limits.
    #[serde(default)]
    pub uploads: UploadsConfig,
}

impl TasklistConfig {
    /// Load configuration from `path`, falling back to defaults if the file
    /// does not exist.
    pub fn load(path: &Path) -> Result<Self, ServerError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)?;
        toml::from_str(&contents)
            .map_err(|e| ServerError::Config(format!("{}: {e}", path.display())))
    }
}
