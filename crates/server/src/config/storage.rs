use serde::Deserialize;

/// Configuration for the item and blob storage backends.
#[derive(Debug, Deserialize)]
pub struct StorageConfig {
    /// Which backend to use: `"memory"` or `"mongodb"`.
    #[serde(default = "default_backend")]
    pub backend: String,

    /// `MongoDB` connection string.
    #[serde(default = "default_url")]
    pub url: String,

    /// Database holding both the item collection and the blob bucket.
    #[serde(default = "default_database")]
    pub database: String,

    /// Collection holding item documents.
    #[serde(default = "default_items_collection")]
    pub items_collection: String,

    /// `GridFS` bucket name for uploaded files.
    #[serde(default = "default_bucket")]
    pub bucket: String,

    /// Size of each stored blob chunk in bytes.
    #[serde(default = "default_chunk_size_bytes")]
    pub chunk_size_bytes: u32,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            url: default_url(),
            database: default_database(),
            items_collection: default_items_collection(),
            bucket: default_bucket(),
            chunk_size_bytes: default_chunk_size_bytes(),
        }
    }
}

fn default_backend() -> String {
    if cfg!(feature = "mongodb") {
        "mongodb".to_owned()
    } else {
        "memory".to_owned()
    }
}

fn default_url() -> String {
    "mongodb://localhost:27017".to_owned()
}

fn default_database() -> String {
    "todolist".to_owned()
}

fn default_items_collection() -> String {
    "items".to_owned()
}

fn default_bucket() -> String {
    "uploads".to_owned()
}

fn default_chunk_size_bytes() -> u32 {
    255 * 1024
}
