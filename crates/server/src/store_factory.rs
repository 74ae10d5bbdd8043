use std::sync::Arc;

#[cfg(feature = "mongodb")]
use mongodb::bson::doc;
#[cfg(feature = "mongodb")]
use tracing::info;

use tasklist_blob::BlobStore;
use tasklist_blob_memory::MemoryBlobStore;
#[cfg(feature = "mongodb")]
use tasklist_blob_gridfs::{GridFsBlobStore, GridFsConfig};
use tasklist_items::ItemRepository;
use tasklist_items_memory::MemoryItemRepository;
#[cfg(feature = "mongodb")]
use tasklist_items_mongo::{MongoItemRepository, MongoItemsConfig};

use crate::config::StorageConfig;
use crate::error::ServerError;

/// Item repository and blob store handles, plus whatever must be closed on
/// shutdown.
pub struct Storage {
    pub items: Arc<dyn ItemRepository>,
    pub blobs: Arc<dyn BlobStore>,
    #[cfg(feature = "mongodb")]
    client: Option<mongodb::Client>,
}

impl Storage {
    /// Storage backed entirely by memory.
    pub fn memory(chunk_size_bytes: u32) -> Self {
        let chunk_size = usize::try_from(chunk_size_bytes).unwrap_or(usize::MAX);
        Self {
            items: Arc::new(MemoryItemRepository::new()),
            blobs: Arc::new(MemoryBlobStore::with_chunk_size(chunk_size)),
            #[cfg(feature = "mongodb")]
            client: None,
        }
    }

    /// Release backend connections.
    pub async fn shutdown(self) {
        #[cfg(feature = "mongodb")]
        if let Some(client) = self.client {
            client.shutdown().await;
            info!("mongodb client closed");
        }
    }
}

/// Construct the item repository and blob store from configuration.
pub async fn create_storage(config: &StorageConfig) -> Result<Storage, ServerError> {
    match config.backend.as_str() {
        "memory" => Ok(Storage::memory(config.chunk_size_bytes)),
        #[cfg(feature = "mongodb")]
        "mongodb" => create_mongodb(config).await,
        other => Err(ServerError::Config(format!(
            "unsupported storage backend: {other} (is the feature enabled?)"
        ))),
    }
}

#[cfg(feature = "mongodb")]
async fn create_mongodb(config: &StorageConfig) -> Result<Storage, ServerError> {
    let client = mongodb::Client::with_uri_str(&config.url)
        .await
        .map_err(|e| ServerError::Config(format!("mongodb client: {e}")))?;
    let database = client.database(&config.database);
    database
        .run_command(doc! { "ping": 1 })
        .await
        .map_err(|e| ServerError::Config(format!("mongodb ping failed: {e}")))?;
    info!(database = %config.database, "connected to mongodb");

    let items = MongoItemRepository::new(
        &database,
        MongoItemsConfig {
            collection: config.items_collection.clone(),
        },
    )
    .await
    .map_err(|e| ServerError::Config(format!("mongodb items: {e}")))?;

    let blobs = GridFsBlobStore::new(
        &database,
        GridFsConfig {
            bucket: config.bucket.clone(),
            chunk_size_bytes: config.chunk_size_bytes,
        },
    );

    Ok(Storage {
        items: Arc::new(items),
        blobs: Arc::new(blobs),
        client: Some(client),
    })
}
