use std::sync::Arc;

use async_trait::async_trait;
use bson::oid::ObjectId;
use bson::{Bson, doc};
use futures::{AsyncWriteExt, StreamExt, TryStreamExt};
use mongodb::gridfs::{FilesCollectionDocument, GridFsBucket, GridFsUploadStream};
use mongodb::options::GridFsBucketOptions;
use mongodb::{Collection, Database};
use tokio_util::compat::FuturesAsyncReadCompatExt;
use tokio_util::io::ReaderStream;
use tracing::{debug, warn};

use tasklist_blob::{BlobDownload, BlobError, BlobMetadata, BlobStore, IngestStream};
use tasklist_core::BlobId;

use crate::config::GridFsConfig;

/// MongoDB `GridFS`-backed implementation of [`BlobStore`].
///
/// Uploads are written chunk by chunk through a `GridFS` upload stream; a
/// failed upload is aborted, which removes any chunks already written.
/// Downloads are exposed as a byte stream reading one chunk at a time.
pub struct GridFsBlobStore {
    bucket: GridFsBucket,
    files: Collection<FilesCollectionDocument>,
    config: Arc<GridFsConfig>,
}

impl GridFsBlobStore {
    /// Create a store over the bucket named in `config` inside `database`.
    ///
    /// The database handle is shared with the rest of the process; this
    /// constructor performs no I/O.
    pub fn new(database: &Database, config: GridFsConfig) -> Self {
        let options = GridFsBucketOptions::builder()
            .bucket_name(config.bucket.clone())
            .chunk_size_bytes(config.chunk_size_bytes)
            .build();
        let bucket = database.gridfs_bucket(options);
        let files = database.collection::<FilesCollectionDocument>(&config.files_collection());

        Self {
            bucket,
            files,
            config: Arc::new(config),
        }
    }

    /// Parse a blob id into an `ObjectId`; anything else cannot exist.
    fn object_id(id: &BlobId) -> Result<ObjectId, BlobError> {
        ObjectId::parse_str(id.as_str()).map_err(|_| BlobError::NotFound(id.to_string()))
    }

    async fn find_file(&self, oid: ObjectId) -> Result<Option<FilesCollectionDocument>, BlobError> {
        self.files
            .find_one(doc! { "_id": oid })
            .await
            .map_err(|e| BlobError::Backend(e.to_string()))
    }

    /// Abort an upload after a failure, discarding written chunks.
    async fn abandon(upload: &mut GridFsUploadStream) {
        if let Err(e) = upload.abort().await {
            warn!(error = %e, "failed to abort GridFS upload, chunks may be orphaned");
        }
    }
}

fn to_metadata(file: FilesCollectionDocument) -> BlobMetadata {
    let id = match &file.id {
        Bson::ObjectId(oid) => oid.to_hex(),
        other => other.to_string(),
    };
    BlobMetadata {
        id: BlobId::new(id),
        filename: file.filename.unwrap_or_default(),
        length: file.length,
        uploaded_at: file.upload_date.to_chrono(),
    }
}

#[async_trait]
impl BlobStore for GridFsBlobStore {
    async fn ingest(
        &self,
        filename: &str,
        mut content: IngestStream<'_>,
    ) -> Result<BlobMetadata, BlobError> {
        let mut upload = self
            .bucket
            .open_upload_stream(filename)
            .await
            .map_err(|e| BlobError::Write(e.to_string()))?;

        let mut length: u64 = 0;
        while let Some(next) = content.next().await {
            let chunk = match next {
                Ok(chunk) => chunk,
                Err(e) => {
                    Self::abandon(&mut upload).await;
                    return Err(BlobError::Write(format!("upload stream failed: {e}")));
                }
            };
            if let Err(e) = upload.write_all(&chunk).await {
                Self::abandon(&mut upload).await;
                return Err(BlobError::Write(e.to_string()));
            }
            length += chunk.len() as u64;
        }

        if let Err(e) = upload.close().await {
            Self::abandon(&mut upload).await;
            return Err(BlobError::Write(e.to_string()));
        }

        let oid = upload
            .id()
            .as_object_id()
            .ok_or_else(|| BlobError::Backend("GridFS assigned a non-ObjectId id".into()))?;
        debug!(blob_id = %oid, length, bucket = %self.config.bucket, "blob stored");

        Ok(BlobMetadata {
            id: BlobId::new(oid.to_hex()),
            filename: filename.to_owned(),
            length,
            uploaded_at: chrono::Utc::now(),
        })
    }

    async fn retrieve(&self, id: &BlobId) -> Result<BlobDownload, BlobError> {
        let oid = Self::object_id(id)?;
        let file = self
            .find_file(oid)
            .await?
            .ok_or_else(|| BlobError::NotFound(id.to_string()))?;

        let download = self
            .bucket
            .open_download_stream(Bson::ObjectId(oid))
            .await
            .map_err(|e| BlobError::Read(e.to_string()))?;

        let chunk_size = usize::try_from(file.chunk_size_bytes).unwrap_or(8 * 1024);
        let content = ReaderStream::with_capacity(download.compat(), chunk_size)
            .map(|chunk| chunk.map_err(|e| BlobError::Read(e.to_string())))
            .boxed();

        Ok(BlobDownload {
            metadata: to_metadata(file),
            content,
        })
    }

    async fn metadata(&self, id: &BlobId) -> Result<Option<BlobMetadata>, BlobError> {
        let Ok(oid) = Self::object_id(id) else {
            return Ok(None);
        };
        Ok(self.find_file(oid).await?.map(to_metadata))
    }

    async fn list(&self) -> Result<Vec<BlobMetadata>, BlobError> {
        let cursor = self
            .files
            .find(doc! {})
            .sort(doc! { "uploadDate": 1 })
            .await
            .map_err(|e| BlobError::Backend(e.to_string()))?;
        let files: Vec<FilesCollectionDocument> = cursor
            .try_collect()
            .await
            .map_err(|e| BlobError::Backend(e.to_string()))?;
        Ok(files.into_iter().map(to_metadata).collect())
    }

    async fn delete(&self, id: &BlobId) -> Result<bool, BlobError> {
        let Ok(oid) = Self::object_id(id) else {
            return Ok(false);
        };
        if self.find_file(oid).await?.is_none() {
            return Ok(false);
        }
        self.bucket
            .delete(Bson::ObjectId(oid))
            .await
            .map_err(|e| BlobError::Backend(e.to_string()))?;
        Ok(true)
    }
}
