pub mod error;
pub mod store;
pub mod testing;
pub mod types;

pub use error::BlobError;
pub use store::{BlobStore, BlobStream, IngestStream};
pub use types::{BlobDownload, BlobMetadata};
