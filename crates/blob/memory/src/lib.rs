mod store;

pub use store::{DEFAULT_CHUNK_SIZE, MemoryBlobStore};
