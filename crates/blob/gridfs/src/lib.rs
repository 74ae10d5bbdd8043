pub mod config;
mod store;

pub use config::GridFsConfig;
pub use store::GridFsBlobStore;
