pub mod config;
mod document;
mod indexes;
mod repository;

pub use config::MongoItemsConfig;
pub use repository::MongoItemRepository;
