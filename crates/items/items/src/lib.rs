pub mod error;
pub mod repository;
pub mod testing;

pub use error::ItemError;
pub use repository::ItemRepository;
