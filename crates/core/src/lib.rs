pub mod error;
pub mod item;
pub mod types;

pub use error::ValidationError;
pub use item::{Item, ItemChanges, NewItem};
pub use types::{BlobId, ItemId};
