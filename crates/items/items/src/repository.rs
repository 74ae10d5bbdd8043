use async_trait::async_trait;

use tasklist_core::{Item, ItemChanges, ItemId, NewItem};

use crate::error::ItemError;

/// Persistence for item records.
///
/// Implementations validate the mutation before writing it, so callers may
/// hand over raw request values. Blob identifiers are stored as opaque
/// references; no implementation checks or deletes the blobs themselves.
#[async_trait]
pub trait ItemRepository: Send + Sync {
    /// All items, oldest first.
    async fn list(&self) -> Result<Vec<Item>, ItemError>;

    /// Look up a single item. Unknown and malformed ids both yield `None`.
    async fn get(&self, id: &ItemId) -> Result<Option<Item>, ItemError>;

    /// Insert a new item, assigning its id and timestamps.
    async fn create(&self, item: NewItem) -> Result<Item, ItemError>;

    /// Apply a partial update and return the stored result.
    async fn update(&self, id: &ItemId, changes: ItemChanges) -> Result<Item, ItemError>;

    /// Remove an item. Linked blobs are left untouched.
    async fn delete(&self, id: &ItemId) -> Result<(), ItemError>;
}
