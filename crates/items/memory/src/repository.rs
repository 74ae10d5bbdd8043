use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use uuid::Uuid;

use tasklist_core::{Item, ItemChanges, ItemId, NewItem};
use tasklist_items::{ItemError, ItemRepository};

#[derive(Debug, Clone)]
struct Entry {
    /// Insertion sequence, breaks ties between equal `created_at` values.
    seq: u64,
    item: Item,
}

/// In-memory [`ItemRepository`] backed by a [`DashMap`].
///
/// Intended for tests and single-process development; contents are lost on
/// restart.
#[derive(Debug, Default)]
pub struct MemoryItemRepository {
    items: DashMap<String, Entry>,
    next_seq: AtomicU64,
}

impl MemoryItemRepository {
    /// Create a new, empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` if no items are stored.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[async_trait]
impl ItemRepository for MemoryItemRepository {
    async fn list(&self) -> Result<Vec<Item>, ItemError> {
        let mut entries: Vec<Entry> = self.items.iter().map(|e| e.value().clone()).collect();
        entries.sort_by(|a, b| {
            a.item
                .created_at
                .cmp(&b.item.created_at)
                .then(a.seq.cmp(&b.seq))
        });
        Ok(entries.into_iter().map(|e| e.item).collect())
    }

    async fn get(&self, id: &ItemId) -> Result<Option<Item>, ItemError> {
        Ok(self.items.get(id.as_str()).map(|e| e.item.clone()))
    }

    async fn create(&self, item: NewItem) -> Result<Item, ItemError> {
        item.validate()?;
        let id = ItemId::new(Uuid::new_v4().to_string());
        let item = item.into_item(id, Utc::now());
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        self.items.insert(
            item.id.to_string(),
            Entry {
                seq,
                item: item.clone(),
            },
        );
        Ok(item)
    }

    async fn update(&self, id: &ItemId, changes: ItemChanges) -> Result<Item, ItemError> {
        changes.validate()?;
        let mut entry = self
            .items
            .get_mut(id.as_str())
            .ok_or_else(|| ItemError::NotFound(id.to_string()))?;
        changes.apply(&mut entry.item, Utc::now());
        Ok(entry.item.clone())
    }

    async fn delete(&self, id: &ItemId) -> Result<(), ItemError> {
        self.items
            .remove(id.as_str())
            .map(|_| ())
            .ok_or_else(|| ItemError::NotFound(id.to_string()))
    }
}
