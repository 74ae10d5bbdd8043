use async_trait::async_trait;
use bson::oid::ObjectId;
use bson::{DateTime, Document, doc};
use futures::TryStreamExt;
use mongodb::error::ErrorKind;
use mongodb::options::ReturnDocument;
use mongodb::{Collection, Database};
use tracing::debug;

use tasklist_core::{Item, ItemChanges, ItemId, NewItem};
use tasklist_items::{ItemError, ItemRepository};

use crate::config::MongoItemsConfig;
use crate::document::{ItemDocument, blob_ref};
use crate::indexes;

/// Map a driver error, separating (de)serialization failures from the rest.
fn storage_error(e: mongodb::error::Error) -> ItemError {
    match *e.kind {
        ErrorKind::BsonDeserialization(ref inner) => ItemError::Serialization(inner.to_string()),
        ErrorKind::BsonSerialization(ref inner) => ItemError::Serialization(inner.to_string()),
        _ => ItemError::Backend(e.to_string()),
    }
}

/// Build the `$set` body for a partial update.
fn set_document(changes: ItemChanges, now: DateTime) -> Document {
    let mut set = doc! { "updatedAt": now };
    if let Some(name) = changes.name {
        set.insert("name", name);
    }
    if let Some(description) = changes.description {
        set.insert("description", description);
    }
    if let Some(image_id) = changes.image_id {
        set.insert("imageId", blob_ref(&image_id));
    }
    if let Some(audio_id) = changes.audio_id {
        set.insert("audioId", blob_ref(&audio_id));
    }
    if let Some(completed) = changes.completed {
        set.insert("completed", completed);
    }
    set
}

/// `MongoDB`-backed implementation of [`ItemRepository`].
///
/// One document per item in the configured collection, keyed by an
/// `ObjectId`. Ids that are not 24-digit hex strings cannot name a document
/// and are reported as missing.
pub struct MongoItemRepository {
    collection: Collection<ItemDocument>,
}

impl MongoItemRepository {
    /// Create a repository over `config.collection` in `database`.
    ///
    /// Ensures the list-ordering index exists before returning.
    ///
    /// # Errors
    ///
    /// Returns [`ItemError::Backend`] if index creation fails.
    pub async fn new(database: &Database, config: MongoItemsConfig) -> Result<Self, ItemError> {
        let collection = database.collection::<ItemDocument>(&config.collection);
        indexes::ensure_indexes(&collection)
            .await
            .map_err(storage_error)?;
        debug!(collection = %config.collection, "item collection ready");
        Ok(Self { collection })
    }

    fn object_id(id: &ItemId) -> Option<ObjectId> {
        ObjectId::parse_str(id.as_str()).ok()
    }
}

#[async_trait]
impl ItemRepository for MongoItemRepository {
    async fn list(&self) -> Result<Vec<Item>, ItemError> {
        let cursor = self
            .collection
            .find(doc! {})
            .sort(doc! { "createdAt": 1, "_id": 1 })
            .await
            .map_err(storage_error)?;
        let docs: Vec<ItemDocument> = cursor.try_collect().await.map_err(storage_error)?;
        Ok(docs.into_iter().map(Item::from).collect())
    }

    async fn get(&self, id: &ItemId) -> Result<Option<Item>, ItemError> {
        let Some(oid) = Self::object_id(id) else {
            return Ok(None);
        };
        let found = self
            .collection
            .find_one(doc! { "_id": oid })
            .await
            .map_err(storage_error)?;
        Ok(found.map(Item::from))
    }

    async fn create(&self, item: NewItem) -> Result<Item, ItemError> {
        item.validate()?;
        let document = ItemDocument::from_new(item, DateTime::now());
        self.collection
            .insert_one(&document)
            .await
            .map_err(storage_error)?;
        Ok(document.into())
    }

    async fn update(&self, id: &ItemId, changes: ItemChanges) -> Result<Item, ItemError> {
        changes.validate()?;
        let oid = Self::object_id(id).ok_or_else(|| ItemError::NotFound(id.to_string()))?;
        let updated = self
            .collection
            .find_one_and_update(
                doc! { "_id": oid },
                doc! { "$set": set_document(changes, DateTime::now()) },
            )
            .return_document(ReturnDocument::After)
            .await
            .map_err(storage_error)?;
        updated
            .map(Item::from)
            .ok_or_else(|| ItemError::NotFound(id.to_string()))
    }

    async fn delete(&self, id: &ItemId) -> Result<(), ItemError> {
        let oid = Self::object_id(id).ok_or_else(|| ItemError::NotFound(id.to_string()))?;
        let result = self
            .collection
            .delete_one(doc! { "_id": oid })
            .await
            .map_err(storage_error)?;
        if result.deleted_count == 0 {
            return Err(ItemError::NotFound(id.to_string()));
        }
        Ok(())
    }
}


#[cfg(all(test, feature = "integration"))]
mod integration_tests {
    use tasklist_items::testing::run_item_conformance_tests;

    use super::*;

    async fn scratch_database() -> Database {
        let url = std::env::var("TASKLIST_MONGO_URL")
            .unwrap_or_else(|_| "mongodb://localhost:27017".to_owned());
        let client = mongodb::Client::with_uri_str(&url)
            .await
            .expect("MongoDB should be reachable");
        client.database(&format!("tasklist_test_{}", uuid::Uuid::new_v4().simple()))
    }

    #[tokio::test]
    async fn conformance() {
        let db = scratch_database().await;
        let repo = MongoItemRepository::new(&db, MongoItemsConfig::default())
            .await
            .expect("repository should initialise");
        run_item_conformance_tests(&repo)
            .await
            .expect("conformance tests should pass");
        db.drop().await.expect("scratch database should drop");
    }

    #[tokio::test]
    async fn timestamps_survive_a_round_trip() {
        let db = scratch_database().await;
        let repo = MongoItemRepository::new(&db, MongoItemsConfig::default())
            .await
            .unwrap();
        let created = repo.create(NewItem::named("precise")).await.unwrap();
        let fetched = repo.get(&created.id).await.unwrap().unwrap();
        assert_eq!(fetched.created_at, created.created_at);
        assert!(fetched.created_at <= chrono::Utc::now());
        db.drop().await.unwrap();
    }
}
