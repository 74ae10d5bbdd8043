use bson::oid::ObjectId;
use bson::{Bson, DateTime};
use serde::{Deserialize, Serialize};

use tasklist_core::{BlobId, Item, ItemId, NewItem};

/// Persisted form of an [`Item`].
///
/// Blob references are stored as `ObjectId`s when the id has that shape
/// (the `GridFS` backend), and as plain strings otherwise.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemDocument {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_id: Option<Bson>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_id: Option<Bson>,
    #[serde(default)]
    pub completed: bool,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

/// Encode a blob id for storage.
pub(crate) fn blob_ref(id: &BlobId) -> Bson {
    ObjectId::parse_str(id.as_str())
        .map_or_else(|_| Bson::String(id.to_string()), Bson::ObjectId)
}

fn blob_id(value: Bson) -> Option<BlobId> {
    match value {
        Bson::ObjectId(oid) => Some(BlobId::new(oid.to_hex())),
        Bson::String(s) => Some(BlobId::new(s)),
        _ => None,
    }
}

impl ItemDocument {
    /// Build a fresh document for `item`, stamped with `now`.
    pub fn from_new(item: NewItem, now: DateTime) -> Self {
        Self {
            id: ObjectId::new(),
            name: item.name,
            description: item.description,
            image_id: item.image_id.as_ref().map(blob_ref),
            audio_id: item.audio_id.as_ref().map(blob_ref),
            completed: item.completed,
            created_at: now,
            updated_at: now,
        }
    }
}

impl From<ItemDocument> for Item {
    fn from(doc: ItemDocument) -> Self {
        Self {
            id: ItemId::new(doc.id.to_hex()),
            name: doc.name,
            description: doc.description,
            image_id: doc.image_id.and_then(blob_id),
            audio_id: doc.audio_id.and_then(blob_id),
            completed: doc.completed,
            created_at: doc.created_at.to_chrono(),
            updated_at: doc.updated_at.to_chrono(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_id_blob_refs_round_trip_as_object_ids() {
        let hex = "65f1c0ffee0000000000abce";
        let stored = blob_ref(&BlobId::new(hex));
        assert!(matches!(stored, Bson::ObjectId(_)));
        assert_eq!(blob_id(stored), Some(BlobId::new(hex)));
    }

    #[test]
    fn other_blob_refs_are_stored_as_strings() {
        let stored = blob_ref(&BlobId::new("0b5c6e1a-uuid"));
        assert_eq!(stored, Bson::String("0b5c6e1a-uuid".into()));
        assert_eq!(blob_id(Bson::Null), None);
    }

    #[test]
    fn document_uses_camel_case_fields() {
        let mut new = NewItem::named("Buy milk");
        new.image_id = Some(BlobId::new("65f1c0ffee0000000000abce"));
        let doc = ItemDocument::from_new(new, DateTime::now());
        let raw = bson::to_document(&doc).unwrap();

        assert!(raw.get_object_id("_id").is_ok());
        assert!(raw.get_object_id("imageId").is_ok());
        assert!(raw.get_datetime("createdAt").is_ok());
        assert!(!raw.contains_key("audioId"));
        assert!(!raw.contains_key("description"));
        assert!(!raw.get_bool("completed").unwrap());
    }

    #[test]
    fn document_converts_to_item() {
        let now = DateTime::now();
        let doc = ItemDocument::from_new(NewItem::named("x"), now);
        let hex = doc.id.to_hex();
        let item = Item::from(doc);
        assert_eq!(item.id.as_str(), hex);
        assert_eq!(item.created_at, now.to_chrono());
        assert_eq!(item.created_at, item.updated_at);
    }
}
