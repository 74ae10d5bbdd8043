use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::types::{BlobId, ItemId};

/// A to-do entry, optionally linked to an image and an audio blob.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[cfg_attr(feature = "openapi", schema(example = json!({
    "id": "65f1c0ffee0000000000abcd",
    "name": "Buy milk",
    "description": "Semi-skimmed",
    "imageId": "65f1c0ffee0000000000abce",
    "completed": false,
    "createdAt": "2025-01-01T00:00:00Z",
    "updatedAt": "2025-01-01T00:00:00Z"
})))]
pub struct Item {
    /// Unique item identifier.
    pub id: ItemId,

    /// Display name. Never empty.
    pub name: String,

    /// Free-form description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Blob holding the attached image, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_id: Option<BlobId>,

    /// Blob holding the attached audio clip, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_id: Option<BlobId>,

    /// Whether the item has been ticked off.
    #[serde(default)]
    pub completed: bool,

    /// When the item was created.
    pub created_at: DateTime<Utc>,

    /// When the item was last modified.
    pub updated_at: DateTime<Utc>,
}

/// Fields supplied when creating an item.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewItem {
    pub name: String,
    pub description: Option<String>,
    pub image_id: Option<BlobId>,
    pub audio_id: Option<BlobId>,
    pub completed: bool,
}

impl NewItem {
    /// Create a new item request with only the required name set.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Check the field constraints that every repository enforces.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.is_empty() {
            return Err(ValidationError::empty("name"));
        }
        if self.description.as_deref() == Some("") {
            return Err(ValidationError::empty("description"));
        }
        Ok(())
    }

    /// Materialise the record with the given identity and timestamp.
    #[must_use]
    pub fn into_item(self, id: ItemId, now: DateTime<Utc>) -> Item {
        Item {
            id,
            name: self.name,
            description: self.description,
            image_id: self.image_id,
            audio_id: self.audio_id,
            completed: self.completed,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A partial update. `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemChanges {
    pub name: Option<String>,
    pub description: Option<String>,
    pub image_id: Option<BlobId>,
    pub audio_id: Option<BlobId>,
    pub completed: Option<bool>,
}

impl ItemChanges {
    /// Check the constraints on the fields that are present.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.as_deref() == Some("") {
            return Err(ValidationError::empty("name"));
        }
        if self.description.as_deref() == Some("") {
            return Err(ValidationError::empty("description"));
        }
        Ok(())
    }

    /// Returns `true` if no field would change.
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.image_id.is_none()
            && self.audio_id.is_none()
            && self.completed.is_none()
    }

    /// Apply the present fields to `item` and stamp `updated_at`.
    pub fn apply(self, item: &mut Item, now: DateTime<Utc>) {
        if let Some(name) = self.name {
            item.name = name;
        }
        if let Some(description) = self.description {
            item.description = Some(description);
        }
        if let Some(image_id) = self.image_id {
            item.image_id = Some(image_id);
        }
        if let Some(audio_id) = self.audio_id {
            item.audio_id = Some(audio_id);
        }
        if let Some(completed) = self.completed {
            item.completed = completed;
        }
        item.updated_at = now;
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn sample_item() -> Item {
        let mut new = NewItem::named("Buy milk");
        new.description = Some("Semi-skimmed".into());
        new.image_id = Some(BlobId::new("img-1"));
        new.into_item(ItemId::new("item-1"), Utc::now())
    }

    #[test]
    fn new_item_requires_name() {
        let err = NewItem::default().validate().unwrap_err();
        assert_eq!(err.to_string(), "\"name\" is not allowed to be empty");
        assert!(NewItem::named("x").validate().is_ok());
    }

    #[test]
    fn new_item_rejects_empty_description() {
        let mut new = NewItem::named("x");
        new.description = Some(String::new());
        assert!(new.validate().is_err());
    }

    #[test]
    fn new_item_defaults_to_not_completed() {
        let item = NewItem::named("x").into_item(ItemId::new("1"), Utc::now());
        assert!(!item.completed);
        assert_eq!(item.created_at, item.updated_at);
    }

    #[test]
    fn changes_touch_only_present_fields() {
        let mut item = sample_item();
        let before = item.clone();
        let later = item.updated_at + Duration::seconds(5);

        ItemChanges {
            completed: Some(true),
            ..ItemChanges::default()
        }
        .apply(&mut item, later);

        assert!(item.completed);
        assert_eq!(item.name, before.name);
        assert_eq!(item.description, before.description);
        assert_eq!(item.image_id, before.image_id);
        assert_eq!(item.audio_id, before.audio_id);
        assert_eq!(item.created_at, before.created_at);
        assert_eq!(item.updated_at, later);
    }

    #[test]
    fn changes_reject_empty_name() {
        let changes = ItemChanges {
            name: Some(String::new()),
            ..ItemChanges::default()
        };
        assert!(changes.validate().is_err());
        assert!(ItemChanges::default().validate().is_ok());
        assert!(ItemChanges::default().is_empty());
    }

    #[test]
    fn item_json_uses_camel_case_and_omits_missing_blobs() {
        let item = NewItem::named("x").into_item(ItemId::new("1"), Utc::now());
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["id"], "1");
        assert_eq!(json["completed"], false);
        assert!(json.get("createdAt").is_some());
        assert!(json.get("imageId").is_none());
        assert!(json.get("audioId").is_none());
        assert!(json.get("description").is_none());
    }
}
