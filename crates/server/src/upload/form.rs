use tasklist_core::{BlobId, ItemChanges, NewItem, ValidationError};

/// A file slot on an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileSlot {
    Image,
    Audio,
}

impl FileSlot {
    fn field(self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Audio => "audio",
        }
    }

    fn parse(name: &str) -> Option<Self> {
        match name {
            "image" => Some(Self::Image),
            "audio" => Some(Self::Audio),
            _ => None,
        }
    }
}

/// Accumulates the fields of one item form as its parts arrive.
///
/// Every recognised field may appear at most once; anything else is
/// rejected before any further part is read.
#[derive(Debug, Default)]
pub struct ItemForm {
    name: Option<String>,
    description: Option<String>,
    completed: Option<bool>,
    image_id: Option<BlobId>,
    audio_id: Option<BlobId>,
    claimed: Vec<FileSlot>,
}

fn not_allowed(field: &str) -> ValidationError {
    ValidationError(format!("\"{field}\" is not allowed"))
}

fn repeated(field: &str) -> ValidationError {
    ValidationError(format!("\"{field}\" must not be repeated"))
}

/// Coerce a form value to a boolean. Accepts `true` and `false`, ignoring
/// surrounding whitespace.
pub fn parse_completed(value: &str) -> Result<bool, ValidationError> {
    match value.trim() {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(ValidationError("\"completed\" must be a boolean".to_owned())),
    }
}

fn non_empty(field: &str, value: String) -> Result<String, ValidationError> {
    if value.is_empty() {
        return Err(ValidationError::empty(field));
    }
    Ok(value)
}

fn set_once<T>(slot: &mut Option<T>, field: &str, value: T) -> Result<(), ValidationError> {
    if slot.is_some() {
        return Err(repeated(field));
    }
    *slot = Some(value);
    Ok(())
}

impl ItemForm {
    /// Record a text part. Text sent under a file field carries no upload
    /// and is skipped, as is an empty file input.
    pub fn set_text(&mut self, field: &str, value: String) -> Result<(), ValidationError> {
        match field {
            "name" => set_once(&mut self.name, field, non_empty(field, value)?),
            "description" => set_once(&mut self.description, field, non_empty(field, value)?),
            "completed" => set_once(&mut self.completed, field, parse_completed(&value)?),
            "image" | "audio" => Ok(()),
            _ => Err(not_allowed(field)),
        }
    }

    /// Reserve the slot for a file part before its content is read.
    pub fn claim_file(&mut self, field: &str) -> Result<FileSlot, ValidationError> {
        let slot = FileSlot::parse(field).ok_or_else(|| not_allowed(field))?;
        if self.claimed.contains(&slot) {
            return Err(repeated(slot.field()));
        }
        self.claimed.push(slot);
        Ok(slot)
    }

    /// Link a stored blob into a claimed slot.
    pub fn attach(&mut self, slot: FileSlot, id: BlobId) {
        match slot {
            FileSlot::Image => self.image_id = Some(id),
            FileSlot::Audio => self.audio_id = Some(id),
        }
    }

    /// Finish a creation form. `name` is required.
    pub fn into_new_item(self) -> Result<NewItem, ValidationError> {
        let name = self.name.ok_or_else(|| ValidationError::required("name"))?;
        Ok(NewItem {
            name,
            description: self.description,
            image_id: self.image_id,
            audio_id: self.audio_id,
            completed: self.completed.unwrap_or(false),
        })
    }

    /// Finish an update form. Absent fields stay unchanged.
    pub fn into_changes(self) -> ItemChanges {
        ItemChanges {
            name: self.name,
            description: self.description,
            image_id: self.image_id,
            audio_id: self.audio_id,
            completed: self.completed,
        }
    }
}
