use bson::doc;
use mongodb::options::IndexOptions;
use mongodb::{Collection, IndexModel};

use crate::document::ItemDocument;

/// Name of the index backing the list ordering.
pub(crate) const CREATED_AT_INDEX: &str = "createdAt_1__id_1";

/// Create the indexes the repository relies on, if they do not exist.
///
/// `list` sorts on `(createdAt, _id)`; the compound index keeps that sort
/// off the in-memory path as the collection grows.
///
/// # Errors
///
/// Returns a [`mongodb::error::Error`] if index creation fails.
pub(crate) async fn ensure_indexes(
    collection: &Collection<ItemDocument>,
) -> Result<(), mongodb::error::Error> {
    let created_at = IndexModel::builder()
        .keys(doc! { "createdAt": 1, "_id": 1 })
        .options(
            IndexOptions::builder()
                .name(CREATED_AT_INDEX.to_owned())
                .build(),
        )
        .build();
    collection.create_index(created_at).await?;
    Ok(())
}
