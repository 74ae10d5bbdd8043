use tasklist_core::{BlobId, ItemChanges, ItemId, NewItem};

use crate::error::ItemError;
use crate::repository::ItemRepository;

/// Ids that no backend can have issued: a well-formed but unused `ObjectId`,
/// and values that are not ids at all.
const MISSING_IDS: [&str; 3] = ["000000000000000000000000", "not an id", ""];

/// Run the full item repository conformance test suite.
///
/// Call this from your backend's test module with a fresh repository. The
/// suite only asserts on items it creates, so a shared backend is fine.
///
/// # Errors
///
/// Returns an error if any conformance test fails.
pub async fn run_item_conformance_tests(repo: &dyn ItemRepository) -> Result<(), ItemError> {
    test_create_and_get(repo).await?;
    test_create_rejects_invalid(repo).await?;
    test_list_is_oldest_first(repo).await?;
    test_update_is_partial(repo).await?;
    test_update_rejects_invalid(repo).await?;
    test_missing_ids(repo).await?;
    test_delete(repo).await?;
    Ok(())
}

async fn test_create_and_get(repo: &dyn ItemRepository) -> Result<(), ItemError> {
    let created = repo
        .create(NewItem {
            name: "Buy milk".into(),
            description: Some("Semi-skimmed".into()),
            image_id: Some(BlobId::new("image-blob")),
            audio_id: Some(BlobId::new("audio-blob")),
            completed: false,
        })
        .await?;

    assert!(!created.id.as_str().is_empty(), "create should assign an id");
    assert_eq!(created.name, "Buy milk");
    assert_eq!(created.description.as_deref(), Some("Semi-skimmed"));
    assert_eq!(created.image_id, Some(BlobId::new("image-blob")));
    assert_eq!(created.audio_id, Some(BlobId::new("audio-blob")));
    assert!(!created.completed);
    assert_eq!(created.created_at, created.updated_at);

    let fetched = repo
        .get(&created.id)
        .await?
        .expect("created item should be retrievable");
    assert_eq!(fetched.id, created.id);
    assert_eq!(fetched.name, created.name);
    assert_eq!(fetched.image_id, created.image_id);
    assert_eq!(fetched.audio_id, created.audio_id);

    let listed = repo.list().await?;
    assert_eq!(
        listed.iter().filter(|i| i.id == created.id).count(),
        1,
        "created item should be listed exactly once"
    );
    Ok(())
}

async fn test_create_rejects_invalid(repo: &dyn ItemRepository) -> Result<(), ItemError> {
    let before = repo.list().await?.len();

    let empty_name = repo.create(NewItem::named("")).await;
    assert!(
        matches!(empty_name, Err(ItemError::Validation(_))),
        "empty name should be a validation error"
    );

    let mut empty_description = NewItem::named("ok");
    empty_description.description = Some(String::new());
    assert!(matches!(
        repo.create(empty_description).await,
        Err(ItemError::Validation(_))
    ));

    assert_eq!(repo.list().await?.len(), before, "rejected create must not persist");
    Ok(())
}

async fn test_list_is_oldest_first(repo: &dyn ItemRepository) -> Result<(), ItemError> {
    let first = repo.create(NewItem::named("first")).await?;
    let second = repo.create(NewItem::named("second")).await?;
    let third = repo.create(NewItem::named("third")).await?;

    let listed = repo.list().await?;
    let position = |id: &ItemId| listed.iter().position(|i| &i.id == id);
    let (a, b, c) = (position(&first.id), position(&second.id), position(&third.id));
    assert!(a.is_some() && b.is_some() && c.is_some(), "all items listed");
    assert!(a < b && b < c, "items should be listed in creation order");
    Ok(())
}

async fn test_update_is_partial(repo: &dyn ItemRepository) -> Result<(), ItemError> {
    let mut new = NewItem::named("Walk dog");
    new.description = Some("Around the block".into());
    new.image_id = Some(BlobId::new("dog-photo"));
    let created = repo.create(new).await?;

    let updated = repo
        .update(
            &created.id,
            ItemChanges {
                completed: Some(true),
                ..ItemChanges::default()
            },
        )
        .await?;

    assert!(updated.completed);
    assert_eq!(updated.id, created.id);
    assert_eq!(updated.name, created.name);
    assert_eq!(updated.description, created.description);
    assert_eq!(updated.image_id, created.image_id);
    assert_eq!(updated.audio_id, None);
    assert_eq!(updated.created_at, created.created_at);
    assert!(updated.updated_at >= created.updated_at);

    let relinked = repo
        .update(
            &created.id,
            ItemChanges {
                name: Some("Walk both dogs".into()),
                audio_id: Some(BlobId::new("bark")),
                ..ItemChanges::default()
            },
        )
        .await?;
    assert_eq!(relinked.name, "Walk both dogs");
    assert_eq!(relinked.audio_id, Some(BlobId::new("bark")));
    assert!(relinked.completed, "earlier change should persist");

    let stored = repo
        .get(&created.id)
        .await?
        .expect("updated item should still exist");
    assert_eq!(stored.name, "Walk both dogs");
    assert!(stored.completed);
    Ok(())
}

async fn test_update_rejects_invalid(repo: &dyn ItemRepository) -> Result<(), ItemError> {
    let created = repo.create(NewItem::named("Keep me")).await?;
    let result = repo
        .update(
            &created.id,
            ItemChanges {
                name: Some(String::new()),
                ..ItemChanges::default()
            },
        )
        .await;
    assert!(matches!(result, Err(ItemError::Validation(_))));

    let stored = repo.get(&created.id).await?.expect("item should remain");
    assert_eq!(stored.name, "Keep me", "rejected update must not persist");
    Ok(())
}

async fn test_missing_ids(repo: &dyn ItemRepository) -> Result<(), ItemError> {
    for raw in MISSING_IDS {
        let id = ItemId::new(raw);
        assert!(repo.get(&id).await?.is_none(), "get({raw:?}) should be None");

        let update = repo
            .update(
                &id,
                ItemChanges {
                    completed: Some(true),
                    ..ItemChanges::default()
                },
            )
            .await;
        assert!(
            matches!(update, Err(ItemError::NotFound(_))),
            "update({raw:?}) should be NotFound"
        );
        assert!(
            matches!(repo.delete(&id).await, Err(ItemError::NotFound(_))),
            "delete({raw:?}) should be NotFound"
        );
    }
    Ok(())
}

async fn test_delete(repo: &dyn ItemRepository) -> Result<(), ItemError> {
    let created = repo.create(NewItem::named("Short-lived")).await?;
    repo.delete(&created.id).await?;

    assert!(repo.get(&created.id).await?.is_none());
    assert!(
        !repo.list().await?.iter().any(|i| i.id == created.id),
        "deleted item should not be listed"
    );
    assert!(
        matches!(repo.delete(&created.id).await, Err(ItemError::NotFound(_))),
        "second delete should be NotFound"
    );
    Ok(())
}
