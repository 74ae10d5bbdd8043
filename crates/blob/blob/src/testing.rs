use bytes::Bytes;
use futures::StreamExt;

use tasklist_core::BlobId;

use crate::error::BlobError;
use crate::store::{BlobStore, IngestStream};

/// Deterministic test payload of `len` bytes.
#[allow(clippy::cast_possible_truncation)]
pub fn sample_bytes(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}

/// Wrap `data` in an ingest stream that yields it in `piece`-sized chunks.
pub fn chunked(data: &[u8], piece: usize) -> IngestStream<'static> {
    let chunks: Vec<Result<Bytes, std::io::Error>> = data
        .chunks(piece.max(1))
        .map(|c| Ok(Bytes::copy_from_slice(c)))
        .collect();
    futures::stream::iter(chunks).boxed()
}

/// An ingest stream that yields `prefix` and then fails.
pub fn failing_after(prefix: &[u8]) -> IngestStream<'static> {
    let items: Vec<Result<Bytes, std::io::Error>> = vec![
        Ok(Bytes::copy_from_slice(prefix)),
        Err(std::io::Error::new(
            std::io::ErrorKind::ConnectionReset,
            "client went away",
        )),
    ];
    futures::stream::iter(items).boxed()
}

/// Drain a blob's content into memory.
pub async fn read_all(store: &dyn BlobStore, id: &BlobId) -> Result<Vec<u8>, BlobError> {
    let mut download = store.retrieve(id).await?;
    let mut out = Vec::new();
    while let Some(chunk) = download.content.next().await {
        out.extend_from_slice(&chunk?);
    }
    Ok(out)
}

/// Run the full blob store conformance test suite.
///
/// Call this from your backend's test module with a fresh store instance.
///
/// # Errors
///
/// Returns an error if any conformance test fails.
pub async fn run_blob_conformance_tests(store: &dyn BlobStore) -> Result<(), BlobError> {
    test_ingest_and_retrieve(store).await?;
    test_ingest_empty(store).await?;
    test_ids_are_unique(store).await?;
    test_retrieve_missing(store).await?;
    test_failed_stream_leaves_nothing(store).await?;
    test_metadata(store).await?;
    test_delete(store).await?;
    Ok(())
}

async fn test_ingest_and_retrieve(store: &dyn BlobStore) -> Result<(), BlobError> {
    // Odd-sized input pieces so chunk boundaries never line up.
    let data = sample_bytes(600 * 1024 + 17);
    let meta = store.ingest("song.mp3", chunked(&data, 7_777)).await?;
    assert_eq!(meta.filename, "song.mp3");
    assert_eq!(meta.length, data.len() as u64);

    let back = read_all(store, &meta.id).await?;
    assert_eq!(back.len(), data.len());
    assert!(back == data, "retrieved content should match ingested content");
    Ok(())
}

async fn test_ingest_empty(store: &dyn BlobStore) -> Result<(), BlobError> {
    let meta = store.ingest("empty.bin", chunked(&[], 1)).await?;
    assert_eq!(meta.length, 0);
    let back = read_all(store, &meta.id).await?;
    assert!(back.is_empty(), "empty blob should read back empty");
    Ok(())
}

async fn test_ids_are_unique(store: &dyn BlobStore) -> Result<(), BlobError> {
    let a = store.ingest("same.txt", chunked(b"same", 4)).await?;
    let b = store.ingest("same.txt", chunked(b"same", 4)).await?;
    assert_ne!(a.id, b.id, "every ingest should allocate a fresh id");
    Ok(())
}

async fn test_retrieve_missing(store: &dyn BlobStore) -> Result<(), BlobError> {
    for id in ["000000000000000000000000", "not a valid id", ""] {
        let result = store.retrieve(&BlobId::new(id)).await;
        assert!(
            matches!(result, Err(BlobError::NotFound(_))),
            "retrieve({id:?}) should be NotFound"
        );
        assert!(store.metadata(&BlobId::new(id)).await?.is_none());
    }
    Ok(())
}

async fn test_failed_stream_leaves_nothing(store: &dyn BlobStore) -> Result<(), BlobError> {
    let before = store.list().await?.len();
    let result = store
        .ingest("broken.png", failing_after(&sample_bytes(4096)))
        .await;
    assert!(
        matches!(result, Err(BlobError::Write(_))),
        "stream failure should surface as a write error"
    );
    let after = store.list().await?.len();
    assert_eq!(before, after, "a failed ingest must not leave a blob behind");
    Ok(())
}

async fn test_metadata(store: &dyn BlobStore) -> Result<(), BlobError> {
    let meta = store.ingest("photo.jpg", chunked(b"jpeg bytes", 3)).await?;
    let found = store
        .metadata(&meta.id)
        .await?
        .expect("metadata should exist after ingest");
    assert_eq!(found.id, meta.id);
    assert_eq!(found.filename, "photo.jpg");
    assert_eq!(found.length, 10);

    let listed = store.list().await?;
    assert!(listed.iter().any(|m| m.id == meta.id));
    Ok(())
}

async fn test_delete(store: &dyn BlobStore) -> Result<(), BlobError> {
    let meta = store.ingest("gone.wav", chunked(b"short-lived", 4)).await?;
    assert!(store.delete(&meta.id).await?, "delete should report existing blob");
    assert!(
        matches!(store.retrieve(&meta.id).await, Err(BlobError::NotFound(_))),
        "deleted blob should not be retrievable"
    );
    assert!(
        !store.delete(&meta.id).await?,
        "second delete should report missing blob"
    );
    Ok(())
}
