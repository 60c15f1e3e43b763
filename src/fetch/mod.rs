//! Selecting and retrieving the latest report artifact from object storage.

use futures::TryStreamExt;
use object_store::{path::Path, ObjectMeta, ObjectStore};
use tracing::info;

use crate::error::IngestError;

/// List every object under `prefix`. Fails with `StorageUnavailable` if the
/// listing call errors partway through the stream.
pub async fn list_candidates(
    store: &dyn ObjectStore,
    prefix: &str,
) -> Result<Vec<ObjectMeta>, IngestError> {
    let prefix = Path::from(prefix);
    let candidates: Vec<ObjectMeta> = store.list(Some(&prefix)).try_collect().await?;
    Ok(candidates)
}

/// Pick the most recently modified candidate. Ties are arbitrary; an empty
/// set yields `None`.
pub fn select_latest(candidates: &[ObjectMeta]) -> Option<&ObjectMeta> {
    candidates.iter().max_by_key(|meta| meta.last_modified)
}

/// Fetch an artifact's content and decode it as UTF-8 text (lossily, so a
/// stray non-UTF-8 byte in a report becomes a replacement character rather
/// than a failed run).
pub async fn fetch_content(
    store: &dyn ObjectStore,
    artifact: &ObjectMeta,
) -> Result<String, IngestError> {
    let data = store.get(&artifact.location).await?.bytes().await?;
    Ok(String::from_utf8_lossy(&data).into_owned())
}

/// List, select, and fetch in one step. Returns the chosen object's key and
/// its text. `EmptySource` short-circuits before any parsing: no candidate
/// under the prefix, or content that decodes to an empty string.
pub async fn latest_report(
    store: &dyn ObjectStore,
    prefix: &str,
) -> Result<(String, String), IngestError> {
    let candidates = list_candidates(store, prefix).await?;
    let latest = select_latest(&candidates).ok_or(IngestError::EmptySource)?;
    info!(
        key = %latest.location,
        last_modified = %latest.last_modified,
        candidates = candidates.len(),
        "selected latest report"
    );

    let text = fetch_content(store, latest).await?;
    if text.is_empty() {
        return Err(IngestError::EmptySource);
    }
    Ok((latest.location.to_string(), text))
}
