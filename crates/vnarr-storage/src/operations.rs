//! High-level storage operations.

use tracing::debug;

use vnarr_models::keys::collages_prefix;
use vnarr_models::VideoListing;

use crate::client::{ObjectInfo, ObjectStore};
use crate::error::StorageResult;

/// List every `.mp4` object in the bucket.
pub async fn list_videos(store: &dyn ObjectStore) -> StorageResult<Vec<VideoListing>> {
    let objects = store.list_objects("").await?;

    Ok(objects
        .into_iter()
        .filter(|obj| VideoListing::is_video_key(&obj.key))
        .map(|obj| VideoListing::from_key(obj.key))
        .collect())
}

/// List the rendered collages of a video in backend listing order.
pub async fn list_collages(
    store: &dyn ObjectStore,
    namespace: &str,
    video_key: &str,
) -> StorageResult<Vec<ObjectInfo>> {
    let prefix = collages_prefix(namespace, video_key);
    let collages: Vec<ObjectInfo> = store
        .list_objects(&prefix)
        .await?
        .into_iter()
        .filter(|obj| obj.key.ends_with(".jpg"))
        .collect();

    debug!(prefix = %prefix, count = collages.len(), "Listed collages");
    Ok(collages)
}
