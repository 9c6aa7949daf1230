use async_trait::async_trait;

use crate::{AssetId, AssetUpdate, MediaAsset, MediaResult, NewAsset};

/// Metadata store for asset records.
///
/// Implementations must make each single-record write atomic. Nothing here
/// touches object storage.
#[async_trait]
pub trait AssetRepository: Send + Sync {
    /// Insert a new record with a fresh id and timestamps
    async fn create(&self, asset: NewAsset) -> MediaResult<MediaAsset>;

    async fn find_by_id(&self, id: &AssetId) -> MediaResult<Option<MediaAsset>>;

    /// Records for the given ids; unknown ids are skipped
    async fn find_by_ids(&self, ids: &[AssetId]) -> MediaResult<Vec<MediaAsset>>;

    /// Records uploaded by `uploader_id`, oldest first
    async fn list_by_uploader(&self, uploader_id: &str) -> MediaResult<Vec<MediaAsset>>;

    /// Swap url, type, filename and size. Fails with `NotFound` for unknown ids.
    async fn update(&self, id: &AssetId, update: AssetUpdate) -> MediaResult<MediaAsset>;

    /// Change only the display filename
    async fn rename(&self, id: &AssetId, filename: &str) -> MediaResult<MediaAsset>;

    /// Remove join-table rows that point at any of `ids`; returns rows removed
    async fn delete_references(&self, ids: &[AssetId]) -> MediaResult<u64>;

    /// Remove the records for `ids`; returns records removed
    async fn delete_many(&self, ids: &[AssetId]) -> MediaResult<u64>;
}
