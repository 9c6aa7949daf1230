use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;

use crate::{AssetId, AssetRepository, AssetUpdate, MediaAsset, MediaError, MediaResult, NewAsset};

/// In-memory metadata store for testing and development.
///
/// Join-table rows behave like foreign keys: a record that is still
/// referenced cannot be deleted.
#[derive(Clone, Default)]
pub struct MemoryAssetRepository {
    /// Asset records indexed by id
    assets: Arc<RwLock<HashMap<AssetId, MediaAsset>>>,

    /// Join-table rows: asset id -> referencing owners (listings, posts...)
    references: Arc<RwLock<HashMap<AssetId, BTreeSet<String>>>>,
}

impl MemoryAssetRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `owner_ref` references asset `id`
    pub fn link_reference<S: Into<String>>(&self, id: &AssetId, owner_ref: S) -> MediaResult<()> {
        if !self.assets.read().contains_key(id) {
            return Err(MediaError::not_found(id));
        }
        self.references
            .write()
            .entry(id.clone())
            .or_default()
            .insert(owner_ref.into());
        Ok(())
    }

    /// Owners referencing asset `id`
    pub fn references_for(&self, id: &AssetId) -> Vec<String> {
        self.references
            .read()
            .get(id)
            .map(|owners| owners.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.assets.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.read().is_empty()
    }
}

#[async_trait]
impl AssetRepository for MemoryAssetRepository {
    async fn create(&self, asset: NewAsset) -> MediaResult<MediaAsset> {
        let now = Utc::now();
        let record = MediaAsset {
            id: AssetId::new(),
            url: asset.url,
            media_type: asset.media_type,
            filename: asset.filename,
            size: asset.size,
            uploader_id: asset.uploader_id,
            created_at: now,
            updated_at: now,
        };
        self.assets.write().insert(record.id.clone(), record.clone());
        Ok(record)
    }

    async fn find_by_id(&self, id: &AssetId) -> MediaResult<Option<MediaAsset>> {
        Ok(self.assets.read().get(id).cloned())
    }

    async fn find_by_ids(&self, ids: &[AssetId]) -> MediaResult<Vec<MediaAsset>> {
        let assets = self.assets.read();
        Ok(ids.iter().filter_map(|id| assets.get(id).cloned()).collect())
    }

    async fn list_by_uploader(&self, uploader_id: &str) -> MediaResult<Vec<MediaAsset>> {
        let mut owned: Vec<MediaAsset> = self
            .assets
            .read()
            .values()
            .filter(|asset| asset.uploader_id == uploader_id)
            .cloned()
            .collect();
        owned.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(owned)
    }

    async fn update(&self, id: &AssetId, update: AssetUpdate) -> MediaResult<MediaAsset> {
        let mut assets = self.assets.write();
        let record = assets.get_mut(id).ok_or_else(|| MediaError::not_found(id))?;

        record.url = update.url;
        record.media_type = update.media_type;
        record.filename = update.filename;
        record.size = update.size;
        record.updated_at = Utc::now();
        Ok(record.clone())
    }

    async fn rename(&self, id: &AssetId, filename: &str) -> MediaResult<MediaAsset> {
        let mut assets = self.assets.write();
        let record = assets.get_mut(id).ok_or_else(|| MediaError::not_found(id))?;

        record.filename = filename.to_string();
        record.updated_at = Utc::now();
        Ok(record.clone())
    }

    async fn delete_references(&self, ids: &[AssetId]) -> MediaResult<u64> {
        let mut references = self.references.write();
        let removed = ids
            .iter()
            .filter_map(|id| references.remove(id))
            .map(|owners| owners.len() as u64)
            .sum();
        Ok(removed)
    }

    async fn delete_many(&self, ids: &[AssetId]) -> MediaResult<u64> {
        let references = self.references.read();
        if let Some(id) = ids.iter().find(|id| references.get(*id).is_some_and(|o| !o.is_empty())) {
            return Err(MediaError::repository(format!(
                "media {} is still referenced and cannot be deleted",
                id
            )));
        }

        let mut assets = self.assets.write();
        let removed = ids.iter().filter(|id| assets.remove(*id).is_some()).count();
        Ok(removed as u64)
    }
}
