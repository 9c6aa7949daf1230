use std::sync::Arc;

use media_blob::{BlobStore, KeyDeriver};

use crate::types::require_id;
use crate::writer::AssetWriter;
use crate::{
    AssetId, AssetRepository, DeleteOrchestrator, DeleteReport, IngestOrchestrator, MediaAsset, MediaConfig,
    MediaCtx, MediaError, MediaResult, ReplaceOrchestrator, UploadFile,
};

/// The media pipeline - this is what request handlers embed.
///
/// Built explicitly from a store and a repository; holds no global state.
pub struct MediaPipeline {
    ingest: IngestOrchestrator,
    replace: ReplaceOrchestrator,
    delete: DeleteOrchestrator,
    repository: Arc<dyn AssetRepository>,
    keys: KeyDeriver,
    config: MediaConfig,
}

impl MediaPipeline {
    /// Create a new pipeline
    pub fn new<S, R>(store: S, repository: R, config: MediaConfig) -> Self
    where
        S: BlobStore + 'static,
        R: AssetRepository + 'static,
    {
        Self::from_shared(Arc::new(store), Arc::new(repository), config)
    }

    /// Create from already shared collaborators
    pub fn from_shared(
        store: Arc<dyn BlobStore>,
        repository: Arc<dyn AssetRepository>,
        config: MediaConfig,
    ) -> Self {
        let writer = AssetWriter::new(Arc::clone(&store), &config);
        let keys = writer.keys().clone();

        Self {
            ingest: IngestOrchestrator::new(writer.clone(), Arc::clone(&repository)),
            replace: ReplaceOrchestrator::new(writer, Arc::clone(&repository)),
            delete: DeleteOrchestrator::new(
                store,
                Arc::clone(&repository),
                keys.clone(),
                config.delete_concurrency,
            ),
            repository,
            keys,
            config,
        }
    }

    /// Upload a new file owned by the acting principal
    pub async fn upload(&self, ctx: &MediaCtx, file: UploadFile, path: Option<&str>) -> MediaResult<MediaAsset> {
        self.ingest.upload(ctx, file, path).await
    }

    /// Swap the bytes behind an existing asset
    pub async fn replace(&self, ctx: &MediaCtx, id: &AssetId, file: UploadFile) -> MediaResult<MediaAsset> {
        self.replace.replace(ctx, id, file).await
    }

    /// Change an asset's display filename
    pub async fn rename(&self, ctx: &MediaCtx, id: &AssetId, filename: &str) -> MediaResult<MediaAsset> {
        self.replace.rename(ctx, id, filename).await
    }

    /// Fetch one asset record
    pub async fn get(&self, id: &AssetId) -> MediaResult<MediaAsset> {
        require_id(id)?;
        self.repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| MediaError::not_found(id))
    }

    /// All assets uploaded by `uploader_id`
    pub async fn list_by_uploader(&self, uploader_id: &str) -> MediaResult<Vec<MediaAsset>> {
        self.repository.list_by_uploader(uploader_id).await
    }

    pub async fn delete_one(&self, ctx: &MediaCtx, id: &AssetId) -> MediaResult<DeleteReport> {
        self.delete.delete_one(ctx, id).await
    }

    pub async fn delete_many(&self, ctx: &MediaCtx, ids: &[AssetId]) -> MediaResult<DeleteReport> {
        self.delete.delete_many(ctx, ids).await
    }

    /// Storage key behind an asset URL
    pub fn key_for(&self, asset: &MediaAsset) -> String {
        self.keys.key_from_url(&asset.url)
    }

    pub fn ingest(&self) -> &IngestOrchestrator {
        &self.ingest
    }

    pub fn replacer(&self) -> &ReplaceOrchestrator {
        &self.replace
    }

    pub fn deleter(&self) -> &DeleteOrchestrator {
        &self.delete
    }

    /// Get configuration
    pub fn config(&self) -> &MediaConfig {
        &self.config
    }
}
