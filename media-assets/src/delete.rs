use std::collections::HashSet;
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use media_blob::{BlobStore, KeyDeriver};
use tracing::instrument;

use crate::types::require_id;
use crate::{AssetId, AssetRepository, DeleteReport, MediaCtx, MediaError, MediaResult, StorageFailure};

/// Removes assets: references first, then objects (best effort), then records.
pub struct DeleteOrchestrator {
    store: Arc<dyn BlobStore>,
    repository: Arc<dyn AssetRepository>,
    keys: KeyDeriver,
    concurrency: usize,
}

impl DeleteOrchestrator {
    pub(crate) fn new(
        store: Arc<dyn BlobStore>,
        repository: Arc<dyn AssetRepository>,
        keys: KeyDeriver,
        concurrency: usize,
    ) -> Self {
        Self {
            store,
            repository,
            keys,
            concurrency: concurrency.max(1),
        }
    }

    /// Delete a single asset; unknown ids are `NotFound`
    pub async fn delete_one(&self, ctx: &MediaCtx, id: &AssetId) -> MediaResult<DeleteReport> {
        require_id(id)?;
        if self.repository.find_by_id(id).await?.is_none() {
            return Err(MediaError::not_found(id));
        }
        self.delete_many(ctx, std::slice::from_ref(id)).await
    }

    /// Delete every known asset in `ids`; unknown ids are skipped.
    ///
    /// Storage failures don't stop anything: they are collected into the
    /// report and the records are deleted regardless.
    #[instrument(
        name = "media.delete_many",
        skip(self, ctx, ids),
        fields(request_id = %ctx.request_id, actor = %ctx.actor_id, role = ctx.role.as_str(), requested = ids.len())
    )]
    pub async fn delete_many(&self, ctx: &MediaCtx, ids: &[AssetId]) -> MediaResult<DeleteReport> {
        if ids.is_empty() {
            return Err(MediaError::validation("No media ids provided"));
        }
        for id in ids {
            require_id(id)?;
        }

        let mut seen = HashSet::new();
        let ids: Vec<AssetId> = ids.iter().filter(|id| seen.insert(*id)).cloned().collect();

        let assets = self.repository.find_by_ids(&ids).await?;
        if assets.is_empty() {
            tracing::info!("nothing to delete");
            return Ok(DeleteReport {
                requested: ids.len(),
                ..Default::default()
            });
        }
        let found: Vec<AssetId> = assets.iter().map(|asset| asset.id.clone()).collect();

        // join rows must go before the records they point at
        let unlinked = self.repository.delete_references(&found).await?;

        let storage_errors: Vec<StorageFailure> = stream::iter(assets)
            .map(|asset| {
                let store = Arc::clone(&self.store);
                let key = self.keys.key_from_url(&asset.url);
                async move {
                    match store.delete(&key).await {
                        Ok(()) => None,
                        Err(error) => {
                            tracing::warn!(asset_id = %asset.id, key = %key, %error, "object delete failed");
                            Some(StorageFailure {
                                asset_id: asset.id,
                                key,
                                message: error.to_string(),
                            })
                        }
                    }
                }
            })
            .buffered(self.concurrency)
            .filter_map(|failure| async move { failure })
            .collect()
            .await;

        let deleted_count = self.repository.delete_many(&found).await?;

        let report = DeleteReport {
            requested: ids.len(),
            deleted_count,
            storage_errors,
        };
        tracing::info!(
            deleted = report.deleted_count,
            unlinked,
            storage_errors = report.storage_errors.len(),
            "{}",
            report.summary()
        );
        Ok(report)
    }
}
