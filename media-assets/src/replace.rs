use std::sync::Arc;

use media_blob::KeyDeriver;
use tracing::instrument;

use crate::types::require_id;
use crate::writer::AssetWriter;
use crate::{AssetId, AssetRepository, AssetUpdate, MediaAsset, MediaCtx, MediaError, MediaResult, UploadFile};

/// Swaps the bytes behind an existing record, keeping its id, owner and
/// creation time, and renames records.
pub struct ReplaceOrchestrator {
    writer: AssetWriter,
    repository: Arc<dyn AssetRepository>,
}

impl ReplaceOrchestrator {
    pub(crate) fn new(writer: AssetWriter, repository: Arc<dyn AssetRepository>) -> Self {
        Self { writer, repository }
    }

    /// Replace the stored object of `id` with `file`.
    ///
    /// The old object is removed best-effort first. The new object lands in
    /// the same folder under a fresh key, and the record is updated only after
    /// that put succeeded.
    #[instrument(
        name = "media.replace",
        skip(self, ctx, file),
        fields(request_id = %ctx.request_id, actor = %ctx.actor_id, role = ctx.role.as_str(), asset_id = %id)
    )]
    pub async fn replace(&self, ctx: &MediaCtx, id: &AssetId, file: UploadFile) -> MediaResult<MediaAsset> {
        require_id(id)?;
        self.writer.validate(&file)?;

        let existing = self
            .repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| MediaError::not_found(id))?;

        let old_key = self.writer.keys().key_from_url(&existing.url);
        if let Err(error) = self.writer.store().delete(&old_key).await {
            tracing::warn!(key = %old_key, %error, "failed to delete replaced object, continuing");
        }

        // foreign urls have no folder of ours to reuse
        let folder = if self.writer.keys().owns_url(&existing.url) {
            KeyDeriver::folder_of(&old_key)
        } else {
            tracing::warn!(url = %existing.url, "replaced url is outside the public base, writing to root");
            ""
        };
        let new_key = self.writer.keys().derive_key(&file.name, Some(folder));
        let written = self.writer.write(new_key, &file).await?;

        let updated = self
            .repository
            .update(
                id,
                AssetUpdate {
                    url: written.url,
                    media_type: written.media_type,
                    filename: file.name,
                    size: written.size,
                },
            )
            .await
            .inspect_err(|error| {
                tracing::error!(key = %written.key, %error, "record update failed after put, object orphaned");
            })?;

        tracing::info!(
            old_key = %old_key,
            new_key = %written.key,
            size = updated.size,
            fallback = written.fallback.is_some(),
            "media replaced"
        );
        Ok(updated)
    }

    /// Change only the display filename; the stored object is untouched
    #[instrument(
        name = "media.rename",
        skip(self, ctx),
        fields(request_id = %ctx.request_id, actor = %ctx.actor_id, role = ctx.role.as_str(), asset_id = %id)
    )]
    pub async fn rename(&self, ctx: &MediaCtx, id: &AssetId, filename: &str) -> MediaResult<MediaAsset> {
        require_id(id)?;
        let filename = filename.trim();
        if filename.is_empty() {
            return Err(MediaError::validation("File name is required"));
        }

        let renamed = self.repository.rename(id, filename).await?;
        tracing::info!(filename, "media renamed");
        Ok(renamed)
    }
}
