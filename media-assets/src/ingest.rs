use std::sync::Arc;

use tracing::instrument;

use crate::writer::AssetWriter;
use crate::{AssetRepository, MediaAsset, MediaCtx, MediaResult, NewAsset, UploadFile};

/// Handles new uploads: derive key, normalize, store, then record.
pub struct IngestOrchestrator {
    writer: AssetWriter,
    repository: Arc<dyn AssetRepository>,
}

impl IngestOrchestrator {
    pub(crate) fn new(writer: AssetWriter, repository: Arc<dyn AssetRepository>) -> Self {
        Self { writer, repository }
    }

    /// Store `file` for the acting principal, optionally under the `path` folder.
    ///
    /// The record is only created once the object is stored. If the record
    /// write then fails the stored object is left behind as an orphan.
    #[instrument(
        name = "media.upload",
        skip(self, ctx, file),
        fields(request_id = %ctx.request_id, actor = %ctx.actor_id, role = ctx.role.as_str(), filename = %file.name)
    )]
    pub async fn upload(&self, ctx: &MediaCtx, file: UploadFile, path: Option<&str>) -> MediaResult<MediaAsset> {
        self.writer.validate(&file)?;

        let key = self.writer.keys().derive_key(&file.name, path);
        let written = self.writer.write(key, &file).await?;

        let asset = self
            .repository
            .create(NewAsset {
                url: written.url,
                media_type: written.media_type,
                filename: file.name,
                size: written.size,
                uploader_id: ctx.actor_id.clone(),
            })
            .await
            .inspect_err(|error| {
                tracing::error!(key = %written.key, %error, "record write failed after put, object orphaned");
            })?;

        tracing::info!(
            asset_id = %asset.id,
            key = %written.key,
            content_type = %written.content_type,
            size = asset.size,
            fallback = written.fallback.is_some(),
            "media uploaded"
        );
        Ok(asset)
    }
}
