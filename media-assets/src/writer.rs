use std::sync::Arc;

use bytes::Bytes;
use media_blob::{BlobStore, KeyDeriver, PutOptions};
use media_image::{Compressed, ImageCompressor};
use tracing::Span;

use crate::{MediaConfig, MediaError, MediaResult, MediaType, UploadFile};

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// An object that made it into storage
#[derive(Debug, Clone)]
pub(crate) struct WrittenObject {
    pub key: String,
    pub url: String,
    pub media_type: MediaType,
    pub content_type: String,
    pub size: u64,
    /// Why image normalization kept the original bytes, if it did
    pub fallback: Option<String>,
}

/// Shared upload path for ingestion and replacement: validate, normalize
/// images, put the bytes.
#[derive(Clone)]
pub(crate) struct AssetWriter {
    store: Arc<dyn BlobStore>,
    keys: KeyDeriver,
    compressor: ImageCompressor,
    cache_control: String,
    max_upload_bytes: u64,
}

impl AssetWriter {
    pub fn new(store: Arc<dyn BlobStore>, config: &MediaConfig) -> Self {
        Self {
            store,
            keys: KeyDeriver::new(config.keys.clone()),
            compressor: ImageCompressor::new(config.compression.clone()),
            cache_control: config.cache_control.clone(),
            max_upload_bytes: config.max_upload_bytes,
        }
    }

    pub fn keys(&self) -> &KeyDeriver {
        &self.keys
    }

    pub fn store(&self) -> &Arc<dyn BlobStore> {
        &self.store
    }

    pub fn validate(&self, file: &UploadFile) -> MediaResult<()> {
        if file.name.trim().is_empty() {
            return Err(MediaError::validation("File name is required"));
        }
        if file.bytes.is_empty() {
            return Err(MediaError::validation("File is empty"));
        }
        if file.bytes.len() as u64 > self.max_upload_bytes {
            return Err(MediaError::validation(format!(
                "File exceeds maximum size of {} bytes",
                self.max_upload_bytes
            )));
        }
        Ok(())
    }

    /// Normalize `file` if it is an image and store it under `key`.
    ///
    /// A failed put is fatal and reported as `UploadFailed`.
    pub async fn write(&self, key: String, file: &UploadFile) -> MediaResult<WrittenObject> {
        let media_type = file.media_type();
        let declared = if file.mime_type.trim().is_empty() {
            DEFAULT_CONTENT_TYPE.to_string()
        } else {
            file.mime_type.clone()
        };

        let (body, content_type, fallback) = match media_type {
            MediaType::Image => {
                let compressed = self.normalize_image(file.bytes.clone(), declared).await;
                if let Some(reason) = &compressed.fallback {
                    tracing::warn!(key = %key, reason = %reason, "storing original image bytes");
                } else if compressed.coerced {
                    tracing::info!(key = %key, content_type = %compressed.content_type, "image re-encoded as jpeg");
                }
                (Bytes::from(compressed.bytes), compressed.content_type, compressed.fallback)
            }
            _ => (file.bytes.clone(), declared, None),
        };

        let options = PutOptions::new()
            .with_content_type(content_type.clone())
            .with_cache_control(self.cache_control.clone());

        let size = body.len() as u64;
        self.store
            .put(&key, body, options)
            .await
            .map_err(|source| {
                tracing::error!(key = %key, error = %source, "object put failed");
                MediaError::upload_failed(key.clone(), source)
            })?;

        Ok(WrittenObject {
            url: self.keys.build_url(&key),
            key,
            media_type,
            content_type,
            size,
            fallback,
        })
    }

    /// Compression is CPU bound, so it runs on the blocking pool inside the
    /// caller's span
    async fn normalize_image(&self, input: Bytes, declared: String) -> Compressed {
        let compressor = self.compressor.clone();
        let source = input.clone();
        let mime = declared.clone();
        let span = Span::current();

        match tokio::task::spawn_blocking(move || span.in_scope(|| compressor.compress(&source, &mime))).await {
            Ok(compressed) => compressed,
            Err(error) => {
                tracing::warn!(%error, "compression task failed, keeping original bytes");
                Compressed::original(&input, &declared, error.to_string())
            }
        }
    }
}
