//! # media-assets: media asset lifecycle
//!
//! Keeps object storage and the asset metadata store consistent across
//! uploads, replacements and deletions, even though the two fail
//! independently:
//!
//! - a failed object put never leaves a record behind
//! - a record is only pointed at a new object after that object is stored
//! - failed object deletes are logged or reported, never fatal
//!
//! The accepted cost is the occasional orphaned object.
//!
//! ```text
//! ┌──────────────────────────────────────────┐
//! │               MediaPipeline              │
//! ├─────────────┬──────────────┬─────────────┤
//! │   Ingest    │   Replace    │   Delete    │  ← orchestrators
//! ├─────────────┴──────┬───────┴─────────────┤
//! │ KeyDeriver, ImageCompressor, BlobStore   │  ← media-blob / media-image
//! ├────────────────────┴─────────────────────┤
//! │             AssetRepository              │  ← metadata
//! └──────────────────────────────────────────┘
//! ```
//!
//! ```rust
//! use media_assets::{MediaConfig, MediaCtx, MediaPipeline, MemoryAssetRepository, UploadFile};
//! use media_blob::MemoryBlobStore;
//!
//! # #[tokio::main]
//! # async fn main() -> media_assets::MediaResult<()> {
//! let pipeline = MediaPipeline::new(
//!     MemoryBlobStore::new(),
//!     MemoryAssetRepository::new(),
//!     MediaConfig::new().with_public_base_url("https://cdn.example.com/media"),
//! );
//! let ctx = MediaCtx::new("user-123");
//!
//! let file = UploadFile::new("notes.pdf", "application/pdf", b"%PDF-1.7".to_vec());
//! let asset = pipeline.upload(&ctx, file, Some("docs")).await?;
//! assert!(asset.url.starts_with("https://cdn.example.com/media/docs/notes-"));
//!
//! let report = pipeline.delete_many(&ctx, &[asset.id]).await?;
//! assert_eq!(report.deleted_count, 1);
//! # Ok(())
//! # }
//! ```

mod config;
mod delete;
mod error;
mod ingest;
mod memory;
mod pipeline;
mod replace;
pub mod repository;
mod types;
mod writer;

pub use config::MediaConfig;
pub use delete::DeleteOrchestrator;
pub use error::{MediaError, MediaResult};
pub use ingest::IngestOrchestrator;
pub use memory::MemoryAssetRepository;
pub use pipeline::MediaPipeline;
pub use replace::ReplaceOrchestrator;
pub use repository::AssetRepository;
pub use types::{
    AssetId, AssetUpdate, DeleteReport, MediaAsset, MediaCtx, MediaType, NewAsset, Role, StorageFailure,
    UploadFile,
};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        AssetId, AssetRepository, DeleteReport, MediaAsset, MediaConfig, MediaCtx, MediaError, MediaPipeline,
        MediaResult, MediaType, UploadFile,
    };
}
