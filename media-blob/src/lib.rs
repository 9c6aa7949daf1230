//! # media-blob: object storage for the media asset pipeline
//!
//! Two concerns live here, both free of any metadata awareness:
//!
//! - **Keys**: [`KeyDeriver`] turns an uploaded filename into a unique storage
//!   key and maps keys to public URLs and back again.
//! - **Storage**: the [`BlobStore`] trait with put/delete primitives, an
//!   in-memory backend and an S3-compatible backend.
//!
//! ```rust
//! use bytes::Bytes;
//! use media_blob::prelude::*;
//!
//! # #[tokio::main]
//! # async fn main() -> BlobResult<()> {
//! let keys = KeyDeriver::new(KeyConfig::new().with_public_base_url("https://cdn.example.com"));
//! let store = MemoryBlobStore::new();
//!
//! let key = keys.derive_key("cover.png", Some("albums/7"));
//! store
//!     .put(&key, Bytes::from_static(b"..."), PutOptions::new().with_content_type("image/png"))
//!     .await?;
//!
//! let url = keys.build_url(&key);
//! assert_eq!(keys.key_from_url(&url), key);
//! # Ok(())
//! # }
//! ```

mod error;
mod keys;
mod memory;
mod s3_store;
pub mod store;

pub use error::{BlobError, BlobResult};
pub use keys::{KeyConfig, KeyDeriver};
pub use memory::{MemoryBlobStore, StoredObject};
pub use s3_store::{S3CompatibleStore, S3Config};
pub use store::{BlobStore, PutOptions, PutResult};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        BlobError, BlobResult, BlobStore, KeyConfig, KeyDeriver, MemoryBlobStore, PutOptions,
    };
}
