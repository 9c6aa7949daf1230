use async_trait::async_trait;
use bytes::Bytes;

use crate::BlobResult;

/// Object storage primitives. Implementations know nothing about asset metadata
/// and never retry internally; retry policy belongs to the caller.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store `body` under `key`, replacing any existing object
    async fn put(&self, key: &str, body: Bytes, options: PutOptions) -> BlobResult<PutResult>;

    /// Delete the object stored under `key`.
    ///
    /// Deleting a key that does not exist succeeds.
    async fn delete(&self, key: &str) -> BlobResult<()>;
}

/// Per-object headers sent along with a put
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PutOptions {
    pub content_type: Option<String>,
    pub cache_control: Option<String>,
}

impl PutOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_content_type<S: Into<String>>(mut self, content_type: S) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn with_cache_control<S: Into<String>>(mut self, cache_control: S) -> Self {
        self.cache_control = Some(cache_control.into());
        self
    }
}

/// Result of a successful put operation
#[derive(Debug, Clone)]
pub struct PutResult {
    pub etag: Option<String>,
    pub size_bytes: u64,
}
