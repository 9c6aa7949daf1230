use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use crate::{BlobResult, BlobStore, PutOptions, PutResult};

/// An object held by [`MemoryBlobStore`]
#[derive(Debug, Clone)]
pub struct StoredObject {
    pub body: Bytes,
    pub content_type: Option<String>,
    pub cache_control: Option<String>,
    pub stored_at: DateTime<Utc>,
}

/// In-memory store for testing and development
#[derive(Clone, Default)]
pub struct MemoryBlobStore {
    objects: Arc<RwLock<HashMap<String, StoredObject>>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch a copy of the object stored under `key`
    pub fn get(&self, key: &str) -> Option<StoredObject> {
        self.objects.read().get(key).cloned()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.objects.read().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.objects.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.read().is_empty()
    }

    /// All stored keys, sorted
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.objects.read().keys().cloned().collect();
        keys.sort();
        keys
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(&self, key: &str, body: Bytes, options: PutOptions) -> BlobResult<PutResult> {
        let size_bytes = body.len() as u64;
        let object = StoredObject {
            body,
            content_type: options.content_type,
            cache_control: options.cache_control,
            stored_at: Utc::now(),
        };
        self.objects.write().insert(key.to_string(), object);
        tracing::debug!(key, size_bytes, "stored object in memory");

        Ok(PutResult {
            etag: None,
            size_bytes,
        })
    }

    async fn delete(&self, key: &str) -> BlobResult<()> {
        if self.objects.write().remove(key).is_none() {
            tracing::debug!(key, "delete of absent key ignored");
        }
        Ok(())
    }
}
