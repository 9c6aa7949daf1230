use media_blob::KeyConfig;
use media_image::CompressionConfig;

/// Configuration for the media pipeline
#[derive(Debug, Clone)]
pub struct MediaConfig {
    /// Key derivation and public URL base
    pub keys: KeyConfig,

    /// Image normalization bounds
    pub compression: CompressionConfig,

    /// Cache-Control sent with every stored object
    pub cache_control: String,

    /// Max storage deletes in flight during a bulk delete
    pub delete_concurrency: usize,

    /// Largest accepted upload (safety guard)
    pub max_upload_bytes: u64,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            keys: KeyConfig::default(),
            compression: CompressionConfig::default(),
            // keys are never reused, so objects never change under a URL
            cache_control: "public, max-age=31536000, immutable".to_string(),
            delete_concurrency: 8,
            max_upload_bytes: 50 * 1024 * 1024, // 50MB
        }
    }
}

impl MediaConfig {
    /// Create a new config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_keys(mut self, keys: KeyConfig) -> Self {
        self.keys = keys;
        self
    }

    /// Shortcut for setting the public base URL
    pub fn with_public_base_url<S: Into<String>>(mut self, url: S) -> Self {
        self.keys = self.keys.with_public_base_url(url);
        self
    }

    pub fn with_compression(mut self, compression: CompressionConfig) -> Self {
        self.compression = compression;
        self
    }

    pub fn with_cache_control<S: Into<String>>(mut self, cache_control: S) -> Self {
        self.cache_control = cache_control.into();
        self
    }

    pub fn with_delete_concurrency(mut self, concurrency: usize) -> Self {
        self.delete_concurrency = concurrency.max(1);
        self
    }

    pub fn with_max_upload_bytes(mut self, bytes: u64) -> Self {
        self.max_upload_bytes = bytes;
        self
    }
}
