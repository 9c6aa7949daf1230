use media_blob::BlobError;
use thiserror::Error;

/// Result type for media pipeline operations
pub type MediaResult<T> = Result<T, MediaError>;

/// Errors surfaced by the media pipeline.
///
/// Storage delete failures never show up here; they are logged or collected
/// into a [`DeleteReport`](crate::DeleteReport).
#[derive(Error, Debug)]
pub enum MediaError {
    /// Rejected before any side effect
    #[error("{message}")]
    Validation { message: String },

    #[error("Media not found: {id}")]
    NotFound { id: String },

    /// Writing the object failed; no metadata was touched
    #[error("Upload failed for {key}: {source}")]
    UploadFailed {
        key: String,
        #[source]
        source: BlobError,
    },

    #[error("Metadata store error: {source}")]
    Repository {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl MediaError {
    /// Create a validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a not found error
    pub fn not_found<S: ToString>(id: S) -> Self {
        Self::NotFound { id: id.to_string() }
    }

    /// Create an upload failed error
    pub fn upload_failed<S: Into<String>>(key: S, source: BlobError) -> Self {
        Self::UploadFailed {
            key: key.into(),
            source,
        }
    }

    /// Create a repository error from any error type
    pub fn repository<E>(error: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Self::Repository { source: error.into() }
    }

    /// True for errors a client can act on (bad input, unknown id)
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Validation { .. } | Self::NotFound { .. })
    }
}
