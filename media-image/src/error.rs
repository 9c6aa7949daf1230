use thiserror::Error;

/// Result type for codec operations
pub type CompressResult<T> = Result<T, CompressError>;

/// Codec failures. These never reach callers of
/// [`ImageCompressor::compress`](crate::ImageCompressor::compress); they only
/// show up in the fallback report.
#[derive(Error, Debug)]
pub enum CompressError {
    #[error("Failed to decode image: {source}")]
    Decode {
        #[source]
        source: image::ImageError,
    },

    #[error("Failed to encode {format}: {reason}")]
    Encode { format: &'static str, reason: String },

    #[error("Image has no pixels")]
    Empty,
}

impl CompressError {
    pub fn encode<E: std::fmt::Display>(format: &'static str, error: E) -> Self {
        Self::Encode {
            format,
            reason: error.to_string(),
        }
    }
}
