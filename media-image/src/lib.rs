//! # media-image: size-targeting image normalization
//!
//! [`ImageCompressor`] takes raw upload bytes plus the declared mime type and
//! returns bytes fit for storage:
//!
//! 1. the longest side is capped (never upscaled), aspect ratio kept
//! 2. the image is re-encoded with the codec matching the declared type
//!    (unknown image families become JPEG)
//! 3. quality steps down from the initial value until the output fits the
//!    target size or the floor is hit, each retry encoding the decoded source
//! 4. resolution metadata is forced to the configured DPI
//!
//! Codec failures are never raised. The original bytes are returned and the
//! fallback is reported on [`Compressed::fallback`] and logged.
//!
//! ```rust
//! use media_image::{CompressionConfig, ImageCompressor};
//!
//! let compressor = ImageCompressor::new(CompressionConfig::default());
//! let out = compressor.compress(b"not an image", "image/png");
//! assert!(out.is_fallback());
//! assert_eq!(out.bytes, b"not an image");
//! ```

mod compressor;
mod config;
mod dimensions;
mod encode;
mod error;

pub use compressor::{Compressed, ImageCompressor};
pub use config::CompressionConfig;
pub use dimensions::{fit_within, Dimensions};
pub use encode::OutputFormat;
pub use error::{CompressError, CompressResult};
