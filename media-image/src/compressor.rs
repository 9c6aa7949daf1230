use image::imageops::FilterType;
use image::DynamicImage;

use crate::dimensions::{fit_within, Dimensions};
use crate::{CompressError, CompressResult, CompressionConfig, OutputFormat};

/// Outcome of [`ImageCompressor::compress`]
#[derive(Debug, Clone)]
pub struct Compressed {
    /// Bytes to store
    pub bytes: Vec<u8>,

    /// Content type to store the bytes under
    pub content_type: String,

    /// True when an unsupported image family was re-encoded as JPEG
    pub coerced: bool,

    /// Output dimensions, `None` when the original bytes were kept
    pub dimensions: Option<Dimensions>,

    /// Quality of the final encode, `None` when the original bytes were kept
    pub quality: Option<u8>,

    /// Why the original bytes were kept, if they were
    pub fallback: Option<String>,
}

impl Compressed {
    /// The untouched input, kept for `reason`
    pub fn original(input: &[u8], declared_mime: &str, reason: String) -> Self {
        Self {
            bytes: input.to_vec(),
            content_type: declared_mime.to_string(),
            coerced: false,
            dimensions: None,
            quality: None,
            fallback: Some(reason),
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.fallback.is_some()
    }
}

/// Stateless image normalizer: caps dimensions, re-encodes with a
/// size-targeting quality ladder and stamps the configured DPI.
#[derive(Debug, Clone, Default)]
pub struct ImageCompressor {
    config: CompressionConfig,
}

impl ImageCompressor {
    pub fn new(config: CompressionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CompressionConfig {
        &self.config
    }

    /// Normalize `input`, declared as `declared_mime`.
    ///
    /// Never fails: on any decode or encode error the original bytes come
    /// back untouched with [`Compressed::fallback`] set.
    pub fn compress(&self, input: &[u8], declared_mime: &str) -> Compressed {
        match self.try_compress(input, declared_mime) {
            Ok(compressed) => compressed,
            Err(error) => {
                tracing::warn!(
                    %error,
                    declared_mime,
                    size_bytes = input.len(),
                    "image compression failed, keeping original bytes"
                );
                Compressed::original(input, declared_mime, error.to_string())
            }
        }
    }

    fn try_compress(&self, input: &[u8], declared_mime: &str) -> CompressResult<Compressed> {
        let (format, coerced) = match OutputFormat::from_mime(declared_mime) {
            Some(format) => (format, false),
            None => (OutputFormat::Jpeg, true),
        };

        let decoded = image::load_from_memory(input).map_err(|source| CompressError::Decode { source })?;
        let source = Dimensions::new(decoded.width(), decoded.height());
        if source.width == 0 || source.height == 0 {
            return Err(CompressError::Empty);
        }

        let target = fit_within(source, self.config.max_dimension);
        let pixels = if target == source {
            decoded
        } else {
            decoded.resize_exact(target.width, target.height, FilterType::Lanczos3)
        };

        let (bytes, quality) = self.encode_to_target(&pixels, format)?;

        tracing::debug!(
            format = format.name(),
            coerced,
            quality,
            input_bytes = input.len(),
            output_bytes = bytes.len(),
            width = target.width,
            height = target.height,
            "compressed image"
        );

        Ok(Compressed {
            bytes,
            content_type: if coerced {
                format.content_type().to_string()
            } else {
                declared_mime.to_string()
            },
            coerced,
            dimensions: Some(target),
            quality: Some(quality),
            fallback: None,
        })
    }

    /// Walk down the quality ladder until the output fits the target size or
    /// the floor is reached. Every attempt encodes `pixels` afresh, never a
    /// previous attempt's output.
    fn encode_to_target(&self, pixels: &DynamicImage, format: OutputFormat) -> CompressResult<(Vec<u8>, u8)> {
        let mut ladder = self.config.quality_ladder();
        let mut quality = ladder.next().unwrap_or(self.config.initial_quality);
        let mut bytes = format.encode(pixels, quality, self.config.dpi)?;

        while bytes.len() > self.config.target_size_bytes {
            let Some(next) = ladder.next() else {
                break;
            };
            quality = next;
            bytes = format.encode(pixels, quality, self.config.dpi)?;
        }

        Ok((bytes, quality))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
    use std::io::Cursor;

    fn textured_jpeg(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::from_fn(width, height, |x, y| {
            let v = (x.wrapping_mul(31) ^ y.wrapping_mul(17)).wrapping_mul(2654435761) >> 24;
            Rgb([v as u8, (x % 256) as u8, (y % 256) as u8])
        });
        let mut out = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(img)
            .write_to(&mut out, ImageFormat::Jpeg)
            .unwrap();
        out.into_inner()
    }

    #[test]
    fn retries_encode_from_the_decoded_source() {
        let input = textured_jpeg(320, 240);
        let compressor = ImageCompressor::new(CompressionConfig::new().with_target_size(1));

        let out = compressor.compress(&input, "image/jpeg");
        assert_eq!(out.quality, Some(60));

        // a single fresh encode of the decoded source at the floor quality
        let decoded = image::load_from_memory(&input).unwrap();
        let direct = OutputFormat::Jpeg.encode(&decoded, 60, 72).unwrap();
        assert_eq!(out.bytes, direct);
    }

    fn noise(width: u32, height: u32) -> RgbaImage {
        let mut state: u32 = 0x2545_F491;
        RgbaImage::from_fn(width, height, |_, _| {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            let [r, g, b, a] = state.to_le_bytes();
            Rgba([r, g, b, a | 0x80])
        })
    }

    fn rung_sizes(format: OutputFormat, image: &DynamicImage, qualities: &[u8]) -> Vec<usize> {
        qualities
            .iter()
            .map(|quality| format.encode(image, *quality, 72).unwrap().len())
            .collect()
    }

    #[test]
    fn png_output_shrinks_down_the_ladder() {
        let image = DynamicImage::ImageRgb8(DynamicImage::ImageRgba8(noise(300, 300)).to_rgb8());
        let sizes = rung_sizes(OutputFormat::Png, &image, &[90, 85, 75, 60]);
        assert!(sizes.windows(2).all(|pair| pair[0] > pair[1]), "{sizes:?}");
    }

    #[test]
    fn png_with_alpha_keeps_transparency_when_quantized() {
        let image = DynamicImage::ImageRgba8(noise(64, 64));
        let bytes = OutputFormat::Png.encode(&image, 60, 72).unwrap();
        let decoded = image::load_from_memory_with_format(&bytes, ImageFormat::Png).unwrap();
        assert!(decoded.color().has_alpha());
        assert_eq!((decoded.width(), decoded.height()), (64, 64));
    }

    #[test]
    fn webp_output_shrinks_down_the_ladder() {
        let image = DynamicImage::ImageRgb8(DynamicImage::ImageRgba8(noise(300, 300)).to_rgb8());
        let sizes = rung_sizes(OutputFormat::WebP, &image, &[90, 60]);
        assert!(sizes[0] > sizes[1], "{sizes:?}");
    }

    #[test]
    fn large_png_is_stored_smaller_than_its_lossless_encode() {
        let rgb = DynamicImage::ImageRgba8(noise(900, 900)).to_rgb8();
        let mut input = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(rgb).write_to(&mut input, ImageFormat::Png).unwrap();
        let input = input.into_inner();

        let out = ImageCompressor::default().compress(&input, "image/png");
        assert!(!out.is_fallback(), "{:?}", out.fallback);
        assert!(out.quality.unwrap() < 90);
        assert!(out.bytes.len() < input.len() / 2, "{} vs {}", out.bytes.len(), input.len());
    }

    #[test]
    fn first_encode_that_fits_wins() {
        let input = textured_jpeg(64, 64);
        let out = ImageCompressor::default().compress(&input, "image/jpeg");
        assert_eq!(out.quality, Some(90));
        assert!(!out.is_fallback());
    }
}
