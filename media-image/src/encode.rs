use color_quant::NeuQuant;
use image::codecs::jpeg::{JpegEncoder, PixelDensity};
use image::DynamicImage;

use crate::{CompressError, CompressResult};

const METERS_PER_INCH: f64 = 0.0254;

/// Qualities at or above this keep PNG output truecolor
const PNG_LOSSLESS_QUALITY: u8 = 90;

/// NeuQuant sampling factor, 1 is slowest and best, 30 fastest
const NEUQUANT_SAMPLE_FACTOR: i32 = 10;

/// Codecs the compressor can produce
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Jpeg,
    Png,
    WebP,
}

impl OutputFormat {
    /// Codec matching a declared mime type, `None` for any other family
    pub fn from_mime(mime: &str) -> Option<Self> {
        let essence = mime.split(';').next().unwrap_or_default().trim().to_ascii_lowercase();
        match essence.as_str() {
            "image/jpeg" | "image/jpg" | "image/pjpeg" => Some(Self::Jpeg),
            "image/png" => Some(Self::Png),
            "image/webp" => Some(Self::WebP),
            _ => None,
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::WebP => "image/webp",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Jpeg => "jpeg",
            Self::Png => "png",
            Self::WebP => "webp",
        }
    }

    /// Encode `image` at `quality` with `dpi` resolution metadata.
    ///
    /// JPEG and WebP honor quality directly. PNG stays truecolor at 90 and
    /// above and is quantized to a smaller palette for every step below.
    /// WebP carries no resolution field.
    pub(crate) fn encode(&self, image: &DynamicImage, quality: u8, dpi: u16) -> CompressResult<Vec<u8>> {
        match self {
            Self::Jpeg => encode_jpeg(image, quality, dpi),
            Self::Png => encode_png(image, quality, dpi),
            Self::WebP => encode_webp(image, quality),
        }
    }
}

fn encode_jpeg(image: &DynamicImage, quality: u8, dpi: u16) -> CompressResult<Vec<u8>> {
    // no alpha channel in JPEG
    let rgb = DynamicImage::ImageRgb8(image.to_rgb8());

    let mut out = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut out, quality);
    encoder.set_pixel_density(PixelDensity::dpi(dpi));
    rgb.write_with_encoder(encoder)
        .map_err(|e| CompressError::encode("jpeg", e))?;
    Ok(out)
}

/// Palette size for a lossy PNG rung: 256 colors just below the lossless
/// threshold, halving with each further 5 points, never under 2.
fn palette_size(quality: u8) -> usize {
    let steps = u32::from(PNG_LOSSLESS_QUALITY.saturating_sub(quality).saturating_sub(1) / 5);
    (256usize >> steps.min(7)).max(2)
}

fn encode_png(image: &DynamicImage, quality: u8, dpi: u16) -> CompressResult<Vec<u8>> {
    let has_alpha = image.color().has_alpha();
    let pixels_per_meter = (dpi as f64 / METERS_PER_INCH).round() as u32;

    let mut out = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut out, image.width(), image.height());
        encoder.set_depth(png::BitDepth::Eight);
        encoder.set_compression(png::Compression::Best);
        encoder.set_pixel_dims(Some(png::PixelDimensions {
            xppu: pixels_per_meter,
            yppu: pixels_per_meter,
            unit: png::Unit::Meter,
        }));

        let data = if quality >= PNG_LOSSLESS_QUALITY {
            if has_alpha {
                encoder.set_color(png::ColorType::Rgba);
                image.to_rgba8().into_raw()
            } else {
                encoder.set_color(png::ColorType::Rgb);
                image.to_rgb8().into_raw()
            }
        } else {
            let rgba = image.to_rgba8().into_raw();
            let quantizer = NeuQuant::new(NEUQUANT_SAMPLE_FACTOR, palette_size(quality), &rgba);

            let palette = quantizer.color_map_rgba();
            let (rgb, alpha): (Vec<[u8; 3]>, Vec<u8>) = palette
                .chunks_exact(4)
                .map(|entry| ([entry[0], entry[1], entry[2]], entry[3]))
                .unzip();

            encoder.set_color(png::ColorType::Indexed);
            encoder.set_palette(rgb.concat());
            if has_alpha {
                encoder.set_trns(alpha);
            }
            rgba.chunks_exact(4)
                .map(|pixel| quantizer.index_of(pixel) as u8)
                .collect()
        };

        let mut writer = encoder
            .write_header()
            .map_err(|e| CompressError::encode("png", e))?;
        writer
            .write_image_data(&data)
            .map_err(|e| CompressError::encode("png", e))?;
        writer.finish().map_err(|e| CompressError::encode("png", e))?;
    }
    Ok(out)
}

fn encode_webp(image: &DynamicImage, quality: u8) -> CompressResult<Vec<u8>> {
    // libwebp only takes 8-bit RGB or RGBA
    let normalized = if image.color().has_alpha() {
        DynamicImage::ImageRgba8(image.to_rgba8())
    } else {
        DynamicImage::ImageRgb8(image.to_rgb8())
    };

    let encoder = webp::Encoder::from_image(&normalized).map_err(|reason| CompressError::encode("webp", reason))?;
    Ok(encoder.encode(f32::from(quality)).to_vec())
}
