use std::io::Cursor;

use image::{DynamicImage, GenericImageView, ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
use media_image::{CompressionConfig, ImageCompressor};
use tracing_test::traced_test;

/// Deterministic high-frequency texture so encoders can't shrink it to nothing
fn texture(width: u32, height: u32) -> RgbImage {
    let mut state: u32 = 0x9E37_79B9;
    RgbImage::from_fn(width, height, |x, y| {
        state ^= state << 13;
        state ^= state >> 17;
        state ^= state << 5;
        let noise = (state >> 24) as u8;
        Rgb([
            noise,
            ((x * 255) / width.max(1)) as u8 ^ (noise >> 2),
            ((y * 255) / height.max(1)) as u8,
        ])
    })
}

fn encode(image: DynamicImage, format: ImageFormat) -> Vec<u8> {
    let mut out = Cursor::new(Vec::new());
    image.write_to(&mut out, format).unwrap();
    out.into_inner()
}

fn jfif_density(jpeg: &[u8]) -> (u8, u16, u16) {
    let at = jpeg
        .windows(5)
        .position(|w| w == b"JFIF\0")
        .expect("JFIF header");
    let units = jpeg[at + 7];
    let x = u16::from_be_bytes([jpeg[at + 8], jpeg[at + 9]]);
    let y = u16::from_be_bytes([jpeg[at + 10], jpeg[at + 11]]);
    (units, x, y)
}

fn png_phys(png: &[u8]) -> (u32, u32, u8) {
    let at = png.windows(4).position(|w| w == b"pHYs").expect("pHYs chunk") + 4;
    let x = u32::from_be_bytes(png[at..at + 4].try_into().unwrap());
    let y = u32::from_be_bytes(png[at + 4..at + 8].try_into().unwrap());
    (x, y, png[at + 8])
}

#[test]
fn large_jpeg_is_capped_and_size_targeted() {
    let input = encode(DynamicImage::ImageRgb8(texture(3000, 2000)), ImageFormat::Jpeg);
    assert!(input.len() > 500 * 1024, "fixture too small: {}", input.len());

    let config = CompressionConfig::default();
    let out = ImageCompressor::new(config.clone()).compress(&input, "image/jpeg");

    assert!(!out.is_fallback(), "{:?}", out.fallback);
    assert_eq!(out.content_type, "image/jpeg");

    let decoded = image::load_from_memory(&out.bytes).unwrap();
    assert_eq!(decoded.dimensions(), (1000, 667));

    let quality = out.quality.unwrap();
    assert!(
        out.bytes.len() <= config.target_size_bytes || quality == config.quality_floor,
        "size {} at quality {}",
        out.bytes.len(),
        quality
    );
    assert_eq!(jfif_density(&out.bytes), (1, 72, 72));
}

#[test]
fn small_png_keeps_dimensions_and_type() {
    let input = encode(DynamicImage::ImageRgb8(texture(100, 100)), ImageFormat::Png);
    let out = ImageCompressor::default().compress(&input, "image/png");

    assert!(!out.is_fallback());
    assert_eq!(out.content_type, "image/png");
    assert_eq!(out.quality, Some(90));

    let decoded = image::load_from_memory(&out.bytes).unwrap();
    assert_eq!(decoded.dimensions(), (100, 100));
    // 72 dpi expressed in pixels per meter
    assert_eq!(png_phys(&out.bytes), (2835, 2835, 1));
}

#[test]
fn portrait_png_with_alpha_is_capped_on_height() {
    let img = RgbaImage::from_fn(600, 1800, |x, y| Rgba([(x % 256) as u8, (y % 256) as u8, 90, (x % 200) as u8]));
    let input = encode(DynamicImage::ImageRgba8(img), ImageFormat::Png);

    let out = ImageCompressor::default().compress(&input, "image/png");
    let decoded = image::load_from_memory(&out.bytes).unwrap();
    assert_eq!(decoded.dimensions(), (333, 1000));
    assert!(decoded.color().has_alpha());
}

#[test]
fn webp_stays_webp() {
    let input = encode(DynamicImage::ImageRgb8(texture(1500, 300)), ImageFormat::WebP);
    let out = ImageCompressor::default().compress(&input, "image/webp");

    assert_eq!(out.content_type, "image/webp");
    let decoded = image::load_from_memory_with_format(&out.bytes, ImageFormat::WebP).unwrap();
    assert_eq!(decoded.dimensions(), (1000, 200));
}

#[test]
fn unsupported_image_family_is_coerced_to_jpeg() {
    let input = encode(DynamicImage::ImageRgb8(texture(40, 30)), ImageFormat::Bmp);
    let out = ImageCompressor::default().compress(&input, "image/bmp");

    assert!(out.coerced);
    assert_eq!(out.content_type, "image/jpeg");
    assert_eq!(&out.bytes[..2], &[0xFF, 0xD8]);
}

#[test]
fn unreachable_target_stops_at_floor() {
    let input = encode(DynamicImage::ImageRgb8(texture(200, 200)), ImageFormat::Jpeg);
    let config = CompressionConfig::new().with_target_size(16);
    let out = ImageCompressor::new(config).compress(&input, "image/jpeg");

    assert_eq!(out.quality, Some(60));
    assert!(out.bytes.len() > 16);
}

/// Size of the single encode at `quality`, by pinning the ladder to one rung
fn encoded_size_at(input: &[u8], quality: u8) -> usize {
    let config = CompressionConfig::new().with_quality(quality, 5, quality).with_target_size(0);
    let out = ImageCompressor::new(config).compress(input, "image/jpeg");
    assert_eq!(out.quality, Some(quality));
    out.bytes.len()
}

#[test]
fn ladder_stops_at_the_first_rung_that_fits() {
    let input = encode(DynamicImage::ImageRgb8(texture(400, 400)), ImageFormat::Jpeg);
    let ladder: Vec<u8> = CompressionConfig::default().quality_ladder().collect();
    let sizes: Vec<usize> = ladder.iter().map(|q| encoded_size_at(&input, *q)).collect();

    // a target strictly between the best and the floor encodes
    let target = sizes[3];
    assert!(sizes[0] > target && target > sizes[ladder.len() - 1], "{sizes:?}");

    let rung = sizes.iter().position(|size| *size <= target).unwrap();
    assert!(rung > 0);
    assert!(sizes[rung - 1] > target);

    let out = ImageCompressor::new(CompressionConfig::new().with_target_size(target)).compress(&input, "image/jpeg");
    assert_eq!(out.quality, Some(ladder[rung]));
    assert_eq!(out.bytes.len(), sizes[rung]);
}

#[test]
fn large_webp_is_size_targeted() {
    let input = encode(DynamicImage::ImageRgb8(texture(1000, 1000)), ImageFormat::WebP);
    let config = CompressionConfig::default();
    let out = ImageCompressor::new(config.clone()).compress(&input, "image/webp");

    assert!(!out.is_fallback(), "{:?}", out.fallback);
    assert!(out.bytes.len() < input.len());
    assert!(out.bytes.len() <= config.target_size_bytes || out.quality == Some(config.quality_floor));
}

#[test]
#[traced_test]
fn undecodable_bytes_fail_open() {
    let input = b"\x89PNG\r\n\x1a\n definitely truncated".to_vec();
    let out = ImageCompressor::default().compress(&input, "image/png");

    assert!(out.is_fallback());
    assert_eq!(out.bytes, input);
    assert_eq!(out.content_type, "image/png");
    assert!(out.dimensions.is_none());
    assert!(logs_contain("keeping original bytes"));
}
