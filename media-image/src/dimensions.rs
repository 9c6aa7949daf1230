/// Width and height of an image in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn longest_side(&self) -> u32 {
        self.width.max(self.height)
    }
}

/// Scale `source` down so its longest side is `max_dimension`, keeping the
/// aspect ratio. Images already within bounds are returned unchanged.
pub fn fit_within(source: Dimensions, max_dimension: u32) -> Dimensions {
    let longest = source.longest_side();
    if longest <= max_dimension {
        return source;
    }

    let scale = |side: u32| -> u32 {
        let scaled = (side as u64 * max_dimension as u64 + longest as u64 / 2) / longest as u64;
        (scaled as u32).max(1)
    };

    if source.width >= source.height {
        Dimensions::new(max_dimension, scale(source.height))
    } else {
        Dimensions::new(scale(source.width), max_dimension)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn landscape_is_capped_on_width() {
        assert_eq!(fit_within(Dimensions::new(3000, 2000), 1000), Dimensions::new(1000, 667));
    }

    #[test]
    fn portrait_is_capped_on_height() {
        assert_eq!(fit_within(Dimensions::new(1200, 4000), 1000), Dimensions::new(300, 1000));
    }

    #[test]
    fn small_images_are_never_upscaled() {
        assert_eq!(fit_within(Dimensions::new(100, 100), 1000), Dimensions::new(100, 100));
        assert_eq!(fit_within(Dimensions::new(1000, 10), 1000), Dimensions::new(1000, 10));
    }

    #[test]
    fn extreme_ratio_keeps_one_pixel() {
        assert_eq!(fit_within(Dimensions::new(50_000, 1), 1000), Dimensions::new(1000, 1));
    }

    #[test]
    fn aspect_ratio_within_rounding() {
        for (w, h) in [(1920, 1080), (1001, 999), (4032, 3024), (777, 2333)] {
            let out = fit_within(Dimensions::new(w, h), 1000);
            assert_eq!(out.longest_side(), 1000);
            let expected_other = if w >= h {
                h as f64 * 1000.0 / w as f64
            } else {
                w as f64 * 1000.0 / h as f64
            };
            let other = out.width.min(out.height) as f64;
            assert!((other - expected_other).abs() <= 1.0, "{w}x{h} -> {out:?}");
        }
    }
}
