/// Bounds and quality curve for image normalization
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompressionConfig {
    /// Longest side allowed in the output, in pixels
    pub max_dimension: u32,

    /// Stop lowering quality once the encoded output is at most this many bytes
    pub target_size_bytes: usize,

    /// Quality of the first encode
    pub initial_quality: u8,

    /// Quality removed per retry
    pub quality_step: u8,

    /// Lowest quality ever used
    pub quality_floor: u8,

    /// Resolution written into the output metadata
    pub dpi: u16,
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self {
            max_dimension: 1000,
            target_size_bytes: 500 * 1024, // 500KB
            initial_quality: 90,
            quality_step: 5,
            quality_floor: 60,
            dpi: 72,
        }
    }
}

impl CompressionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_dimension(mut self, pixels: u32) -> Self {
        self.max_dimension = pixels.max(1);
        self
    }

    pub fn with_target_size(mut self, bytes: usize) -> Self {
        self.target_size_bytes = bytes;
        self
    }

    /// Set the quality curve: start, step and floor
    pub fn with_quality(mut self, initial: u8, step: u8, floor: u8) -> Self {
        self.initial_quality = initial.clamp(1, 100);
        self.quality_floor = floor.clamp(1, self.initial_quality);
        self.quality_step = step.max(1);
        self
    }

    pub fn with_dpi(mut self, dpi: u16) -> Self {
        self.dpi = dpi;
        self
    }

    /// Every quality the retry loop may try, best first
    pub fn quality_ladder(&self) -> impl Iterator<Item = u8> {
        let floor = self.quality_floor;
        let step = self.quality_step.max(1);
        let mut next = Some(self.initial_quality);
        std::iter::from_fn(move || {
            let current = next?;
            next = current.checked_sub(step).filter(|q| *q >= floor);
            Some(current)
        })
    }
}
