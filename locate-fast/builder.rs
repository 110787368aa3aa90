use crate::config::DetectorConfig;
use crate::detector::FastDetector;
use crate::error::FastResult;

/// Fluent API builder for a [`FastDetector`]
#[derive(Debug, Clone, Default)]
pub struct DetectorBuilder {
    config: DetectorConfig,
}

impl DetectorBuilder {
    /// Create a new builder with the balanced preset
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the FAST threshold (1-127)
    pub fn threshold(mut self, threshold: u8) -> Self {
        self.config.threshold = threshold;
        self
    }

    /// Set the contiguous arc length (FAST-9 .. FAST-12)
    pub fn arc_length(mut self, n: usize) -> Self {
        self.config.arc_length = n;
        self
    }

    /// Set the patch size for orientation calculation
    pub fn patch_size(mut self, patch_size: usize) -> Self {
        self.config.patch_size = patch_size;
        self
    }

    /// Set the non-maximum suppression (NMS) distance
    pub fn nms_distance(mut self, distance: f32) -> Self {
        self.config.nms_distance = distance;
        self
    }

    /// Cap the number of keypoints per image (0 = unlimited)
    pub fn max_keypoints(mut self, max: usize) -> Self {
        self.config.max_keypoints = max;
        self
    }

    /// Enable or disable subpixel refinement
    pub fn subpixel_refinement(mut self, enable: bool) -> Self {
        self.config.subpixel_refinement = enable;
        self
    }

    /// Apply the fast preset
    pub fn preset_fast(mut self) -> Self {
        self.config = DetectorConfig::fast_preset();
        self
    }

    /// Apply the balanced preset
    pub fn preset_balanced(mut self) -> Self {
        self.config = DetectorConfig::balanced_preset();
        self
    }

    /// Apply the precision preset
    pub fn preset_precision(mut self) -> Self {
        self.config = DetectorConfig::precision_preset();
        self
    }

    /// Validate and build the detector
    pub fn build(self) -> FastResult<FastDetector> {
        FastDetector::new(self.config)
    }

    /// Generate a summary of the builder's configuration
    pub fn summary(&self) -> String {
        self.config.summary()
    }

    /// Create a builder from an existing `DetectorConfig`
    pub fn from_config(config: DetectorConfig) -> Self {
        Self { config }
    }

    /// Convert the builder into a `DetectorConfig`
    pub fn to_config(self) -> DetectorConfig {
        self.config
    }
}
