use crate::builder::DetectorBuilder;
use crate::error::{FastError, FastResult};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Smallest non-zero keypoint spacing accepted by [`DetectorConfig::validate`]
pub const MIN_NMS_DISTANCE: f32 = 0.5;

/// Complete detector configuration
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DetectorConfig {
    /// Segment-test intensity threshold; the single sensitivity knob shared by both images
    pub threshold: u8,
    /// Contiguous circle pixels required (9 = FAST-9)
    pub arc_length: usize,
    /// Patch diameter for the intensity-centroid orientation
    pub patch_size: usize,
    /// Minimum spacing between surviving keypoints
    pub nms_distance: f32,
    /// Keep at most this many keypoints, strongest first (0 = unlimited)
    pub max_keypoints: usize,
    pub subpixel_refinement: bool,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self::balanced_preset()
    }
}

impl DetectorConfig {
    /// Balanced preset, the default
    pub fn balanced_preset() -> Self {
        Self {
            threshold: 20,
            arc_length: 9,
            patch_size: 31,
            nms_distance: 3.0,
            max_keypoints: 1000,
            subpixel_refinement: true,
        }
    }

    /// Fast preset: fewer, stronger corners
    pub fn fast_preset() -> Self {
        Self {
            threshold: 30,
            arc_length: 9,
            patch_size: 15,
            nms_distance: 5.0,
            max_keypoints: 500,
            subpixel_refinement: false,
        }
    }

    /// Precision preset: low threshold, dense keypoints
    pub fn precision_preset() -> Self {
        Self {
            threshold: 12,
            arc_length: 9,
            patch_size: 31,
            nms_distance: 2.0,
            max_keypoints: 2000,
            subpixel_refinement: true,
        }
    }

    /// Look up a preset by name (`fast`, `balanced`, `precision`)
    pub fn preset(name: &str) -> Option<Self> {
        match name {
            "fast" => Some(Self::fast_preset()),
            "balanced" => Some(Self::balanced_preset()),
            "precision" => Some(Self::precision_preset()),
            _ => None,
        }
    }

    /// Convert to DetectorBuilder for further customization
    pub fn to_builder(self) -> DetectorBuilder {
        DetectorBuilder::from_config(self)
    }

    /// Generate human-readable summary
    pub fn summary(&self) -> String {
        format!(
            "DetectorConfig: threshold={}, FAST-{}, patch={}, NMS:{:.1}, max={}, Subpixel:{}",
            self.threshold,
            self.arc_length,
            self.patch_size,
            self.nms_distance,
            self.max_keypoints,
            self.subpixel_refinement
        )
    }

    /// Validate configuration parameters
    pub fn validate(&self) -> FastResult<()> {
        // 0 would detect everything, >127 could overflow the i32 comparisons' intent
        if self.threshold == 0 || self.threshold > 127 {
            return Err(FastError::InvalidThreshold(self.threshold));
        }
        if !(9..=12).contains(&self.arc_length) {
            return Err(FastError::InvalidArcLength(self.arc_length));
        }
        if self.patch_size % 2 == 0 || self.patch_size < 3 {
            return Err(FastError::InvalidPatchSize(self.patch_size));
        }
        // 0 disables suppression; anything below half a pixel is meaningless
        if !self.nms_distance.is_finite()
            || self.nms_distance < 0.0
            || (self.nms_distance > 0.0 && self.nms_distance < MIN_NMS_DISTANCE)
        {
            return Err(FastError::InvalidNmsDistance(self.nms_distance));
        }
        Ok(())
    }
}
