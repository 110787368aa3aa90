use std::path::{Path, PathBuf};

use locate_brief::BriefConfig;
use locate_fast::DetectorConfig;
use locate_geometry::{RansacConfig, MAX_CONDITION, MIN_NORMALIZED_DET};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Unsharp-mask parameters: `out = original_weight * orig + blurred_weight * blur + offset`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SharpenConfig {
    pub sigma: f32,
    pub original_weight: f32,
    pub blurred_weight: f32,
    pub offset: f32,
}

impl Default for SharpenConfig {
    fn default() -> Self {
        Self {
            sigma: 3.0,
            original_weight: 3.0,
            blurred_weight: -2.0,
            offset: 0.0,
        }
    }
}

/// Distance heuristic applied to the raw nearest-neighbour matches
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchFilterConfig {
    /// Scanning stops once more than `cap` matches were accepted
    pub cap: usize,
    /// Lower bound of the acceptance threshold `max(2 * min_dist, floor)`
    pub distance_floor: f32,
    /// At most this many accepted matches ends the run early
    pub min_good_matches: usize,
    /// Sort raw matches by distance (stable) before the capped scan
    pub rank_before_cap: bool,
}

impl Default for MatchFilterConfig {
    fn default() -> Self {
        Self {
            cap: 20,
            distance_floor: 0.02,
            min_good_matches: 10,
            rank_before_cap: false,
        }
    }
}

/// How the composite image is drawn and where it goes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PresentConfig {
    pub output: PathBuf,
    /// Block until Enter is pressed after the composite is written
    pub wait: bool,
    pub outline_color: [u8; 3],
    pub outline_thickness: u32,
    /// Radius of the circles marking matched keypoints (0 disables them)
    pub keypoint_radius: i32,
    /// Seed of the per-match line colours
    pub color_seed: u64,
}

impl Default for PresentConfig {
    fn default() -> Self {
        Self {
            output: PathBuf::from("object_location.png"),
            wait: false,
            outline_color: [0, 255, 0],
            outline_thickness: 4,
            keypoint_radius: 4,
            color_seed: 0,
        }
    }
}

/// Full run configuration, every section defaulting to the stock pipeline
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LocatorConfig {
    pub sharpen: SharpenConfig,
    pub detector: DetectorConfig,
    pub descriptor: BriefConfig,
    pub matching: MatchFilterConfig,
    pub ransac: RansacConfig,
    pub geometry: GeometryConfig,
    pub presentation: PresentConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeometryConfig {
    /// Fail the run on a singular or ill-conditioned homography instead of warning
    pub reject_degenerate: bool,
    /// Smallest |det| of the homography scaled to `h[2][2] == 1`
    pub min_determinant: f64,
    /// Largest singular-value ratio of the homography
    pub max_condition: f64,
}

impl Default for GeometryConfig {
    fn default() -> Self {
        Self {
            reject_degenerate: true,
            min_determinant: MIN_NORMALIZED_DET,
            max_condition: MAX_CONDITION,
        }
    }
}

impl LocatorConfig {
    /// Load from a `.toml` or `.json` file; missing keys keep their defaults
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        let cfg: Self = match ext.as_deref() {
            Some("toml") => toml::from_str(&text)?,
            Some("json") => serde_json::from_str(&text)?,
            _ => return Err(ConfigError::UnsupportedFormat(path.to_path_buf())),
        };
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let s = &self.sharpen;
        if !(s.sigma > 0.0 && s.sigma.is_finite()) {
            return Err(ConfigError::Invalid(format!(
                "sharpen sigma must be positive, got {}",
                s.sigma
            )));
        }
        if ![s.original_weight, s.blurred_weight, s.offset]
            .iter()
            .all(|v| v.is_finite())
        {
            return Err(ConfigError::Invalid("sharpen weights must be finite".into()));
        }
        self.detector.validate()?;
        self.descriptor.validate()?;
        self.ransac.validate()?;

        let m = &self.matching;
        if !(m.distance_floor >= 0.0 && m.distance_floor.is_finite()) {
            return Err(ConfigError::Invalid(format!(
                "distance_floor must be non-negative, got {}",
                m.distance_floor
            )));
        }
        // A homography needs at least 4 correspondences past the gate
        if m.min_good_matches < 3 {
            return Err(ConfigError::Invalid(format!(
                "min_good_matches must be at least 3, got {}",
                m.min_good_matches
            )));
        }
        if m.cap < m.min_good_matches {
            return Err(ConfigError::Invalid(format!(
                "cap ({}) below min_good_matches ({}) rejects every run",
                m.cap, m.min_good_matches
            )));
        }
        let g = &self.geometry;
        if !(g.min_determinant >= 0.0 && g.min_determinant.is_finite()) || !(g.max_condition >= 1.0) {
            return Err(ConfigError::Invalid(format!(
                "homography limits out of range: min_determinant {}, max_condition {}",
                g.min_determinant, g.max_condition
            )));
        }
        if self.presentation.outline_thickness == 0 {
            return Err(ConfigError::Invalid("outline_thickness must be positive".into()));
        }
        Ok(())
    }

    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}
