//! Steered BRIEF descriptors and Hamming-space matching.

pub mod error;
pub mod matcher;
pub mod pattern;

use locate_core::{Descriptor, GrayView, Keypoint};
use rayon::prelude::*;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

pub use error::{BriefError, BriefResult};
pub use matcher::{BruteForceMatcher, hamming_distance, normalized_distance};
pub use pattern::{SamplingPattern, TestPair};

const DESCRIPTOR_SIZE: usize = 32;

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct BriefConfig {
    /// Side of the square patch the test pairs are drawn from
    pub patch_size: usize,
    /// Seed of the sampling pattern; both images must use the same one
    pub seed: u64,
}

impl Default for BriefConfig {
    fn default() -> Self {
        Self {
            patch_size: 31,
            seed: 0x0b1e_c7,
        }
    }
}

impl BriefConfig {
    pub fn validate(&self) -> BriefResult<()> {
        if self.patch_size % 2 == 0 || !(5..=63).contains(&self.patch_size) {
            return Err(BriefError::InvalidPatchSize(self.patch_size));
        }
        Ok(())
    }
}

/// Computes rotation-steered BRIEF descriptors
#[derive(Debug, Clone)]
pub struct BriefGenerator {
    pattern: SamplingPattern,
}

impl BriefGenerator {
    pub fn new(cfg: &BriefConfig) -> BriefResult<Self> {
        cfg.validate()?;
        Ok(Self {
            pattern: SamplingPattern::generate(cfg.patch_size, cfg.seed),
        })
    }

    pub fn pattern(&self) -> &SamplingPattern {
        &self.pattern
    }

    /// One descriptor per keypoint, in keypoint order.
    ///
    /// The test pattern is rotated by each keypoint's angle and sampled with
    /// bilinear interpolation at the subpixel location.
    pub fn generate_descriptors(&self, img: GrayView<'_>, kps: &[Keypoint]) -> BriefResult<Vec<Descriptor>> {
        if img.is_empty() {
            return Err(BriefError::InvalidImageSize {
                width: img.width,
                height: img.height,
            });
        }
        if !img.is_consistent() {
            return Err(BriefError::InvalidImageData {
                expected_len: img.width * img.height,
                actual_len: img.data.len(),
            });
        }

        let descriptors = kps
            .par_iter()
            .map(|kp| {
                let (s, c) = kp.angle.sin_cos();
                let (cx, cy) = (kp.x, kp.y);
                let mut d = [0u8; DESCRIPTOR_SIZE];

                for (i, p) in self.pattern.pairs().iter().enumerate() {
                    let (dx1, dy1) = (p.x1 as f32, p.y1 as f32);
                    let (dx2, dy2) = (p.x2 as f32, p.y2 as f32);
                    let (rx1, ry1) = (cx + c * dx1 - s * dy1, cy + s * dx1 + c * dy1);
                    let (rx2, ry2) = (cx + c * dx2 - s * dy2, cy + s * dx2 + c * dy2);

                    let bit = (bilinear_sample(img, rx1, ry1) < bilinear_sample(img, rx2, ry2)) as u8;
                    d[i / 8] |= bit << (i % 8);
                }
                d
            })
            .collect::<Vec<Descriptor>>();

        log::trace!("BRIEF: {} descriptors on {}x{}", descriptors.len(), img.width, img.height);
        Ok(descriptors)
    }
}

/// Bilinear interpolation with border clamping
fn bilinear_sample(img: GrayView<'_>, x: f32, y: f32) -> f32 {
    let max_x = (img.width - 1) as f32;
    let max_y = (img.height - 1) as f32;
    let x = x.clamp(0.0, max_x);
    let y = y.clamp(0.0, max_y);

    let x0 = x.floor();
    let y0 = y.floor();
    let dx = x - x0;
    let dy = y - y0;

    let x0_idx = x0 as usize;
    let y0_idx = y0 as usize;
    let x1_idx = (x0_idx + 1).min(img.width - 1);
    let y1_idx = (y0_idx + 1).min(img.height - 1);

    let p00 = img.get(x0_idx, y0_idx) as f32;
    let p10 = img.get(x1_idx, y0_idx) as f32;
    let p01 = img.get(x0_idx, y1_idx) as f32;
    let p11 = img.get(x1_idx, y1_idx) as f32;

    let top = p00 * (1.0 - dx) + p10 * dx;
    let bottom = p01 * (1.0 - dx) + p11 * dx;
    top * (1.0 - dy) + bottom * dy
}

#[cfg(test)]
mod tests {
    use super::*;

    fn textured_image(width: usize, height: usize) -> Vec<u8> {
        (0..width * height)
            .map(|i| {
                let (x, y) = (i % width, i / width);
                ((x * 37 + y * 91 + (x * y) % 13) % 251) as u8
            })
            .collect()
    }

    #[test]
    fn test_invalid_patch_size() {
        let cfg = BriefConfig {
            patch_size: 30,
            ..BriefConfig::default()
        };
        assert!(matches!(BriefGenerator::new(&cfg), Err(BriefError::InvalidPatchSize(30))));
    }

    #[test]
    fn test_descriptor_per_keypoint() {
        let img = textured_image(64, 64);
        let view = GrayView::new(&img, 64, 64);
        let kps: Vec<Keypoint> = (0..10).map(|i| Keypoint::new(10.0 + i as f32 * 4.0, 32.0)).collect();
        let generator = BriefGenerator::new(&BriefConfig::default()).unwrap();
        let desc = generator.generate_descriptors(view, &kps).unwrap();
        assert_eq!(desc.len(), kps.len());
    }

    #[test]
    fn test_same_patch_same_descriptor() {
        // Two copies of the same texture side by side
        let (w, h) = (128usize, 64usize);
        let tile = textured_image(64, 64);
        let mut img = vec![0u8; w * h];
        for y in 0..h {
            img[y * w..y * w + 64].copy_from_slice(&tile[y * 64..(y + 1) * 64]);
            img[y * w + 64..(y + 1) * w].copy_from_slice(&tile[y * 64..(y + 1) * 64]);
        }
        let view = GrayView::new(&img, w, h);
        let generator = BriefGenerator::new(&BriefConfig::default()).unwrap();
        let kps = [Keypoint::new(30.0, 30.0), Keypoint::new(94.0, 30.0)];
        let desc = generator.generate_descriptors(view, &kps).unwrap();
        assert_eq!(hamming_distance(&desc[0], &desc[1]), 0);
    }

    #[test]
    fn test_uniform_image_gives_zero_descriptor() {
        let img = vec![77u8; 32 * 32];
        let generator = BriefGenerator::new(&BriefConfig::default()).unwrap();
        let desc = generator
            .generate_descriptors(GrayView::new(&img, 32, 32), &[Keypoint::new(16.0, 16.0)])
            .unwrap();
        assert_eq!(desc[0], [0u8; 32]);
    }

    #[test]
    fn test_inconsistent_image_rejected() {
        let img = vec![0u8; 10];
        let generator = BriefGenerator::new(&BriefConfig::default()).unwrap();
        let result = generator.generate_descriptors(GrayView::new(&img, 4, 4), &[]);
        assert!(matches!(result, Err(BriefError::InvalidImageData { .. })));
    }

    #[test]
    fn test_bilinear_midpoint() {
        let img = vec![0u8, 100, 0, 100];
        let view = GrayView::new(&img, 2, 2);
        assert!((bilinear_sample(view, 0.5, 0.5) - 50.0).abs() < 1e-4);
        assert_eq!(bilinear_sample(view, -3.0, 0.0), 0.0);
    }
}
