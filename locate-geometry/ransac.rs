use locate_core::BoxError;
use nalgebra::Point2;
use rand::prelude::*;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::dlt::estimate_homography_dlt;
use crate::error::{HomographyError, HomographyResult};
use crate::homography::Homography;

/// Points in a minimal sample
const SAMPLE_SIZE: usize = 4;

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct RansacConfig {
    /// Upper bound on sampling rounds
    pub max_iters: usize,
    /// Inlier threshold on reprojection error, in scene pixels
    pub reproj_threshold: f64,
    /// Stop once a sample free of outliers was drawn with this probability
    pub confidence: f64,
    /// Fewer inliers than this fails the fit
    pub min_inliers: usize,
    /// RNG seed, fixed so runs are reproducible
    pub seed: u64,
    /// Refit on all inliers of the best sample
    pub refine: bool,
}

impl Default for RansacConfig {
    fn default() -> Self {
        Self {
            max_iters: 2000,
            reproj_threshold: 3.0,
            confidence: 0.995,
            min_inliers: 4,
            seed: 0,
            refine: true,
        }
    }
}

impl RansacConfig {
    pub fn validate(&self) -> HomographyResult<()> {
        if self.max_iters == 0 {
            return Err(HomographyError::InvalidConfig("max_iters must be positive".into()));
        }
        if !(self.reproj_threshold > 0.0) {
            return Err(HomographyError::InvalidConfig(format!(
                "reproj_threshold must be positive, got {}",
                self.reproj_threshold
            )));
        }
        if !(self.confidence > 0.0 && self.confidence < 1.0) {
            return Err(HomographyError::InvalidConfig(format!(
                "confidence must lie in (0, 1), got {}",
                self.confidence
            )));
        }
        if self.min_inliers < SAMPLE_SIZE {
            return Err(HomographyError::InvalidConfig(format!(
                "min_inliers must be at least {SAMPLE_SIZE}, got {}",
                self.min_inliers
            )));
        }
        Ok(())
    }
}

/// Robust fit result: the transform and which correspondences support it
#[derive(Debug, Clone, PartialEq)]
pub struct HomographyFit {
    pub homography: Homography,
    /// `true` for correspondences within the reprojection threshold
    pub inlier_mask: Vec<bool>,
}

impl HomographyFit {
    pub fn inlier_count(&self) -> usize {
        self.inlier_mask.iter().filter(|&&m| m).count()
    }
}

/// Robust estimation of the transform mapping `src` points onto `dst` points.
///
/// `src[i]` and `dst[i]` form one correspondence; slices have equal length.
pub trait HomographyEstimator {
    fn estimate(&self, src: &[Point2<f64>], dst: &[Point2<f64>]) -> Result<HomographyFit, BoxError>;
}

/// Sample `k` distinct indices from `0..n` with a partial Fisher-Yates shuffle
fn sample_indices(rng: &mut impl Rng, n: usize, k: usize) -> Vec<usize> {
    debug_assert!(k <= n);
    let mut indices: Vec<usize> = (0..n).collect();
    for i in 0..k {
        let j = rng.gen_range(i..n);
        indices.swap(i, j);
    }
    indices.truncate(k);
    indices
}

/// True when some three of the points are (nearly) on one line
fn has_collinear_triple(pts: &[Point2<f64>]) -> bool {
    let n = pts.len();
    for i in 0..n {
        for j in (i + 1)..n {
            for k in (j + 1)..n {
                let (a, b, c) = (pts[i], pts[j], pts[k]);
                let cross = (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x);
                if cross.abs() < 1e-9 {
                    return true;
                }
            }
        }
    }
    false
}

/// Rounds needed to draw one clean sample with probability `confidence`
/// given the observed inlier ratio
fn adaptive_iterations(confidence: f64, inlier_ratio: f64, max_iters: usize) -> usize {
    if inlier_ratio <= 0.0 {
        return max_iters;
    }
    let p_clean = inlier_ratio.powi(SAMPLE_SIZE as i32);
    if p_clean >= 1.0 {
        return 1;
    }
    let needed = (1.0 - confidence).ln() / (1.0 - p_clean).ln();
    if needed.is_finite() {
        (needed.ceil() as usize).clamp(1, max_iters)
    } else {
        max_iters
    }
}

fn inlier_mask(h: &Homography, src: &[Point2<f64>], dst: &[Point2<f64>], threshold: f64) -> Vec<bool> {
    src.iter()
        .zip(dst)
        .map(|(s, d)| {
            let err = h.reprojection_error(*s, *d);
            // NaN (point sent to infinity) never counts
            err < threshold
        })
        .collect()
}

/// Fit a homography with RANSAC over 4-point minimal samples.
///
/// The best sample is the one with the most inliers; with `refine` the
/// transform is then re-estimated from all of its inliers.
pub fn fit_homography_ransac(
    src: &[Point2<f64>],
    dst: &[Point2<f64>],
    config: &RansacConfig,
) -> HomographyResult<HomographyFit> {
    config.validate()?;
    if src.len() != dst.len() {
        return Err(HomographyError::LengthMismatch {
            src: src.len(),
            dst: dst.len(),
        });
    }
    let n = src.len();
    if n < SAMPLE_SIZE {
        return Err(HomographyError::TooFewPoints {
            needed: SAMPLE_SIZE,
            got: n,
        });
    }

    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut best: Option<(Homography, Vec<bool>, usize)> = None;
    let mut iters_needed = config.max_iters;
    let mut iter = 0usize;

    while iter < iters_needed {
        iter += 1;
        let sample = sample_indices(&mut rng, n, SAMPLE_SIZE);
        let s4: Vec<Point2<f64>> = sample.iter().map(|&i| src[i]).collect();
        let d4: Vec<Point2<f64>> = sample.iter().map(|&i| dst[i]).collect();
        if has_collinear_triple(&s4) || has_collinear_triple(&d4) {
            continue;
        }

        let h = match estimate_homography_dlt(&s4, &d4) {
            Ok(h) => h,
            Err(_) => continue,
        };
        let mask = inlier_mask(&h, src, dst, config.reproj_threshold);
        let count = mask.iter().filter(|&&m| m).count();

        if best.as_ref().map_or(true, |(_, _, c)| count > *c) {
            iters_needed = adaptive_iterations(config.confidence, count as f64 / n as f64, config.max_iters);
            best = Some((h, mask, count));
        }
    }

    let (best_h, best_mask, best_count) = best.ok_or(HomographyError::InsufficientInliers {
        needed: config.min_inliers,
        found: 0,
    })?;
    log::debug!("ransac: {} rounds, best sample has {}/{} inliers", iter, best_count, n);

    if best_count < config.min_inliers {
        return Err(HomographyError::InsufficientInliers {
            needed: config.min_inliers,
            found: best_count,
        });
    }

    if !config.refine {
        return Ok(HomographyFit {
            homography: best_h,
            inlier_mask: best_mask,
        });
    }

    let (inlier_src, inlier_dst): (Vec<Point2<f64>>, Vec<Point2<f64>>) = best_mask
        .iter()
        .zip(src.iter().zip(dst))
        .filter(|(m, _)| **m)
        .map(|(_, (s, d))| (*s, *d))
        .unzip();

    let refit = estimate_homography_dlt(&inlier_src, &inlier_dst).unwrap_or(best_h);
    let refit_mask = inlier_mask(&refit, src, dst, config.reproj_threshold);
    let refit_count = refit_mask.iter().filter(|&&m| m).count();

    // Keep the refit only when it does not lose support
    if refit_count >= best_count {
        Ok(HomographyFit {
            homography: refit,
            inlier_mask: refit_mask,
        })
    } else {
        Ok(HomographyFit {
            homography: best_h,
            inlier_mask: best_mask,
        })
    }
}

/// [`HomographyEstimator`] backed by [`fit_homography_ransac`]
#[derive(Debug, Clone, Default)]
pub struct RansacHomographyEstimator {
    pub config: RansacConfig,
}

impl RansacHomographyEstimator {
    pub fn new(config: RansacConfig) -> Self {
        Self { config }
    }
}

impl HomographyEstimator for RansacHomographyEstimator {
    fn estimate(&self, src: &[Point2<f64>], dst: &[Point2<f64>]) -> Result<HomographyFit, BoxError> {
        Ok(fit_homography_ransac(src, dst, &self.config)?)
    }
}
