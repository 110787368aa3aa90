//! Planar homography estimation.
//!
//! Normalized DLT for the algebraic fit, RANSAC over minimal samples for
//! robustness against bad correspondences, and projection helpers used to
//! place the object outline in the scene.

pub mod dlt;
pub mod error;
pub mod homography;
pub mod ransac;

pub use dlt::estimate_homography_dlt;
pub use error::{HomographyError, HomographyResult};
pub use homography::{object_corners, Homography, MAX_CONDITION, MIN_NORMALIZED_DET};
pub use nalgebra::Point2;
pub use ransac::{fit_homography_ransac, HomographyEstimator, HomographyFit, RansacConfig, RansacHomographyEstimator};
