use std::path::PathBuf;

use locate_brief::BriefError;
use locate_core::BoxError;
use locate_fast::FastError;
use locate_geometry::HomographyError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid TOML config: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("invalid JSON config: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported config format {0} (expected .toml or .json)")]
    UnsupportedFormat(PathBuf),
    #[error("detector settings: {0}")]
    Detector(#[from] FastError),
    #[error("descriptor settings: {0}")]
    Descriptor(#[from] BriefError),
    #[error("RANSAC settings: {0}")]
    Ransac(#[from] HomographyError),
    #[error("{0}")]
    Invalid(String),
}

/// Everything that stops a localization run with a failure status
#[derive(Debug, Error)]
pub enum LocateError {
    #[error("cannot load image {path}: {source}")]
    ImageLoad {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("feature extraction failed: {0}")]
    Features(#[source] BoxError),
    #[error("descriptor count {descriptors} does not match keypoint count {keypoints}")]
    MisalignedFeatures { keypoints: usize, descriptors: usize },
    #[error("match references keypoint {index} of {len}")]
    MatchOutOfRange { index: usize, len: usize },
    #[error("homography estimation failed: {0}")]
    Estimation(#[source] BoxError),
    #[error(transparent)]
    Homography(#[from] HomographyError),
    #[error("presentation failed: {0}")]
    Present(#[source] BoxError),
    #[error("thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

pub type LocateResult<T> = Result<T, LocateError>;
