use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum HomographyError {
    #[error("too few points: need {needed}, got {got}")]
    TooFewPoints { needed: usize, got: usize },
    #[error("point count mismatch: {src} source vs {dst} destination")]
    LengthMismatch { src: usize, dst: usize },
    #[error("numerical failure: {0}")]
    NumericalFailure(String),
    #[error("insufficient inliers: need {needed}, found {found}")]
    InsufficientInliers { needed: usize, found: usize },
    #[error("homography has non-finite entries")]
    NonFinite,
    #[error("invalid RANSAC configuration: {0}")]
    InvalidConfig(String),
    #[error("degenerate homography (det={determinant:.3e}, cond={condition:.3e})")]
    Degenerate { determinant: f64, condition: f64 },
}

pub type HomographyResult<T> = Result<T, HomographyError>;
