use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum BriefError {
    #[error("Invalid image dimensions: {width}x{height} (must be > 0)")]
    InvalidImageSize { width: usize, height: usize },
    #[error("Image data length mismatch: expected {expected_len}, got {actual_len}")]
    InvalidImageData { expected_len: usize, actual_len: usize },
    #[error("Invalid patch size {0} (must be odd, 5-63)")]
    InvalidPatchSize(usize),
}

pub type BriefResult<T> = Result<T, BriefError>;
