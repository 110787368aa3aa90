use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum FastError {
    #[error("Invalid image dimensions: {width}x{height} (must be > 0)")]
    InvalidImageSize { width: usize, height: usize },
    #[error("Image data length mismatch: expected {expected_len}, got {actual_len}")]
    InvalidImageData { expected_len: usize, actual_len: usize },
    #[error("Invalid threshold: {0} (must be 1-127)")]
    InvalidThreshold(u8),
    #[error("Invalid arc length: {0} (must be 9-12)")]
    InvalidArcLength(usize),
    #[error("Invalid patch size {0} (must be odd and at least 3)")]
    InvalidPatchSize(usize),
    #[error("Invalid NMS distance: {0} (must be 0 or a finite value >= 0.5)")]
    InvalidNmsDistance(f32),
    #[error("Image {width}x{height} too small (minimum {min_size}x{min_size})")]
    ImageTooSmall { width: usize, height: usize, min_size: usize },
}

pub type FastResult<T> = Result<T, FastError>;
