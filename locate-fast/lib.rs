//! FAST corner detection.
//!
//! Segment-test corners on the radius-3 circle, greedy non-maximum
//! suppression by corner score, subpixel refinement on the score surface and
//! intensity-centroid orientation. Keypoints come back strongest first.

pub mod builder;
pub mod config;
pub mod corner_detection;
pub mod detector;
pub mod error;
pub mod refinement;
pub mod types;
pub mod utils;

pub use builder::DetectorBuilder;
pub use config::{DetectorConfig, MIN_NMS_DISTANCE};
pub use corner_detection::CornerDetector;
pub use detector::FastDetector;
pub use error::{FastError, FastResult};
pub use refinement::KeypointRefinement;
pub use types::CornerType;
