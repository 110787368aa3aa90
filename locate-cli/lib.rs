//! Locate a reference object inside a scene image.
//!
//! Both images are sharpened and converted to grayscale, ORB features are
//! matched object-to-scene, a distance heuristic keeps a handful of good
//! matches and a RANSAC homography maps the object's outline into the
//! scene. The vision back-ends sit behind the `FeatureDetector`,
//! `DescriptorMatcher` and `HomographyEstimator` traits; display sits
//! behind [`Presenter`].

pub mod config;
pub mod error;
pub mod features;
pub mod geometry;
pub mod matching;
pub mod pipeline;
pub mod present;
pub mod preprocess;

pub use config::{GeometryConfig, LocatorConfig, MatchFilterConfig, PresentConfig, SharpenConfig};
pub use error::{ConfigError, LocateError, LocateResult};
pub use features::{extract_features, FeatureSet, OrbFeatures};
pub use geometry::{correspondences, localize, Localization};
pub use matching::{distance_range, filter_good_matches, match_acceptance, DistanceRange, GoodMatches};
pub use pipeline::{LocateOutcome, LocateReport, Located, Locator, Stage};
pub use present::{compose_matches, ImageFilePresenter, Presentation, Presenter};
pub use preprocess::{preprocess_pair, sharpen, sharpen_with, to_grayscale};

pub use locate_core::{self, init_thread_pool, Descriptor, Keypoint, Match};
pub use locate_geometry::{object_corners, Homography};

use std::path::Path;

use image::RgbImage;

/// Decode an image file as 8-bit RGB
pub fn load_rgb(path: &Path) -> LocateResult<RgbImage> {
    image::open(path)
        .map(|img| img.to_rgb8())
        .map_err(|source| LocateError::ImageLoad {
            path: path.to_path_buf(),
            source,
        })
}
