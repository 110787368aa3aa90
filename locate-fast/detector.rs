use locate_core::{GrayView, Keypoint};
use rayon::prelude::*;

use crate::config::DetectorConfig;
use crate::corner_detection::CornerDetector;
use crate::error::{FastError, FastResult};
use crate::refinement::KeypointRefinement;

/// FAST corner detector
#[derive(Debug, Clone)]
pub struct FastDetector {
    cfg: DetectorConfig,
}

impl FastDetector {
    /// FAST requires at least 7x7 image (3-pixel border on each side)
    pub const MIN_SIZE: usize = 7;

    /// Creates a new FAST detector with validation
    pub fn new(cfg: DetectorConfig) -> FastResult<Self> {
        cfg.validate()?;
        Ok(Self { cfg })
    }

    /// Validates image data before processing
    fn validate_image(&self, img: GrayView<'_>) -> FastResult<()> {
        if img.is_empty() {
            return Err(FastError::InvalidImageSize {
                width: img.width,
                height: img.height,
            });
        }
        if !img.is_consistent() {
            return Err(FastError::InvalidImageData {
                expected_len: img.width * img.height,
                actual_len: img.data.len(),
            });
        }
        if img.width < Self::MIN_SIZE || img.height < Self::MIN_SIZE {
            return Err(FastError::ImageTooSmall {
                width: img.width,
                height: img.height,
                min_size: Self::MIN_SIZE,
            });
        }
        Ok(())
    }

    /// Detect, suppress, orient and refine keypoints.
    ///
    /// The result is ordered by descending response.
    pub fn detect_keypoints(&self, img: GrayView<'_>) -> FastResult<Vec<Keypoint>> {
        let candidates = self.detect_keypoints_with_response(img)?;
        let suppressed =
            KeypointRefinement::non_maximum_suppression(&candidates, self.cfg.nms_distance, self.cfg.max_keypoints);

        let keypoints: Vec<Keypoint> = suppressed
            .into_par_iter()
            .map(|kp| {
                let kp = if self.cfg.subpixel_refinement {
                    KeypointRefinement::refine_keypoint_subpixel(img, kp, self.cfg.threshold)
                } else {
                    kp
                };
                Keypoint {
                    angle: KeypointRefinement::compute_orientation(img, kp.x, kp.y, self.cfg.patch_size),
                    ..kp
                }
            })
            .collect();

        log::debug!(
            "FAST: {}x{} -> {} candidates, {} keypoints",
            img.width,
            img.height,
            candidates.len(),
            keypoints.len()
        );
        Ok(keypoints)
    }

    /// Raw segment-test corners with response scores, before suppression
    pub fn detect_keypoints_with_response(&self, img: GrayView<'_>) -> FastResult<Vec<Keypoint>> {
        self.validate_image(img)?;
        Ok(CornerDetector::detect(img, self.cfg.threshold, self.cfg.arc_length))
    }

    /// Get detector configuration
    pub fn config(&self) -> &DetectorConfig {
        &self.cfg
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_small_test_config() -> DetectorConfig {
        DetectorConfig {
            patch_size: 5,
            ..DetectorConfig::default()
        }
    }

    fn create_corner_image(width: usize, height: usize) -> Vec<u8> {
        let mut img = vec![50; width * height];
        let cx = width / 2;
        let cy = height / 2;
        for y in cy - 2..=cy + 2 {
            for x in cx - 2..=cx + 2 {
                img[y * width + x] = 255;
            }
        }
        img
    }

    fn create_multiple_corners_image(width: usize, height: usize) -> Vec<u8> {
        let mut img = vec![50; width * height];
        for &(cx, cy) in &[(width / 4, height / 4), (3 * width / 4, height / 4), (width / 2, height / 2)] {
            for y in cy - 3..=cy + 3 {
                for x in cx - 3..=cx + 3 {
                    img[y * width + x] = 255;
                }
            }
        }
        img
    }

    #[test]
    fn test_valid_constructor() {
        assert!(FastDetector::new(DetectorConfig::default()).is_ok());
    }

    #[test]
    fn test_invalid_dimensions() {
        let detector = FastDetector::new(create_small_test_config()).unwrap();
        let result = detector.detect_keypoints(GrayView::new(&[], 0, 100));
        assert!(matches!(result, Err(FastError::InvalidImageSize { .. })));
    }

    #[test]
    fn test_too_small_image() {
        let detector = FastDetector::new(create_small_test_config()).unwrap();
        let img = vec![0u8; 36];
        let result = detector.detect_keypoints(GrayView::new(&img, 6, 6));
        assert!(matches!(result, Err(FastError::ImageTooSmall { .. })));
    }

    #[test]
    fn test_invalid_image_data() {
        let detector = FastDetector::new(create_small_test_config()).unwrap();
        let img = vec![0; 50]; // Should be 100
        let result = detector.detect_keypoints(GrayView::new(&img, 10, 10));
        assert!(matches!(result, Err(FastError::InvalidImageData { expected_len: 100, actual_len: 50 })));
    }

    #[test]
    fn test_uniform_image_detection() {
        let detector = FastDetector::new(create_small_test_config()).unwrap();
        let img = vec![128; 100];
        let keypoints = detector.detect_keypoints(GrayView::new(&img, 10, 10)).unwrap();
        assert!(keypoints.is_empty());
    }

    #[test]
    fn test_corner_detection() {
        let detector = FastDetector::new(create_small_test_config()).unwrap();
        let img = create_corner_image(20, 20);
        let keypoints = detector.detect_keypoints(GrayView::new(&img, 20, 20)).unwrap();
        assert!(!keypoints.is_empty());
        for kp in &keypoints {
            assert!(kp.angle.is_finite());
            assert!(kp.response > 0.0);
        }
    }

    #[test]
    fn test_output_sorted_by_response() {
        let detector = FastDetector::new(DetectorConfig::default()).unwrap();
        let img = create_multiple_corners_image(60, 60);
        let keypoints = detector.detect_keypoints(GrayView::new(&img, 60, 60)).unwrap();
        assert!(keypoints.len() >= 3);
        for pair in keypoints.windows(2) {
            assert!(pair[0].response >= pair[1].response);
        }
    }

    #[test]
    fn test_max_keypoints_cap() {
        let cfg = DetectorConfig {
            max_keypoints: 2,
            ..DetectorConfig::default()
        };
        let detector = FastDetector::new(cfg).unwrap();
        let img = create_multiple_corners_image(60, 60);
        let keypoints = detector.detect_keypoints(GrayView::new(&img, 60, 60)).unwrap();
        assert_eq!(keypoints.len(), 2);
    }

    #[test]
    fn test_repeatable_detection() {
        let detector = FastDetector::new(DetectorConfig::default()).unwrap();
        let img = create_multiple_corners_image(100, 100);
        let first = detector.detect_keypoints(GrayView::new(&img, 100, 100)).unwrap();
        for _ in 0..5 {
            let again = detector.detect_keypoints(GrayView::new(&img, 100, 100)).unwrap();
            assert_eq!(first, again);
        }
    }

    #[test]
    fn test_configuration_access() {
        let cfg = create_small_test_config();
        let detector = FastDetector::new(cfg.clone()).unwrap();
        assert_eq!(detector.config(), &cfg);
    }
}
