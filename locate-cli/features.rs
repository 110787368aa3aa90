use image::GrayImage;
use locate_brief::{BriefConfig, BriefGenerator};
use locate_core::{BoxError, Descriptor, FeatureDetector, GrayView, Keypoint};
use locate_fast::{DetectorConfig, FastDetector};

use crate::error::{LocateError, LocateResult};

/// Keypoints and descriptors of both images, index-aligned per image
#[derive(Debug, Clone, Default)]
pub struct FeatureSet {
    pub object_keypoints: Vec<Keypoint>,
    pub scene_keypoints: Vec<Keypoint>,
    pub object_descriptors: Vec<Descriptor>,
    pub scene_descriptors: Vec<Descriptor>,
}

/// Oriented FAST keypoints with steered BRIEF descriptors
#[derive(Debug, Clone)]
pub struct OrbFeatures {
    fast_detector: FastDetector,
    brief_generator: BriefGenerator,
}

impl OrbFeatures {
    pub fn new(detector: DetectorConfig, descriptor: &BriefConfig) -> Result<Self, BoxError> {
        Ok(Self {
            fast_detector: FastDetector::new(detector)?,
            brief_generator: BriefGenerator::new(descriptor)?,
        })
    }

    pub fn config(&self) -> &DetectorConfig {
        self.fast_detector.config()
    }
}

impl FeatureDetector for OrbFeatures {
    fn detect(&self, img: GrayView<'_>) -> Result<Vec<Keypoint>, BoxError> {
        // Too small for the segment-test circle: no corners rather than a failure
        if !img.is_empty()
            && img.is_consistent()
            && (img.width < FastDetector::MIN_SIZE || img.height < FastDetector::MIN_SIZE)
        {
            log::debug!("{}x{} image too small for FAST, no keypoints", img.width, img.height);
            return Ok(Vec::new());
        }
        Ok(self.fast_detector.detect_keypoints(img)?)
    }

    fn describe(&self, img: GrayView<'_>, keypoints: &[Keypoint]) -> Result<Vec<Descriptor>, BoxError> {
        Ok(self.brief_generator.generate_descriptors(img, keypoints)?)
    }
}

pub fn gray_view(img: &GrayImage) -> GrayView<'_> {
    GrayView::new(img.as_raw(), img.width() as usize, img.height() as usize)
}

/// Detect and describe both images with the same detector instance
pub fn extract_features<D>(detector: &D, object: &GrayImage, scene: &GrayImage) -> LocateResult<FeatureSet>
where
    D: FeatureDetector + ?Sized,
{
    let (object_keypoints, object_descriptors) =
        detector.detect_and_describe(gray_view(object)).map_err(LocateError::Features)?;
    let (scene_keypoints, scene_descriptors) =
        detector.detect_and_describe(gray_view(scene)).map_err(LocateError::Features)?;

    for (kps, desc) in [
        (&object_keypoints, &object_descriptors),
        (&scene_keypoints, &scene_descriptors),
    ] {
        if kps.len() != desc.len() {
            return Err(LocateError::MisalignedFeatures {
                keypoints: kps.len(),
                descriptors: desc.len(),
            });
        }
    }

    log::debug!(
        "features: object {} keypoints, scene {} keypoints",
        object_keypoints.len(),
        scene_keypoints.len()
    );

    Ok(FeatureSet {
        object_keypoints,
        scene_keypoints,
        object_descriptors,
        scene_descriptors,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn blocks_image(width: u32, height: u32) -> GrayImage {
        GrayImage::from_fn(width, height, |x, y| {
            let bright = ((x / 8) + (y / 8)) % 2 == 0 && (x / 8) % 3 != 1;
            Luma([if bright { 220 } else { 30 }])
        })
    }

    #[test]
    fn test_orb_features_aligned() {
        let orb = OrbFeatures::new(DetectorConfig::default(), &BriefConfig::default()).unwrap();
        let img = blocks_image(96, 64);
        let features = extract_features(&orb, &img, &img).unwrap();
        assert!(!features.object_keypoints.is_empty());
        assert_eq!(features.object_keypoints.len(), features.object_descriptors.len());
        assert_eq!(features.scene_keypoints.len(), features.scene_descriptors.len());
        // Same image, same detector: identical output on both sides
        assert_eq!(features.object_keypoints, features.scene_keypoints);
        assert_eq!(features.object_descriptors, features.scene_descriptors);
    }

    #[test]
    fn test_tiny_and_uniform_images_have_no_features() {
        let orb = OrbFeatures::new(DetectorConfig::default(), &BriefConfig::default()).unwrap();
        let tiny = GrayImage::from_pixel(3, 3, Luma([9]));
        let flat = GrayImage::from_pixel(64, 64, Luma([128]));
        let features = extract_features(&orb, &tiny, &flat).unwrap();
        assert!(features.object_keypoints.is_empty());
        assert!(features.scene_keypoints.is_empty());
    }

    struct Misaligned;

    impl FeatureDetector for Misaligned {
        fn detect(&self, _img: GrayView<'_>) -> Result<Vec<Keypoint>, BoxError> {
            Ok(vec![Keypoint::new(1.0, 1.0); 3])
        }

        fn describe(&self, _img: GrayView<'_>, _keypoints: &[Keypoint]) -> Result<Vec<Descriptor>, BoxError> {
            Ok(vec![[0u8; 32]; 2])
        }
    }

    struct Failing;

    impl FeatureDetector for Failing {
        fn detect(&self, _img: GrayView<'_>) -> Result<Vec<Keypoint>, BoxError> {
            Err("sensor on fire".into())
        }

        fn describe(&self, _img: GrayView<'_>, _keypoints: &[Keypoint]) -> Result<Vec<Descriptor>, BoxError> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn test_detector_errors_propagate() {
        let img = GrayImage::new(16, 16);
        assert!(matches!(
            extract_features(&Misaligned, &img, &img),
            Err(LocateError::MisalignedFeatures { keypoints: 3, descriptors: 2 })
        ));
        let err = extract_features(&Failing, &img, &img).unwrap_err();
        assert!(err.to_string().contains("sensor on fire"));
    }
}
