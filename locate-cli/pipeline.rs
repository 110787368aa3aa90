use std::time::Instant;

use image::RgbImage;
use locate_brief::BruteForceMatcher;
use locate_core::{DescriptorMatcher, FeatureDetector, Keypoint, Match};
use locate_geometry::{HomographyEstimator, RansacHomographyEstimator};

use crate::config::LocatorConfig;
use crate::error::{LocateError, LocateResult};
use crate::features::{extract_features, OrbFeatures};
use crate::geometry::{localize, Localization};
use crate::matching::{filter_good_matches, DistanceRange};
use crate::preprocess::preprocess_pair;

/// Milestones reported while a run progresses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Enough good matches passed the gate
    MatchesFound(usize),
    HomographyFound,
    PerspectiveTransformed,
}

/// Counts gathered along the way, for logs and callers
#[derive(Debug, Clone, PartialEq)]
pub struct LocateReport {
    pub object_keypoints: usize,
    pub scene_keypoints: usize,
    pub raw_matches: usize,
    pub distance_range: DistanceRange,
    pub accepted: usize,
    /// Zero when the run stopped before geometry
    pub inliers: usize,
}

/// Everything the presenter needs after a successful localization
#[derive(Debug, Clone)]
pub struct Located {
    pub object_keypoints: Vec<Keypoint>,
    pub scene_keypoints: Vec<Keypoint>,
    pub good_matches: Vec<Match>,
    pub localization: Localization,
}

#[derive(Debug, Clone)]
pub enum LocateOutcome {
    /// Too few accepted matches; geometry was skipped
    NotEnoughMatches { report: LocateReport },
    Located { report: LocateReport, result: Located },
}

impl LocateOutcome {
    pub fn report(&self) -> &LocateReport {
        match self {
            LocateOutcome::NotEnoughMatches { report } | LocateOutcome::Located { report, .. } => report,
        }
    }
}

/// Runs the localization pipeline with injected vision back-ends
pub struct Locator<D, M, E> {
    detector: D,
    matcher: M,
    estimator: E,
    config: LocatorConfig,
}

impl Locator<OrbFeatures, BruteForceMatcher, RansacHomographyEstimator> {
    /// ORB features, exhaustive Hamming matching and RANSAC, all from `config`
    pub fn from_config(config: LocatorConfig) -> LocateResult<Self> {
        config.validate()?;
        let detector = OrbFeatures::new(config.detector.clone(), &config.descriptor).map_err(LocateError::Features)?;
        let estimator = RansacHomographyEstimator::new(config.ransac.clone());
        Ok(Self::new(detector, BruteForceMatcher::new(), estimator, config))
    }
}

impl<D, M, E> Locator<D, M, E>
where
    D: FeatureDetector,
    M: DescriptorMatcher,
    E: HomographyEstimator,
{
    pub fn new(detector: D, matcher: M, estimator: E, config: LocatorConfig) -> Self {
        Self {
            detector,
            matcher,
            estimator,
            config,
        }
    }

    pub fn config(&self) -> &LocatorConfig {
        &self.config
    }

    pub fn locate(&self, object: &mut RgbImage, scene: &mut RgbImage) -> LocateResult<LocateOutcome> {
        self.locate_with_progress(object, scene, |_| {})
    }

    /// Sharpen both images in place, then match and localize.
    ///
    /// `on_stage` fires as each milestone is reached, so a caller can report
    /// progress even when a later step fails.
    pub fn locate_with_progress(
        &self,
        object: &mut RgbImage,
        scene: &mut RgbImage,
        mut on_stage: impl FnMut(Stage),
    ) -> LocateResult<LocateOutcome> {
        let t0 = Instant::now();
        let (object_gray, scene_gray) = preprocess_pair(object, scene, &self.config.sharpen);
        log::debug!("preprocess: {:.2?}", t0.elapsed());

        let t1 = Instant::now();
        let features = extract_features(&self.detector, &object_gray, &scene_gray)?;
        log::debug!("features: {:.2?}", t1.elapsed());

        let t2 = Instant::now();
        let raw = self
            .matcher
            .best_matches(&features.object_descriptors, &features.scene_descriptors);
        let good = filter_good_matches(&raw, &self.config.matching);
        log::debug!("matching: {:.2?}", t2.elapsed());

        let mut report = LocateReport {
            object_keypoints: features.object_keypoints.len(),
            scene_keypoints: features.scene_keypoints.len(),
            raw_matches: raw.len(),
            distance_range: good.range,
            accepted: good.len(),
            inliers: 0,
        };

        if good.len() <= self.config.matching.min_good_matches {
            log::info!(
                "{} accepted matches, need more than {}",
                good.len(),
                self.config.matching.min_good_matches
            );
            return Ok(LocateOutcome::NotEnoughMatches { report });
        }
        on_stage(Stage::MatchesFound(good.len()));

        let localization = localize(
            &self.estimator,
            &good.matches,
            &features.object_keypoints,
            &features.scene_keypoints,
            object.dimensions(),
            &self.config.geometry,
        )?;
        on_stage(Stage::HomographyFound);
        on_stage(Stage::PerspectiveTransformed);

        report.inliers = localization.inliers;
        log::info!(
            "located: {} + {} keypoints, {} raw matches, {} accepted, {} inliers",
            report.object_keypoints,
            report.scene_keypoints,
            report.raw_matches,
            report.accepted,
            report.inliers
        );

        Ok(LocateOutcome::Located {
            report,
            result: Located {
                object_keypoints: features.object_keypoints,
                scene_keypoints: features.scene_keypoints,
                good_matches: good.matches,
                localization,
            },
        })
    }
}
