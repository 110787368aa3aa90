use locate_core::{Keypoint, Match};
use locate_geometry::{object_corners, Homography, HomographyEstimator, Point2};

use crate::config::GeometryConfig;
use crate::error::{LocateError, LocateResult};

/// The object's outline found in the scene
#[derive(Debug, Clone, PartialEq)]
pub struct Localization {
    pub homography: Homography,
    /// Projected (0,0), (w,0), (w,h), (0,h) of the object, in scene pixels
    pub scene_corners: [Point2<f64>; 4],
    pub inliers: usize,
    /// Set when the transform failed validation and the run continued anyway
    pub degenerate: bool,
}

/// Object and scene positions of each match, in match order
pub fn correspondences(
    good: &[Match],
    object_kps: &[Keypoint],
    scene_kps: &[Keypoint],
) -> LocateResult<(Vec<Point2<f64>>, Vec<Point2<f64>>)> {
    let lookup = |kps: &[Keypoint], index: usize| {
        kps.get(index)
            .map(|kp| Point2::new(kp.x as f64, kp.y as f64))
            .ok_or(LocateError::MatchOutOfRange { index, len: kps.len() })
    };

    good.iter()
        .map(|m| Ok((lookup(object_kps, m.object_idx)?, lookup(scene_kps, m.scene_idx)?)))
        .collect::<LocateResult<Vec<_>>>()
        .map(|pairs| pairs.into_iter().unzip())
}

/// Fit the object-to-scene homography and project the object's corners.
///
/// A transform outside the limits of `geometry` (see
/// [`Homography::validate_with`]) is an error with `reject_degenerate`;
/// otherwise it is logged and flagged on the result.
pub fn localize<E>(
    estimator: &E,
    good: &[Match],
    object_kps: &[Keypoint],
    scene_kps: &[Keypoint],
    object_size: (u32, u32),
    geometry: &GeometryConfig,
) -> LocateResult<Localization>
where
    E: HomographyEstimator + ?Sized,
{
    let (src, dst) = correspondences(good, object_kps, scene_kps)?;
    let fit = estimator.estimate(&src, &dst).map_err(LocateError::Estimation)?;
    let inliers = fit.inlier_count();
    log::debug!("homography: {}/{} inliers", inliers, src.len());

    let degenerate = match fit
        .homography
        .validate_with(geometry.min_determinant, geometry.max_condition)
    {
        Ok(()) => false,
        Err(e) if geometry.reject_degenerate => return Err(e.into()),
        Err(e) => {
            log::warn!("continuing with {}", e);
            true
        }
    };

    let corners = object_corners(object_size.0, object_size.1);
    let projected = fit.homography.project_points(&corners);
    let scene_corners = [projected[0], projected[1], projected[2], projected[3]];

    Ok(Localization {
        homography: fit.homography,
        scene_corners,
        inliers,
        degenerate,
    })
}
