use locate_core::{GrayView, Keypoint};

use crate::corner_detection::CornerDetector;

/// Grid cells always affordable for NMS bucketing, whatever the keypoint count
const MIN_GRID_CELLS: usize = 1 << 20;

/// Non-maximum suppression, orientation and subpixel refinement
pub struct KeypointRefinement;

impl KeypointRefinement {
    /// Greedy non-maximum suppression.
    ///
    /// Keypoints are visited strongest first; a keypoint survives when no
    /// survivor lies closer than `min_distance`. At most `max_keypoints`
    /// survive (0 means unlimited). Output is ordered by descending response,
    /// ties keep their input order.
    pub fn non_maximum_suppression(keypoints: &[Keypoint], min_distance: f32, max_keypoints: usize) -> Vec<Keypoint> {
        if keypoints.is_empty() {
            return Vec::new();
        }

        let mut sorted = keypoints.to_vec();
        sorted.sort_by(|a, b| b.response.partial_cmp(&a.response).unwrap_or(std::cmp::Ordering::Equal));

        let limit = if max_keypoints == 0 { usize::MAX } else { max_keypoints };
        if min_distance <= 0.0 {
            sorted.truncate(limit);
            return sorted;
        }

        // Bucket survivors on a grid with cell size == min_distance so only
        // the 3x3 neighbourhood of cells needs checking.
        let cell = min_distance;
        let (min_x, min_y) = sorted
            .iter()
            .fold((f32::MAX, f32::MAX), |(mx, my), kp| (mx.min(kp.x), my.min(kp.y)));
        let (max_x, max_y) = sorted
            .iter()
            .fold((f32::MIN, f32::MIN), |(mx, my), kp| (mx.max(kp.x), my.max(kp.y)));
        let max_cells = sorted.len().saturating_mul(16).max(MIN_GRID_CELLS);
        let grid_dims = (((max_x - min_x) / cell) as usize)
            .checked_add(1)
            .zip((((max_y - min_y) / cell) as usize).checked_add(1))
            .filter(|&(cols, rows)| cols.checked_mul(rows).is_some_and(|n| n <= max_cells));
        let Some((cols, rows)) = grid_dims else {
            log::debug!("NMS grid too large for spacing {}, using pairwise scan", min_distance);
            return Self::pairwise_suppression(sorted, min_distance, limit);
        };
        let mut grid: Vec<Vec<usize>> = vec![Vec::new(); cols * rows];

        let min_distance_sq = min_distance * min_distance;
        let mut suppressed: Vec<Keypoint> = Vec::new();

        for candidate in sorted {
            let cx = ((candidate.x - min_x) / cell) as usize;
            let cy = ((candidate.y - min_y) / cell) as usize;

            let mut is_local_max = true;
            'search: for gy in cy.saturating_sub(1)..=(cy + 1).min(rows - 1) {
                for gx in cx.saturating_sub(1)..=(cx + 1).min(cols - 1) {
                    for &idx in &grid[gy * cols + gx] {
                        let existing = &suppressed[idx];
                        let dx = candidate.x - existing.x;
                        let dy = candidate.y - existing.y;
                        if dx * dx + dy * dy < min_distance_sq {
                            is_local_max = false;
                            break 'search;
                        }
                    }
                }
            }

            if is_local_max {
                grid[cy * cols + cx].push(suppressed.len());
                suppressed.push(candidate);
                if suppressed.len() >= limit {
                    break;
                }
            }
        }

        suppressed
    }

    /// Same greedy rule as the grid path, checking every survivor
    fn pairwise_suppression(sorted: Vec<Keypoint>, min_distance: f32, limit: usize) -> Vec<Keypoint> {
        let min_distance_sq = min_distance * min_distance;
        let mut suppressed: Vec<Keypoint> = Vec::new();
        for candidate in sorted {
            let clear = suppressed.iter().all(|kp| {
                let dx = candidate.x - kp.x;
                let dy = candidate.y - kp.y;
                dx * dx + dy * dy >= min_distance_sq
            });
            if clear {
                suppressed.push(candidate);
                if suppressed.len() >= limit {
                    break;
                }
            }
        }
        suppressed
    }

    /// Orientation by intensity centroid over a circular patch.
    ///
    /// Samples outside the image are clamped to the border so keypoints near
    /// the edge still get a stable angle.
    pub fn compute_orientation(img: GrayView<'_>, x: f32, y: f32, patch_size: usize) -> f32 {
        let half = (patch_size / 2) as i32;
        let radius_sq = half * half;
        let (cx, cy) = (x.round() as i32, y.round() as i32);
        let mut m10 = 0i64;
        let mut m01 = 0i64;

        for dy in -half..=half {
            for dx in -half..=half {
                if dx * dx + dy * dy > radius_sq {
                    continue;
                }
                let val = img.get_clamped(cx + dx, cy + dy) as i64;
                m10 += dx as i64 * val;
                m01 += dy as i64 * val;
            }
        }

        if m10 == 0 && m01 == 0 {
            0.0
        } else {
            (m01 as f32).atan2(m10 as f32)
        }
    }

    /// Refine a keypoint to subpixel accuracy by fitting a quadratic to the
    /// corner score over its 3x3 neighbourhood.
    ///
    /// The offset is clamped to half a pixel; degenerate fits and keypoints
    /// too close to the border are returned unchanged.
    pub fn refine_keypoint_subpixel(img: GrayView<'_>, kp: Keypoint, threshold: u8) -> Keypoint {
        let x = kp.x.round() as usize;
        let y = kp.y.round() as usize;
        let b = CornerDetector::BORDER + 1;
        if x < b || y < b || x + b >= img.width || y + b >= img.height {
            return kp;
        }

        let s = |xx: usize, yy: usize| CornerDetector::corner_score(img, xx, yy, threshold);
        let samples = [
            [s(x - 1, y - 1), s(x, y - 1), s(x + 1, y - 1)],
            [s(x - 1, y), s(x, y), s(x + 1, y)],
            [s(x - 1, y + 1), s(x, y + 1), s(x + 1, y + 1)],
        ];

        // Finite differences of the score surface
        let dx = (samples[1][2] - samples[1][0]) / 2.0;
        let dy = (samples[2][1] - samples[0][1]) / 2.0;
        let dxx = samples[1][2] - 2.0 * samples[1][1] + samples[1][0];
        let dyy = samples[2][1] - 2.0 * samples[1][1] + samples[0][1];
        let dxy = (samples[2][2] - samples[2][0] - samples[0][2] + samples[0][0]) / 4.0;

        let det = dxx * dyy - dxy * dxy;
        // Only a maximum (negative definite Hessian) is worth moving towards
        if det.abs() < 1e-6 || dxx >= 0.0 {
            return kp;
        }

        let offset_x = (-(dyy * dx - dxy * dy) / det).clamp(-0.5, 0.5);
        let offset_y = (-(dxx * dy - dxy * dx) / det).clamp(-0.5, 0.5);

        Keypoint {
            x: x as f32 + offset_x,
            y: y as f32 + offset_y,
            ..kp
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kp(x: f32, y: f32, response: f32) -> Keypoint {
        Keypoint { x, y, angle: 0.0, response }
    }

    #[test]
    fn test_nms_keeps_strongest_in_cluster() {
        let kps = vec![kp(10.0, 10.0, 1.0), kp(11.0, 10.0, 5.0), kp(30.0, 30.0, 2.0)];
        let out = KeypointRefinement::non_maximum_suppression(&kps, 3.0, 0);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0], kps[1]);
        assert_eq!(out[1], kps[2]);
    }

    #[test]
    fn test_nms_minimum_spacing() {
        let kps: Vec<Keypoint> = (0..400)
            .map(|i| kp((i % 20) as f32 * 1.5, (i / 20) as f32 * 1.5, (i * 7 % 13) as f32))
            .collect();
        let out = KeypointRefinement::non_maximum_suppression(&kps, 5.0, 0);
        assert!(out.len() < kps.len());
        for i in 0..out.len() {
            for j in (i + 1)..out.len() {
                let dx = out[i].x - out[j].x;
                let dy = out[i].y - out[j].y;
                let distance = (dx * dx + dy * dy).sqrt();
                assert!(distance >= 5.0, "Keypoints too close after NMS: {}", distance);
            }
        }
    }

    #[test]
    fn test_nms_tiny_spacing_does_not_blow_up_grid() {
        let kps = vec![kp(3.0, 3.0, 1.0), kp(600.0, 400.0, 2.0)];
        let out = KeypointRefinement::non_maximum_suppression(&kps, 1e-30, 10);
        assert_eq!(out, vec![kps[1], kps[0]]);

        let sparse = vec![kp(0.0, 0.0, 1.0), kp(1e6, 1e6, 2.0)];
        let out = KeypointRefinement::non_maximum_suppression(&sparse, 0.5, 1);
        assert_eq!(out, vec![sparse[1]]);
    }

    #[test]
    fn test_nms_respects_cap() {
        let kps: Vec<Keypoint> = (0..50).map(|i| kp(i as f32 * 10.0, 0.0, i as f32)).collect();
        let out = KeypointRefinement::non_maximum_suppression(&kps, 3.0, 5);
        assert_eq!(out.len(), 5);
        assert_eq!(out[0].response, 49.0);
    }

    #[test]
    fn test_orientation_points_towards_bright_side() {
        let (w, h) = (21usize, 21usize);
        let mut img = vec![0u8; w * h];
        for y in 0..h {
            for x in 11..w {
                img[y * w + x] = 200;
            }
        }
        let angle = KeypointRefinement::compute_orientation(GrayView::new(&img, w, h), 10.0, 10.0, 15);
        assert!(angle.abs() < 1e-3, "angle = {angle}");
    }

    #[test]
    fn test_orientation_uniform_is_zero() {
        let img = vec![90u8; 16 * 16];
        let angle = KeypointRefinement::compute_orientation(GrayView::new(&img, 16, 16), 8.0, 8.0, 7);
        assert_eq!(angle, 0.0);
    }

    #[test]
    fn test_subpixel_offset_is_bounded() {
        let (w, h) = (40usize, 40usize);
        let mut img = vec![40u8; w * h];
        for y in 16..24 {
            for x in 16..24 {
                img[y * w + x] = 230;
            }
        }
        let view = GrayView::new(&img, w, h);
        let refined = KeypointRefinement::refine_keypoint_subpixel(view, kp(16.0, 16.0, 1.0), 20);
        assert!((refined.x - 16.0).abs() <= 0.5);
        assert!((refined.y - 16.0).abs() <= 0.5);
    }

    #[test]
    fn test_subpixel_near_border_is_untouched() {
        let img = vec![0u8; 20 * 20];
        let original = kp(2.0, 2.0, 1.0);
        let refined = KeypointRefinement::refine_keypoint_subpixel(GrayView::new(&img, 20, 20), original, 20);
        assert_eq!(refined, original);
    }
}
