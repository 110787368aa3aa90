use locate_core::{GrayView, Keypoint};
use rayon::prelude::*;

use crate::types::CornerType;
use crate::utils::has_arc;

/// FAST segment test on the radius-3 Bresenham circle
pub struct CornerDetector;

impl CornerDetector {
    /// FAST circle offsets, clockwise from twelve o'clock
    pub const FAST_OFFSETS: [(i32, i32); 16] = [
        (0, -3), (1, -3), (2, -2), (3, -1),
        (3, 0), (3, 1), (2, 2), (1, 3),
        (0, 3), (-1, 3), (-2, 2), (-3, 1),
        (-3, 0), (-3, -1), (-2, -2), (-1, -3),
    ];

    /// Pixels kept clear of the image border by the circle
    pub const BORDER: usize = 3;

    /// Detect corner candidates row by row in parallel.
    ///
    /// Output is in raster order; each keypoint carries its corner score in
    /// `response` and a zero angle.
    pub fn detect(img: GrayView<'_>, threshold: u8, arc_length: usize) -> Vec<Keypoint> {
        let b = Self::BORDER;
        if img.width <= 2 * b || img.height <= 2 * b {
            return Vec::new();
        }

        (b..img.height - b)
            .into_par_iter()
            .flat_map_iter(|y| {
                let mut row = Vec::new();
                for x in b..img.width - b {
                    if Self::classify(img, x, y, threshold, arc_length).is_some() {
                        let response = Self::corner_score(img, x, y, threshold);
                        row.push(Keypoint {
                            x: x as f32,
                            y: y as f32,
                            angle: 0.0,
                            response,
                        });
                    }
                }
                row
            })
            .collect()
    }

    /// Run the segment test at `(x, y)`; the pixel must be at least
    /// [`Self::BORDER`] away from every edge.
    pub fn classify(img: GrayView<'_>, x: usize, y: usize, threshold: u8, arc_length: usize) -> Option<CornerType> {
        let center = img.get(x, y) as i32;
        let t = threshold as i32;
        let w = img.width;
        let at = |i: usize| {
            let (dx, dy) = Self::FAST_OFFSETS[i];
            img.data[(y as i32 + dy) as usize * w + (x as i32 + dx) as usize] as i32
        };

        // High-speed test on the four compass pixels: any arc of `n`
        // contiguous circle pixels covers at least n / 4 of them.
        let min_compass = arc_length / 4;
        let compass = [at(0), at(4), at(8), at(12)];
        let bright_compass = compass.iter().filter(|&&p| p > center + t).count();
        let dark_compass = compass.iter().filter(|&&p| p < center - t).count();
        if bright_compass < min_compass && dark_compass < min_compass {
            return None;
        }

        let mut bright = 0u16;
        let mut dark = 0u16;
        for i in 0..16 {
            let p = at(i);
            if p > center + t {
                bright |= 1 << i;
            } else if p < center - t {
                dark |= 1 << i;
            }
        }

        if has_arc(bright, arc_length) {
            Some(CornerType::Bright)
        } else if has_arc(dark, arc_length) {
            Some(CornerType::Dark)
        } else {
            None
        }
    }

    /// Corner score: mean squared centre/circle difference over the circle
    /// pixels that clear the threshold. Defined for any pixel at least
    /// [`Self::BORDER`] from the edges, corner or not.
    pub fn corner_score(img: GrayView<'_>, x: usize, y: usize, threshold: u8) -> f32 {
        let center = img.get(x, y) as f32;
        let mut sum_diff = 0.0f32;
        let mut count = 0;

        for &(dx, dy) in Self::FAST_OFFSETS.iter() {
            let px = (x as i32 + dx) as usize;
            let py = (y as i32 + dy) as usize;
            let diff = (center - img.get(px, py) as f32).abs();
            if diff > threshold as f32 {
                sum_diff += diff * diff;
                count += 1;
            }
        }

        if count > 0 {
            sum_diff / count as f32
        } else {
            0.0
        }
    }
}
