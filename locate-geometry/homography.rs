use nalgebra::{Matrix3, Point2, Vector3};

use crate::error::{HomographyError, HomographyResult};

/// Smallest |det| accepted once the matrix is scaled to `h[2][2] == 1`
pub const MIN_NORMALIZED_DET: f64 = 1e-6;
/// Largest singular-value ratio accepted
pub const MAX_CONDITION: f64 = 1e12;

/// 3x3 projective transform mapping object coordinates to scene coordinates
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Homography {
    pub h: Matrix3<f64>,
}

impl Homography {
    pub fn new(h: Matrix3<f64>) -> Self {
        Self { h }
    }

    pub fn identity() -> Self {
        Self::new(Matrix3::identity())
    }

    pub fn from_array(rows: [[f64; 3]; 3]) -> Self {
        Self::new(Matrix3::from_row_slice(&[
            rows[0][0], rows[0][1], rows[0][2], rows[1][0], rows[1][1], rows[1][2], rows[2][0],
            rows[2][1], rows[2][2],
        ]))
    }

    pub fn to_array(&self) -> [[f64; 3]; 3] {
        [
            [self.h[(0, 0)], self.h[(0, 1)], self.h[(0, 2)]],
            [self.h[(1, 0)], self.h[(1, 1)], self.h[(1, 2)]],
            [self.h[(2, 0)], self.h[(2, 1)], self.h[(2, 2)]],
        ]
    }

    /// Project a point: H * [x, y, 1]^T then divide by w.
    ///
    /// Points mapped to infinity come back as NaN.
    #[inline]
    pub fn project(&self, p: Point2<f64>) -> Point2<f64> {
        let v = self.h * Vector3::new(p.x, p.y, 1.0);
        if v[2].abs() < 1e-15 {
            return Point2::new(f64::NAN, f64::NAN);
        }
        Point2::new(v[0] / v[2], v[1] / v[2])
    }

    /// Perspective transform of a point list, order preserved
    pub fn project_points(&self, pts: &[Point2<f64>]) -> Vec<Point2<f64>> {
        pts.iter().map(|&p| self.project(p)).collect()
    }

    /// Euclidean distance between `project(src)` and `dst`
    pub fn reprojection_error(&self, src: Point2<f64>, dst: Point2<f64>) -> f64 {
        let p = self.project(src);
        ((p.x - dst.x).powi(2) + (p.y - dst.y).powi(2)).sqrt()
    }

    pub fn inverse(&self) -> Option<Self> {
        self.h.try_inverse().map(Self::new)
    }

    /// Ratio of largest to smallest singular value
    pub fn condition_number(&self) -> f64 {
        let sv = self.h.svd(false, false).singular_values;
        let max = sv.max();
        let min = sv.min();
        if min <= 0.0 {
            f64::INFINITY
        } else {
            max / min
        }
    }

    /// Reject transforms that cannot map a plane meaningfully: non-finite
    /// entries, a vanishing `h[2][2]`, (near-)singular or wildly
    /// ill-conditioned matrices. Checks run on `H / h[2][2]`.
    pub fn validate(&self) -> HomographyResult<()> {
        self.validate_with(MIN_NORMALIZED_DET, MAX_CONDITION)
    }

    /// [`Homography::validate`] with explicit determinant and condition limits
    pub fn validate_with(&self, min_determinant: f64, max_condition: f64) -> HomographyResult<()> {
        if self.h.iter().any(|v| !v.is_finite()) {
            return Err(HomographyError::NonFinite);
        }
        let scale = self.h[(2, 2)];
        if scale.abs() < 1e-12 {
            return Err(HomographyError::Degenerate {
                determinant: self.h.determinant(),
                condition: f64::INFINITY,
            });
        }
        let normalized = Self::new(self.h / scale);
        let determinant = normalized.h.determinant();
        let condition = normalized.condition_number();
        if determinant.abs() < min_determinant || !(condition < max_condition) {
            return Err(HomographyError::Degenerate {
                determinant,
                condition,
            });
        }
        Ok(())
    }
}

/// Corners of a `width x height` image in projection order:
/// (0,0), (w,0), (w,h), (0,h)
pub fn object_corners(width: u32, height: u32) -> [Point2<f64>; 4] {
    let (w, h) = (width as f64, height as f64);
    [
        Point2::new(0.0, 0.0),
        Point2::new(w, 0.0),
        Point2::new(w, h),
        Point2::new(0.0, h),
    ]
}
