use crate::FeatureMatch;
use derive_more::{AsMut, AsRef, Deref, DerefMut, From, Into};
use nalgebra::{Matrix3, Point2, Vector3};
use sample_consensus::Model;

#[cfg(feature = "serde-serialize")]
use serde::{Deserialize, Serialize};

/// Added to the homogeneous coordinate before de-homogenizing so that points mapped to
/// (or near) the line at infinity do not divide by zero.
pub const EPSILON: f64 = 1e-7;

/// A planar projective transform from the frame of image `B` into the frame of image `A`.
///
/// A homography is only defined up to scale. Multiplying every entry by the same non-zero
/// factor produces an equivalent transform, so comparisons should go through
/// [`Homography::normalized`] or through transformed points.
#[derive(Debug, Clone, Copy, PartialEq, AsMut, AsRef, Deref, DerefMut, From, Into)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct Homography(pub Matrix3<f64>);

impl Homography {
    pub fn identity() -> Self {
        Self(Matrix3::identity())
    }

    /// A pure translation by `(tx, ty)`.
    pub fn from_translation(tx: f64, ty: f64) -> Self {
        Self(Matrix3::new(1.0, 0.0, tx, 0.0, 1.0, ty, 0.0, 0.0, 1.0))
    }

    /// Maps a point from `B` into `A`.
    ///
    /// The de-homogenization divides by `w + EPSILON`, so this never produces NaN for
    /// finite input, even for points that land on the line at infinity.
    pub fn transform_point(&self, point: Point2<f64>) -> Point2<f64> {
        let p = self.0 * Vector3::new(point.x, point.y, 1.0);
        let w = p.z + EPSILON;
        Point2::new(p.x / w, p.y / w)
    }

    /// Maps every point through the homography, preserving order.
    pub fn transform_points(&self, points: &[Point2<f64>]) -> Vec<Point2<f64>> {
        points.iter().map(|&p| self.transform_point(p)).collect()
    }

    /// Euclidean distance between the observed point in `A` and where `B`'s point lands.
    pub fn reprojection_error(&self, &FeatureMatch(a, b): &FeatureMatch) -> f64 {
        (self.transform_point(b.0) - a.0).norm()
    }

    /// The transform from `A` back into `B`.
    pub fn inverse(&self) -> Option<Self> {
        self.0.try_inverse().map(Self).and_then(|h| h.normalized())
    }

    /// Rescales the matrix so that its bottom right entry is `1.0`.
    ///
    /// When that entry is (numerically) zero, the matrix is scaled to unit Frobenius norm
    /// instead. Returns `None` for the zero matrix or non-finite entries.
    pub fn normalized(&self) -> Option<Self> {
        if self.0.iter().any(|v| !v.is_finite()) {
            return None;
        }
        let corner = self.0[(2, 2)];
        let scale = if corner.abs() > 1e-12 {
            corner
        } else {
            self.0.norm()
        };
        if scale.abs() <= f64::MIN_POSITIVE {
            return None;
        }
        Some(Self(self.0 / scale))
    }

    /// Row-major entries, the layout most image libraries expect.
    pub fn to_row_major(&self) -> [f64; 9] {
        let m = &self.0;
        [
            m[(0, 0)],
            m[(0, 1)],
            m[(0, 2)],
            m[(1, 0)],
            m[(1, 1)],
            m[(1, 2)],
            m[(2, 0)],
            m[(2, 1)],
            m[(2, 2)],
        ]
    }
}

impl Model<FeatureMatch> for Homography {
    fn residual(&self, data: &FeatureMatch) -> f64 {
        self.reprojection_error(data)
    }
}
