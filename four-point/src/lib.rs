//! Estimation of a planar [`Homography`] from point correspondences with the
//! [direct linear transform](https://en.wikipedia.org/wiki/Direct_linear_transformation).
//!
//! Every correspondence `(x, y) -> (u, v)` contributes two rows to a linear system `A h = 0`
//! where `h` holds the nine entries of the homography:
//!
//! ```text
//! [-x, -y, -1,  0,  0,  0, u*x, u*y, u]
//! [ 0,  0,  0, -x, -y, -1, v*x, v*y, v]
//! ```
//!
//! The solution is the right singular vector of `A` with the smallest singular value. Four
//! correspondences in general position determine the homography exactly; more points give the
//! algebraic least squares fit.
//!
//! Before building the system, both point sets are translated so their centroid sits at the
//! origin and scaled so the mean distance to it is `sqrt(2)`, as recommended by Hartley and
//! Zisserman. Without this, pixel coordinates in the hundreds make the system badly
//! conditioned.

use float_ord::FloatOrd;
use imgstitch_core::{
    nalgebra::{DMatrix, Matrix3, Point2},
    sample_consensus::Estimator,
    FeatureMatch, Homography,
};

/// The similarity transform that moves a point set to the origin with mean distance `sqrt(2)`.
#[derive(Debug, Clone, Copy)]
struct Conditioner {
    centroid: Point2<f64>,
    scale: f64,
}

impl Conditioner {
    fn from_points(points: impl Iterator<Item = Point2<f64>> + Clone) -> Option<Self> {
        let count = points.clone().count();
        if count == 0 {
            return None;
        }
        let sum = points
            .clone()
            .fold(Point2::origin().coords, |acc, p| acc + p.coords);
        let centroid = Point2::from(sum / count as f64);
        let mean_distance = points.map(|p| (p - centroid).norm()).sum::<f64>() / count as f64;
        if mean_distance <= f64::EPSILON {
            return None;
        }
        Some(Self {
            centroid,
            scale: std::f64::consts::SQRT_2 / mean_distance,
        })
    }

    fn apply(&self, p: Point2<f64>) -> Point2<f64> {
        Point2::from((p - self.centroid) * self.scale)
    }

    fn matrix(&self) -> Matrix3<f64> {
        let s = self.scale;
        #[rustfmt::skip]
        let entries = [
            s,   0.0, -s * self.centroid.x,
            0.0, s,   -s * self.centroid.y,
            0.0, 0.0, 1.0,
        ];
        Matrix3::from_row_slice(&entries)
    }

    fn inverse_matrix(&self) -> Matrix3<f64> {
        let s = self.scale.recip();
        #[rustfmt::skip]
        let entries = [
            s,   0.0, self.centroid.x,
            0.0, s,   self.centroid.y,
            0.0, 0.0, 1.0,
        ];
        Matrix3::from_row_slice(&entries)
    }
}

/// Builds the DLT coefficient matrix.
///
/// The matrix is padded with zero rows up to nine rows. A thin SVD only returns
/// `min(rows, 9)` right singular vectors, and with fewer than nine rows the null space
/// vector that holds the solution would be missing.
fn encode_projective_constraint(
    matches: impl Iterator<Item = FeatureMatch> + Clone,
    a_conditioner: &Conditioner,
    b_conditioner: &Conditioner,
) -> DMatrix<f64> {
    let count = matches.clone().count();
    let mut out = DMatrix::zeros((2 * count).max(9), 9);
    for (i, FeatureMatch(a, b)) in matches.enumerate() {
        let Point2 { coords, .. } = a_conditioner.apply(a.0);
        let (u, v) = (coords.x, coords.y);
        let Point2 { coords, .. } = b_conditioner.apply(b.0);
        let (x, y) = (coords.x, coords.y);
        let rows = [
            [-x, -y, -1.0, 0.0, 0.0, 0.0, u * x, u * y, u],
            [0.0, 0.0, 0.0, -x, -y, -1.0, v * x, v * y, v],
        ];
        for (offset, row) in rows.iter().enumerate() {
            for (j, &value) in row.iter().enumerate() {
                out[(2 * i + offset, j)] = value;
            }
        }
    }
    out
}

/// Estimates a homography with the normalized direct linear transform.
///
/// The produced [`Homography`] maps the second point of each [`FeatureMatch`] (image `B`)
/// onto the first (image `A`) and is scaled so that its bottom right entry is `1.0`.
#[derive(Copy, Clone, Debug)]
pub struct FourPoint {
    /// Convergence tolerance handed to the SVD.
    pub epsilon: f64,
    /// Maximum number of SVD iterations before giving up on a sample.
    pub iterations: usize,
}

impl FourPoint {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn from_matches<I>(&self, data: I) -> Option<Homography>
    where
        I: Iterator<Item = FeatureMatch> + Clone,
    {
        let a_conditioner = Conditioner::from_points(data.clone().map(|FeatureMatch(a, _)| a.0))?;
        let b_conditioner = Conditioner::from_points(data.clone().map(|FeatureMatch(_, b)| b.0))?;
        let constraint = encode_projective_constraint(data, &a_conditioner, &b_conditioner);
        let svd = constraint.try_svd_unordered(false, true, self.epsilon, self.iterations)?;
        let v_t = svd.v_t?;
        let (ix, _) = svd
            .singular_values
            .iter()
            .enumerate()
            .min_by_key(|&(_, &n)| FloatOrd(n))?;
        let entries: Vec<f64> = v_t.row(ix).iter().copied().collect();
        let conditioned = Matrix3::from_row_slice(&entries);
        let h = a_conditioner.inverse_matrix() * conditioned * b_conditioner.matrix();
        Homography(h).normalized()
    }
}

impl Default for FourPoint {
    fn default() -> Self {
        Self {
            epsilon: 1e-12,
            iterations: 1000,
        }
    }
}

impl Estimator<FeatureMatch> for FourPoint {
    type Model = Homography;
    type ModelIter = Option<Homography>;
    const MIN_SAMPLES: usize = 4;

    fn estimate<I>(&self, data: I) -> Self::ModelIter
    where
        I: Iterator<Item = FeatureMatch> + Clone,
    {
        self.from_matches(data)
    }
}
