use derive_more::{AsMut, AsRef, Deref, DerefMut, From, Into};
use nalgebra::Point2;

#[cfg(feature = "serde-serialize")]
use serde::{Deserialize, Serialize};

/// Allows the retrieval of the point on the image the feature came from.
pub trait ImagePoint {
    /// Retrieves the point on the image in pixel coordinates.
    fn image_point(&self) -> Point2<f64>;
}

/// A location on an image frame in pixel coordinates.
///
/// Detectors attach more information to their keypoints (response, scale, orientation).
/// Once two features are matched, only their location matters to the rest of the pipeline,
/// which is what this type carries.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, AsMut, AsRef, Deref, DerefMut, From, Into)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct KeyPoint(pub Point2<f64>);

impl KeyPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self(Point2::new(x, y))
    }

    /// Converts any [`ImagePoint`] into a plain keypoint.
    pub fn from_image_point(point: &impl ImagePoint) -> Self {
        Self(point.image_point())
    }
}

impl ImagePoint for KeyPoint {
    fn image_point(&self) -> Point2<f64> {
        self.0
    }
}

impl ImagePoint for Point2<f64> {
    fn image_point(&self) -> Point2<f64> {
        *self
    }
}

impl ImagePoint for (f32, f32) {
    fn image_point(&self) -> Point2<f64> {
        Point2::new(self.0 as f64, self.1 as f64)
    }
}
