use crate::{ImagePoint, KeyPoint};

#[cfg(feature = "serde-serialize")]
use serde::{Deserialize, Serialize};

/// A point in image `A` and the point in image `B` that was matched to it.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct FeatureMatch(pub KeyPoint, pub KeyPoint);

impl FeatureMatch {
    pub fn from_points(a: &impl ImagePoint, b: &impl ImagePoint) -> Self {
        Self(KeyPoint::from_image_point(a), KeyPoint::from_image_point(b))
    }
}

/// Two parallel sequences of matched points.
///
/// Index `i` of `points_a` corresponds to index `i` of `points_b`. The two sequences always
/// have the same length.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct Correspondences {
    points_a: Vec<KeyPoint>,
    points_b: Vec<KeyPoint>,
}

impl Correspondences {
    /// Pairs up two sequences of points.
    ///
    /// Returns `None` if the sequences have different lengths.
    pub fn new(points_a: Vec<KeyPoint>, points_b: Vec<KeyPoint>) -> Option<Self> {
        if points_a.len() != points_b.len() {
            return None;
        }
        Some(Self { points_a, points_b })
    }

    pub fn points_a(&self) -> &[KeyPoint] {
        &self.points_a
    }

    pub fn points_b(&self) -> &[KeyPoint] {
        &self.points_b
    }

    pub fn len(&self) -> usize {
        self.points_a.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points_a.is_empty()
    }

    pub fn push(&mut self, FeatureMatch(a, b): FeatureMatch) {
        self.points_a.push(a);
        self.points_b.push(b);
    }

    /// Iterates over the correspondences as [`FeatureMatch`]es.
    ///
    /// The iterator is cheap to clone, which is what estimators and consensus algorithms need.
    pub fn iter(&self) -> impl Iterator<Item = FeatureMatch> + Clone + '_ {
        self.points_a
            .iter()
            .zip(&self.points_b)
            .map(|(&a, &b)| FeatureMatch(a, b))
    }

    pub fn get(&self, index: usize) -> Option<FeatureMatch> {
        Some(FeatureMatch(
            *self.points_a.get(index)?,
            *self.points_b.get(index)?,
        ))
    }
}

impl FromIterator<FeatureMatch> for Correspondences {
    fn from_iter<T: IntoIterator<Item = FeatureMatch>>(iter: T) -> Self {
        let mut correspondences = Self::default();
        for feature_match in iter {
            correspondences.push(feature_match);
        }
        correspondences
    }
}
