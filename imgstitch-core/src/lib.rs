//! # imgstitch core
//!
//! Common abstractions and types shared by the crates that make up the imgstitch pipeline.
//! The feature extractor, the homography estimator, the consensus algorithm and the
//! compositor all speak in terms of the types defined here, so that any of them can be
//! swapped out without the others noticing.
//!
//! The crate is intentionally small:
//!
//! * [`KeyPoint`] and [`ImagePoint`] describe locations in an image's pixel frame.
//! * [`FeatureMatch`] and [`Correspondences`] describe matched points between two images.
//! * [`Homography`] is the projective transform that relates two planar image frames.
//! * [`sample_consensus`] is re-exported for the seams between them. An estimator produces
//!   models from a minimal sample of data, and a consensus algorithm (RANSAC, for instance)
//!   drives an estimator to find the model best supported by noisy data.
//!
//! ## Coordinate conventions
//!
//! Pixel coordinates put the origin at the top left corner of the image, with `+x` to the
//! right and `+y` towards the bottom. A [`Homography`] estimated for a pair of images `A` and
//! `B` maps points of `B` into the frame of `A`:
//!
//! ```text
//!   [u]       [x]
//!   [v] ~ H * [y]
//!   [1]       [1]
//! ```
//!
//! where `(x, y)` lies in `B` and `(u, v)` is where it lands in `A`.

mod homography;
mod keypoint;
mod matches;

pub use homography::*;
pub use keypoint::*;
pub use matches::*;
pub use nalgebra;
pub use sample_consensus;
