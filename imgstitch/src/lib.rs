//! # imgstitch
//!
//! Stitches overlapping photographs into one image.
//!
//! A pair of images `A` and `B` is stitched in four steps:
//!
//! 1. ORB features of both images are matched with a nearest neighbor ratio test
//!    ([`matching`]).
//! 2. RANSAC over the direct linear transform finds the homography that maps `B` into the
//!    frame of `A` and checks that enough matches agree with it ([`estimate`]).
//! 3. `B` is warped onto a canvas large enough for both images and `A` is laid on top at the
//!    origin ([`warp`]).
//! 4. The canvas is cropped to the region without padding ([`crop`]).
//!
//! A [`Stitcher`] folds a longer sequence of images: the composite so far is `A` and the next
//! image is `B`.
//!
//! ```no_run
//! use imgstitch::{StitchSettings, Stitcher};
//!
//! let stitcher = Stitcher::new(StitchSettings::default());
//! let panorama = stitcher.stitch_files(&["left.jpg", "right.jpg"])?;
//! panorama.stitched.save("stitched.png")?;
//! # Ok::<(), imgstitch::StitchError>(())
//! ```

pub mod crop;
mod error;
pub mod estimate;
pub mod matching;
mod pipeline;
mod settings;
pub mod warp;

pub use crop::CropRect;
pub use error::*;
pub use estimate::{estimate_homography, Estimate};
pub use matching::match_features;
pub use pipeline::*;
pub use settings::*;

pub use imgstitch_core;
pub use orb;
