mod descriptors;
mod detector;
mod orientation;
mod pyramid;

pub use descriptors::{bit, set_bit, Descriptor, DESCRIPTOR_BITS};

use ::image::{DynamicImage, GrayImage, ImageResult};
use imageproc::filter::gaussian_blur_f32;
use imgstitch_core::nalgebra::Point2;
use imgstitch_core::ImagePoint;
use log::*;
use std::path::Path;

#[cfg(feature = "serde-serialize")]
use serde::{Deserialize, Serialize};

/// A point of interest in an image.
/// This pretty much follows from OpenCV conventions.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct KeyPoint {
    /// The location in the full resolution image, with +x facing right and +y facing down,
    /// starting from the top left pixel.
    pub point: (f32, f32),
    /// The Harris response at the level the keypoint was detected on.
    pub response: f32,
    /// Diameter of the described patch, in full resolution pixels.
    pub size: f32,
    /// The pyramid level in which the keypoint was detected.
    pub octave: usize,
    /// The orientation angle in radians.
    pub angle: f32,
}

impl ImagePoint for KeyPoint {
    fn image_point(&self) -> Point2<f64> {
        Point2::new(self.point.0 as f64, self.point.1 as f64)
    }
}

/// Contains the configuration parameters of ORB.
///
/// The defaults follow the usual choices for ORB: 8 levels scaled by 1.2, a FAST threshold of
/// 20 and a 31 pixel patch. [`Orb::new`] only sets the number of features, which is the
/// parameter most worth tuning.
#[derive(Debug, Copy, Clone)]
pub struct Orb {
    /// Maximum number of features retained over all levels.
    pub num_features: usize,
    /// Number of pyramid levels.
    pub num_levels: usize,
    /// Downscaling ratio between consecutive pyramid levels.
    pub scale_factor: f32,
    /// Intensity difference a FAST arc must exceed.
    pub fast_threshold: u8,
    /// Features closer than this to a level's border are dropped.
    pub edge_threshold: u32,
    /// Side of the square patch the descriptor samples.
    pub patch_size: u32,
    /// The `k` in `det(M) - k * trace(M)^2`.
    pub harris_k: f32,
    /// Standard deviation of the smoothing applied before sampling descriptors.
    pub blur_sigma: f32,
    /// Seed of the sampling pattern. Descriptors are only comparable with the same seed.
    pub pattern_seed: u64,
}

impl Orb {
    /// Creates an extractor that keeps at most `num_features` features.
    pub fn new(num_features: usize) -> Self {
        Self {
            num_features,
            ..Default::default()
        }
    }
}

impl Default for Orb {
    fn default() -> Orb {
        Orb {
            num_features: 1000,
            num_levels: 8,
            scale_factor: 1.2,
            fast_threshold: 20,
            edge_threshold: 31,
            patch_size: 31,
            harris_k: 0.04,
            blur_sigma: 2.0,
            pattern_seed: 0x5eed_0b1e,
        }
    }
}

impl Orb {
    /// Extract features using the ORB feature extractor.
    ///
    /// The image is converted to grayscale first. Returns the keypoints and their descriptors,
    /// index for index.
    pub fn extract(&self, image: &DynamicImage) -> (Vec<KeyPoint>, Vec<Descriptor>) {
        self.extract_gray(&image.to_luma8())
    }

    /// Extract features using the ORB feature extractor from an image on disk.
    pub fn extract_path(
        &self,
        path: impl AsRef<Path>,
    ) -> ImageResult<(Vec<KeyPoint>, Vec<Descriptor>)> {
        Ok(self.extract(&::image::open(path)?))
    }

    /// Extract features from a grayscale image.
    ///
    /// This performs all operations end-to-end:
    ///
    /// 1. build the scale pyramid
    /// 2. detect FAST corners on every level and keep the best by Harris response
    /// 3. orient each corner by the intensity centroid of its patch
    /// 4. compute the steered BRIEF descriptor on the smoothed level
    pub fn extract_gray(&self, image: &GrayImage) -> (Vec<KeyPoint>, Vec<Descriptor>) {
        let pattern = descriptors::pattern(self.patch_size, self.pattern_seed);
        let pyramid = self.build_pyramid(image);
        trace!("Built a pyramid of {} levels.", pyramid.len());
        let budgets = self.level_budgets(pyramid.len());
        let half_patch = (self.patch_size / 2) as i32;

        let mut keypoints = vec![];
        let mut descriptors = vec![];
        for (octave, (level, &budget)) in pyramid.iter().zip(&budgets).enumerate() {
            let corners = self.detect_corners(&level.image, budget);
            debug!(
                "Level {} ({}x{}) kept {} of a budget of {} corners",
                octave,
                level.image.width(),
                level.image.height(),
                corners.len(),
                budget
            );
            if corners.is_empty() {
                continue;
            }
            let smoothed = gaussian_blur_f32(&level.image, self.blur_sigma);
            for corner in corners {
                let angle =
                    orientation::intensity_centroid(&level.image, corner.x, corner.y, half_patch);
                let descriptor =
                    match descriptors::steered_brief(&smoothed, corner.x, corner.y, angle, &pattern)
                    {
                        Some(descriptor) => descriptor,
                        None => continue,
                    };
                keypoints.push(KeyPoint {
                    point: (corner.x as f32 * level.scale, corner.y as f32 * level.scale),
                    response: corner.response,
                    size: self.patch_size as f32 * level.scale,
                    octave,
                    angle,
                });
                descriptors.push(descriptor);
            }
        }
        info!("Extracted {} features", keypoints.len());
        (keypoints, descriptors)
    }
}
