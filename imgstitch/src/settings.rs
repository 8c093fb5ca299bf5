#[cfg(feature = "serde-serialize")]
use serde::{Deserialize, Serialize};

/// How image `B` sits relative to image `A`.
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde-serialize", serde(rename_all = "lowercase"))]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum StitchDirection {
    /// `B` is below `A`. The canvas grows in height.
    Vertical,
    /// `B` is right of `A`. The canvas grows in width.
    Horizontal,
}

impl StitchDirection {
    /// The numeric code of the direction: `0` for vertical and `1` for horizontal.
    pub fn code(self) -> u8 {
        match self {
            Self::Vertical => 0,
            Self::Horizontal => 1,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Vertical),
            1 => Some(Self::Horizontal),
            _ => None,
        }
    }
}

impl Default for StitchDirection {
    fn default() -> Self {
        Self::Horizontal
    }
}

impl std::str::FromStr for StitchDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "vertical" | "v" | "0" => Ok(Self::Vertical),
            "horizontal" | "h" | "1" => Ok(Self::Horizontal),
            _ => Err(format!(
                "unknown stitch direction `{}`, expected `horizontal` or `vertical`",
                s
            )),
        }
    }
}

/// How the composited canvas is cropped.
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde-serialize", serde(rename_all = "lowercase"))]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum CropMode {
    /// Crop to where the warped corners of `B` guarantee content.
    Corners,
    /// Crop to the largest rectangle free of black padding, found by eroding the bounding box
    /// of all non-black pixels.
    Mask,
}

impl Default for CropMode {
    fn default() -> Self {
        Self::Corners
    }
}

/// The settings for the stitching process.
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct StitchSettings {
    /// The maximum number of ORB features extracted per image
    #[cfg_attr(
        feature = "serde-serialize",
        serde(default = "default_num_keypoints")
    )]
    pub num_keypoints: usize,
    /// A match is kept if its distance is below this ratio of the second best distance
    #[cfg_attr(feature = "serde-serialize", serde(default = "default_ratio"))]
    pub ratio: f64,
    /// The minimum number of matches required to estimate a homography
    #[cfg_attr(
        feature = "serde-serialize",
        serde(default = "default_minimum_match_points")
    )]
    pub minimum_match_points: usize,
    /// The number of matches drawn per RANSAC hypothesis
    #[cfg_attr(feature = "serde-serialize", serde(default = "default_sample_size"))]
    pub sample_size: usize,
    /// The probability of drawing at least one outlier free sample, which sets the RANSAC iterations
    #[cfg_attr(
        feature = "serde-serialize",
        serde(default = "default_success_probability")
    )]
    pub success_probability: f64,
    /// The reprojection error in pixels above which a match is an outlier
    #[cfg_attr(
        feature = "serde-serialize",
        serde(default = "default_outlier_threshold")
    )]
    pub outlier_threshold: f64,
    /// The minimum confidence (percentage of inliers) to accept a homography
    #[cfg_attr(
        feature = "serde-serialize",
        serde(default = "default_confidence_threshold")
    )]
    pub confidence_threshold: i32,
    /// Where each image sits relative to the stitched result so far
    #[cfg_attr(feature = "serde-serialize", serde(default))]
    pub direction: StitchDirection,
    /// How the stitched canvas is cropped
    #[cfg_attr(feature = "serde-serialize", serde(default))]
    pub crop_mode: CropMode,
    /// The seed of the random number generator used by RANSAC
    #[cfg_attr(feature = "serde-serialize", serde(default))]
    pub seed: u64,
}

impl Default for StitchSettings {
    fn default() -> Self {
        Self {
            num_keypoints: default_num_keypoints(),
            ratio: default_ratio(),
            minimum_match_points: default_minimum_match_points(),
            sample_size: default_sample_size(),
            success_probability: default_success_probability(),
            outlier_threshold: default_outlier_threshold(),
            confidence_threshold: default_confidence_threshold(),
            direction: StitchDirection::default(),
            crop_mode: CropMode::default(),
            seed: 0,
        }
    }
}

fn default_num_keypoints() -> usize {
    1000
}

fn default_ratio() -> f64 {
    0.8
}

fn default_minimum_match_points() -> usize {
    20
}

fn default_sample_size() -> usize {
    5
}

fn default_success_probability() -> f64 {
    0.995
}

fn default_outlier_threshold() -> f64 {
    3.0
}

fn default_confidence_threshold() -> i32 {
    65
}
