use crate::CropRect;
use thiserror::Error;

/// Everything that can stop a stitch.
///
/// The first failure aborts the whole multi-image fold and is returned untouched.
#[derive(Error, Debug)]
pub enum StitchError {
    #[error("Expected 2 or more images but got only {count}")]
    InsufficientImages { count: usize },
    #[error("{message}")]
    InvalidImageFile { message: String },
    #[error(
        "There are not enough match points between images in the input images. \
         Required atleast {required} matches but could find only {found} matches!"
    )]
    NotEnoughMatchPoints { found: usize, required: usize },
    #[error(
        "The confidence in the matches is less than the defined threshold and hence the \
         stitching operation cannot be performed. Perhaps the input images have very less \
         overlapping content to detect good match points! Confidence: {confidence}"
    )]
    MatchesNotConfident { confidence: i32 },
    #[error("The estimated homography is not invertible")]
    DegenerateHomography,
    #[error("Cropping the stitched canvas leaves no pixels: {0:?}")]
    EmptyCrop(CropRect),
    #[error(transparent)]
    Image(#[from] image::ImageError),
}

pub type Result<T> = std::result::Result<T, StitchError>;
