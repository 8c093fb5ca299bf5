use crate::crop::{crop, crop_points, mask_crop};
use crate::estimate::estimate_homography;
use crate::matching::match_features;
use crate::warp::composite;
use crate::{CropMode, CropRect, Result, StitchError, StitchSettings};
use image::{imageops, RgbImage};
use imgstitch_core::Homography;
use log::*;
use rand::{RngCore, SeedableRng};
use rand_pcg::Pcg64;
use std::path::Path;

/// Extensions of the image files accepted as input, compared case-insensitively.
pub const IMAGE_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

/// Checks that there are at least two inputs and that each is an existing image file.
pub fn validate_image_files<P: AsRef<Path>>(paths: &[P]) -> Result<()> {
    if paths.len() < 2 {
        return Err(StitchError::InsufficientImages { count: paths.len() });
    }
    for path in paths {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(StitchError::InvalidImageFile {
                message: format!("File not found: {}", path.display()),
            });
        }
        let is_image = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map_or(false, |ext| {
                IMAGE_EXTENSIONS
                    .iter()
                    .any(|allowed| ext.eq_ignore_ascii_case(allowed))
            });
        if !is_image {
            let name = match path.file_name() {
                Some(name) => name.to_string_lossy().into_owned(),
                None => path.display().to_string(),
            };
            return Err(StitchError::InvalidImageFile {
                message: format!("Invalid image file: {}", name),
            });
        }
    }
    Ok(())
}

/// Everything produced while stitching one pair of images.
#[derive(Debug, Clone)]
pub struct PairStitch {
    /// Maps `B` into the frame of `A`.
    pub homography: Homography,
    pub confidence: i32,
    /// The uncropped composite.
    pub canvas: RgbImage,
    pub crop: CropRect,
    /// The cropped composite.
    pub stitched: RgbImage,
}

/// Stitches `b` onto `a`.
///
/// `a` is the reference: it lands unmodified at the origin of the canvas and `b` is warped
/// next to it in `settings.direction`.
pub fn stitch_image_pair<R>(
    a: &RgbImage,
    b: &RgbImage,
    settings: &StitchSettings,
    rng: R,
) -> Result<PairStitch>
where
    R: RngCore,
{
    trace!("Converting the pair to grayscale.");
    let gray_a = imageops::grayscale(a);
    let gray_b = imageops::grayscale(b);

    let correspondences = match_features(&gray_a, &gray_b, settings)?;
    let estimate = estimate_homography(&correspondences, settings, rng)?;
    debug!("Homography of B into A: {:?}", estimate.homography.0);

    trace!("Compositing.");
    let canvas = composite(a, b, &estimate.homography, settings.direction)?;

    trace!("Cropping.");
    let rect = match settings.crop_mode {
        CropMode::Corners => crop_points(
            &estimate.homography,
            a.dimensions(),
            b.dimensions(),
            canvas.dimensions(),
            settings.direction,
        ),
        CropMode::Mask => mask_crop(&canvas),
    };
    let stitched = crop(&canvas, rect)?;
    info!(
        "Stitched a {}x{} pair into {}x{} with confidence {}",
        a.width(),
        a.height(),
        stitched.width(),
        stitched.height(),
        estimate.confidence
    );

    Ok(PairStitch {
        homography: estimate.homography,
        confidence: estimate.confidence,
        canvas,
        crop: rect,
        stitched,
    })
}

/// The result of stitching a sequence of images.
#[derive(Debug, Clone)]
pub struct Panorama {
    /// The cropped composite of all images.
    pub stitched: RgbImage,
    /// The uncropped canvas of the last pair.
    pub canvas: RgbImage,
}

/// Stitches sequences of images, each onto the composite of the ones before it.
#[derive(Debug, Clone, Default)]
pub struct Stitcher {
    pub settings: StitchSettings,
}

impl Stitcher {
    pub fn new(settings: StitchSettings) -> Self {
        Self { settings }
    }

    /// Folds `images` left to right: the composite so far is `A` and the next image is `B`.
    ///
    /// The first error aborts the fold.
    pub fn stitch_images(&self, images: Vec<RgbImage>) -> Result<Panorama> {
        let count = images.len();
        if count < 2 {
            return Err(StitchError::InsufficientImages { count });
        }
        let mut rng = Pcg64::seed_from_u64(self.settings.seed);
        let mut images = images.into_iter();
        let mut stitched = match images.next() {
            Some(first) => first,
            None => return Err(StitchError::InsufficientImages { count }),
        };
        let mut canvas = None;
        for (ix, image) in images.enumerate() {
            info!("Stitching image {} of {}", ix + 2, count);
            let pair = stitch_image_pair(&stitched, &image, &self.settings, &mut rng)?;
            stitched = pair.stitched;
            canvas = Some(pair.canvas);
        }
        let canvas = canvas.ok_or(StitchError::InsufficientImages { count })?;
        info!(
            "Finished stitching {} images into {}x{}",
            count,
            stitched.width(),
            stitched.height()
        );
        Ok(Panorama { stitched, canvas })
    }

    /// Validates and loads the image files, then stitches them in order.
    pub fn stitch_files<P: AsRef<Path>>(&self, paths: &[P]) -> Result<Panorama> {
        validate_image_files(paths)?;
        let images = paths
            .iter()
            .map(|path| {
                debug!("Loading {}", path.as_ref().display());
                Ok(image::open(path)?.to_rgb8())
            })
            .collect::<Result<Vec<_>>>()?;
        self.stitch_images(images)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn a_single_image_is_not_enough() {
        let stitcher = Stitcher::default();
        match stitcher.stitch_images(vec![RgbImage::new(4, 4)]) {
            Err(StitchError::InsufficientImages { count }) => assert_eq!(count, 1),
            other => panic!("unexpected {:?}", other.map(|p| p.stitched.dimensions())),
        }
        assert!(matches!(
            validate_image_files::<&str>(&[]),
            Err(StitchError::InsufficientImages { count: 0 })
        ));
    }

    #[test]
    fn missing_files_are_reported_by_path() {
        let error = validate_image_files(&["does/not/exist.png", "neither.jpg"]).unwrap_err();
        assert_eq!(error.to_string(), "File not found: does/not/exist.png");
    }
}
