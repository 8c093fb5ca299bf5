use crate::{Result, StitchDirection, StitchError};
use image::{imageops, ImageBuffer, Pixel, RgbImage};
use imageproc::geometric_transformations::{warp_into_with, Interpolation};
use imgstitch_core::nalgebra::Point2;
use imgstitch_core::Homography;
use log::*;

/// Pre-images this far outside the source image are pulled back onto its border.
const BORDER_TOLERANCE: f64 = 0.5;
/// Pre-images this close to a whole pixel are snapped onto it.
const SNAP_TOLERANCE: f64 = 1e-3;

/// Dimensions of the canvas that receives both images.
pub fn canvas_size(
    (a_width, a_height): (u32, u32),
    (b_width, b_height): (u32, u32),
    direction: StitchDirection,
) -> (u32, u32) {
    match direction {
        StitchDirection::Vertical => (a_width, a_height + b_height),
        StitchDirection::Horizontal => (a_width + b_width, a_height),
    }
}

/// Adjusts one coordinate of a pre-image in a source of `size` pixels.
///
/// Coordinates within half a pixel outside the source land on its border, coordinates further
/// out become `-1.0` so they are never sampled, and coordinates next to a whole pixel are
/// snapped onto it.
fn clamp_to_border(value: f64, size: u32) -> f64 {
    let last = size as f64 - 1.0;
    if value < -BORDER_TOLERANCE || value > last + BORDER_TOLERANCE || !value.is_finite() {
        -1.0
    } else if value < 0.0 {
        0.0
    } else if value > last {
        last
    } else if (value - value.round()).abs() < SNAP_TOLERANCE {
        value.round()
    } else {
        value
    }
}

/// Copies `image` with its last column and row repeated once.
///
/// Bilinear sampling reads the pixel right of and below the sample, so this lets the last
/// column and row of the original be sampled exactly.
fn pad_border<P>(image: &ImageBuffer<P, Vec<u8>>) -> ImageBuffer<P, Vec<u8>>
where
    P: Pixel<Subpixel = u8>,
{
    let (width, height) = image.dimensions();
    ImageBuffer::from_fn(width + 1, height + 1, |x, y| {
        *image.get_pixel(x.min(width - 1), y.min(height - 1))
    })
}

/// Warps `image` into a new `width` by `height` image with the homography.
///
/// Every output pixel is looked up in `image` through the inverse of `homography` and
/// bilinearly interpolated. Pixels that map outside `image` are black. Only 8-bit pixels
/// with up to four channels are supported.
pub fn warp_perspective<P>(
    image: &ImageBuffer<P, Vec<u8>>,
    homography: &Homography,
    width: u32,
    height: u32,
) -> Result<ImageBuffer<P, Vec<u8>>>
where
    P: Pixel<Subpixel = u8> + Send + Sync,
{
    let inverse = homography
        .inverse()
        .ok_or(StitchError::DegenerateHomography)?;
    let zeros = [0u8; 4];
    let black = *P::from_slice(&zeros[..P::CHANNEL_COUNT as usize]);
    let mut out = ImageBuffer::from_pixel(width, height, black);
    let (source_width, source_height) = image.dimensions();
    if source_width == 0 || source_height == 0 {
        return Ok(out);
    }

    let mapping = |x: f32, y: f32| {
        let p = inverse.transform_point(Point2::new(x as f64, y as f64));
        (
            clamp_to_border(p.x, source_width) as f32,
            clamp_to_border(p.y, source_height) as f32,
        )
    };
    warp_into_with(
        &pad_border(image),
        mapping,
        Interpolation::Bilinear,
        black,
        &mut out,
    );
    Ok(out)
}

/// Warps `b` into the frame of `a` on a canvas sized for `direction` and overlays `a`
/// unmodified at the origin.
pub fn composite(
    a: &RgbImage,
    b: &RgbImage,
    homography: &Homography,
    direction: StitchDirection,
) -> Result<RgbImage> {
    let (width, height) = canvas_size(a.dimensions(), b.dimensions(), direction);
    debug!("Compositing onto a {}x{} canvas", width, height);
    let mut canvas = warp_perspective(b, homography, width, height)?;
    imageops::replace(&mut canvas, a, 0, 0);
    Ok(canvas)
}
