use crate::{Result, StitchDirection, StitchError};
use image::{imageops, GrayImage, Luma, RgbImage};
use imageproc::integral_image::{integral_image, sum_image_pixels};
use imgstitch_core::nalgebra::Point2;
use imgstitch_core::Homography;
use log::*;

/// Corner coordinates this close to a whole pixel are snapped onto it before rounding.
const SNAP_TOLERANCE: f64 = 1e-3;

/// A rectangle of canvas pixels, `[x_start, x_end) x [y_start, y_end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CropRect {
    pub x_start: u32,
    pub y_start: u32,
    pub x_end: u32,
    pub y_end: u32,
}

impl CropRect {
    pub fn width(&self) -> u32 {
        self.x_end.saturating_sub(self.x_start)
    }

    pub fn height(&self) -> u32 {
        self.y_end.saturating_sub(self.y_start)
    }

    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    fn area(&self) -> u64 {
        self.width() as u64 * self.height() as u64
    }

    /// Moves every side one pixel inward.
    fn shrink(&self) -> Self {
        Self {
            x_start: self.x_start + 1,
            y_start: self.y_start + 1,
            x_end: self.x_end.saturating_sub(1),
            y_end: self.y_end.saturating_sub(1),
        }
    }
}

/// The four corners of a `width` by `height` image: top left, top right, bottom right and
/// bottom left.
pub fn image_corners(width: u32, height: u32) -> [Point2<f64>; 4] {
    let (right, bottom) = (width as f64 - 1.0, height as f64 - 1.0);
    [
        Point2::new(0.0, 0.0),
        Point2::new(right, 0.0),
        Point2::new(right, bottom),
        Point2::new(0.0, bottom),
    ]
}

fn snap(value: f64) -> f64 {
    if (value - value.round()).abs() < SNAP_TOLERANCE {
        value.round()
    } else {
        value
    }
}

/// Rounds a start coordinate up into `[0, limit]`.
fn start_pixel(value: f64, limit: u32) -> u32 {
    snap(value).ceil().max(0.0).min(limit as f64) as u32
}

/// Rounds an end coordinate down into `[0, limit]`.
fn end_pixel(value: f64, limit: u32) -> u32 {
    snap(value).floor().max(0.0).min(limit as f64) as u32
}

/// Computes the part of the canvas that is covered without warp padding.
///
/// The corners of `B` are mapped into the canvas with `homography`. Along the stitch
/// direction the crop ends where the nearer of `B`'s far corners lands. Across it, the crop
/// keeps the rows (or columns) both images cover, bounded by `A`.
pub fn crop_points(
    homography: &Homography,
    (a_width, a_height): (u32, u32),
    (b_width, b_height): (u32, u32),
    (canvas_width, canvas_height): (u32, u32),
    direction: StitchDirection,
) -> CropRect {
    let [top_left, top_right, bottom_right, bottom_left] =
        image_corners(b_width, b_height).map(|corner| homography.transform_point(corner));
    trace!(
        "Warped corners of B: {:?} {:?} {:?} {:?}",
        top_left,
        top_right,
        bottom_right,
        bottom_left
    );
    let rect = match direction {
        StitchDirection::Horizontal => {
            let y_start = top_left.y.max(top_right.y).max(0.0);
            let y_end = bottom_left
                .y
                .min(bottom_right.y)
                .min(a_height as f64 - 1.0);
            let x_end = top_right.x.min(bottom_right.x);
            CropRect {
                x_start: 0,
                y_start: start_pixel(y_start, canvas_height),
                x_end: end_pixel(x_end, canvas_width),
                y_end: end_pixel(y_end, canvas_height),
            }
        }
        StitchDirection::Vertical => {
            let x_start = top_left.x.max(bottom_left.x).max(0.0);
            let x_end = top_right.x.min(bottom_right.x).min(a_width as f64 - 1.0);
            let y_end = bottom_left.y.min(bottom_right.y);
            CropRect {
                x_start: start_pixel(x_start, canvas_width),
                y_start: 0,
                x_end: end_pixel(x_end, canvas_width),
                y_end: end_pixel(y_end, canvas_height),
            }
        }
    };
    debug!("Crop rectangle {:?}", rect);
    rect
}

/// Finds the largest rectangle free of black pixels by eroding the bounding box of the content.
///
/// A pixel is content when any of its channels is non-zero. Starting from the bounding box of
/// all content, every side moves one pixel inward until the rectangle holds no background.
/// Returns an empty rectangle for an all black canvas.
pub fn mask_crop(canvas: &RgbImage) -> CropRect {
    let (width, height) = canvas.dimensions();
    let mask = GrayImage::from_fn(width, height, |x, y| {
        Luma([u8::from(canvas.get_pixel(x, y).0.iter().any(|&c| c > 0))])
    });

    let mut bounds: Option<CropRect> = None;
    for (x, y, pixel) in mask.enumerate_pixels() {
        if pixel[0] == 0 {
            continue;
        }
        let rect = bounds.get_or_insert(CropRect {
            x_start: x,
            y_start: y,
            x_end: x + 1,
            y_end: y + 1,
        });
        rect.x_start = rect.x_start.min(x);
        rect.y_start = rect.y_start.min(y);
        rect.x_end = rect.x_end.max(x + 1);
        rect.y_end = rect.y_end.max(y + 1);
    }
    let mut rect = match bounds {
        Some(rect) => rect,
        None => {
            warn!("canvas has no content to crop to");
            return CropRect {
                x_start: 0,
                y_start: 0,
                x_end: 0,
                y_end: 0,
            };
        }
    };

    let integral = integral_image::<_, u32>(&mask);
    let content = |rect: &CropRect| {
        sum_image_pixels(
            &integral,
            rect.x_start,
            rect.y_start,
            rect.x_end - 1,
            rect.y_end - 1,
        )[0] as u64
    };
    let mut steps = 0;
    while !rect.is_empty() && content(&rect) < rect.area() {
        rect = rect.shrink();
        steps += 1;
    }
    debug!("Eroded the content bounds {} times to {:?}", steps, rect);
    rect
}

/// Copies the pixels inside `rect` out of `canvas`.
pub fn crop(canvas: &RgbImage, rect: CropRect) -> Result<RgbImage> {
    let (width, height) = canvas.dimensions();
    let clamped = CropRect {
        x_start: rect.x_start.min(width),
        y_start: rect.y_start.min(height),
        x_end: rect.x_end.min(width),
        y_end: rect.y_end.min(height),
    };
    if clamped.is_empty() {
        warn!("crop rectangle {:?} is empty", rect);
        return Err(StitchError::EmptyCrop(rect));
    }
    Ok(imageops::crop_imm(
        canvas,
        clamped.x_start,
        clamped.y_start,
        clamped.width(),
        clamped.height(),
    )
    .to_image())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;
    use imageproc::drawing::draw_filled_rect_mut;
    use imageproc::rect::Rect;
    use imgstitch_core::nalgebra::Matrix3;

    #[test]
    fn horizontal_translation() {
        let h = Homography::from_translation(350.0, 0.0);
        let rect = crop_points(
            &h,
            (500, 500),
            (500, 500),
            (1000, 500),
            StitchDirection::Horizontal,
        );
        assert_eq!(
            rect,
            CropRect {
                x_start: 0,
                y_start: 0,
                x_end: 849,
                y_end: 499,
            }
        );
    }

    #[test]
    fn horizontal_offset_rounds_inward() {
        // B is shifted down by 2.5 pixels, so the first rows of the canvas have no B content.
        let h = Homography::from_translation(300.0, 2.5);
        let rect = crop_points(
            &h,
            (400, 300),
            (400, 300),
            (800, 300),
            StitchDirection::Horizontal,
        );
        assert_eq!(rect.y_start, 3);
        assert_eq!(rect.y_end, 299);
        assert_eq!(rect.x_end, 699);
    }

    #[test]
    fn vertical_translation() {
        let h = Homography::from_translation(0.0, 300.0);
        let rect = crop_points(
            &h,
            (300, 400),
            (300, 400),
            (300, 800),
            StitchDirection::Vertical,
        );
        assert_eq!(
            rect,
            CropRect {
                x_start: 0,
                y_start: 0,
                x_end: 299,
                y_end: 699,
            }
        );
    }

    #[test]
    fn horizontal_upward_offset_starts_at_the_top() {
        // B sits 4 pixels above A, so the top of the canvas is still covered by A.
        let h = Homography::from_translation(350.0, -4.0);
        let rect = crop_points(
            &h,
            (500, 500),
            (500, 500),
            (1000, 500),
            StitchDirection::Horizontal,
        );
        assert_eq!(
            rect,
            CropRect {
                x_start: 0,
                y_start: 0,
                x_end: 849,
                y_end: 495,
            }
        );
    }

    #[test]
    fn vertical_leftward_offset_starts_at_the_left() {
        let h = Homography::from_translation(-3.0, 300.0);
        let rect = crop_points(
            &h,
            (300, 400),
            (300, 400),
            (300, 800),
            StitchDirection::Vertical,
        );
        assert_eq!(
            rect,
            CropRect {
                x_start: 0,
                y_start: 0,
                x_end: 296,
                y_end: 699,
            }
        );
    }

    #[test]
    fn vertical_takes_the_inner_sides() {
        // B is slightly rotated, so its left side leans out towards the bottom.
        let (c, s) = (0.02f64.cos(), 0.02f64.sin());
        let h = Homography(Matrix3::new(c, -s, 10.0, s, c, 200.0, 0.0, 0.0, 1.0));
        let rect = crop_points(
            &h,
            (300, 250),
            (300, 250),
            (300, 500),
            StitchDirection::Vertical,
        );
        let [tl, tr, br, bl] = image_corners(300, 250).map(|p| h.transform_point(p));
        assert_eq!(rect.x_start as f64, tl.x.max(bl.x).ceil());
        assert_eq!(rect.x_end, 299);
        assert_eq!(rect.y_end as f64, bl.y.min(br.y).floor());
        assert!(tr.x > 299.0);
    }

    #[test]
    fn empty_rectangles_are_errors() {
        let canvas = RgbImage::new(10, 10);
        let rect = CropRect {
            x_start: 4,
            y_start: 0,
            x_end: 4,
            y_end: 10,
        };
        assert!(matches!(crop(&canvas, rect), Err(StitchError::EmptyCrop(r)) if r == rect));
        let full = CropRect {
            x_start: 2,
            y_start: 3,
            x_end: 20,
            y_end: 7,
        };
        assert_eq!(crop(&canvas, full).unwrap().dimensions(), (8, 4));
    }

    #[test]
    fn mask_crop_keeps_solid_content() {
        let mut canvas = RgbImage::new(60, 40);
        draw_filled_rect_mut(&mut canvas, Rect::at(10, 5).of_size(30, 20), Rgb([1, 0, 0]));
        assert_eq!(
            mask_crop(&canvas),
            CropRect {
                x_start: 10,
                y_start: 5,
                x_end: 40,
                y_end: 25,
            }
        );
    }

    #[test]
    fn mask_crop_erodes_ragged_content() {
        let mut canvas = RgbImage::new(100, 60);
        draw_filled_rect_mut(&mut canvas, Rect::at(0, 0).of_size(60, 60), Rgb([90, 90, 90]));
        // A sliver of content sticking out to the right.
        draw_filled_rect_mut(&mut canvas, Rect::at(60, 10).of_size(10, 4), Rgb([90, 90, 90]));
        let rect = mask_crop(&canvas);
        assert_eq!(
            rect,
            CropRect {
                x_start: 10,
                y_start: 10,
                x_end: 60,
                y_end: 50,
            }
        );
        let cropped = crop(&canvas, rect).unwrap();
        assert!(cropped.pixels().all(|p| p.0 != [0, 0, 0]));
    }

    #[test]
    fn black_canvas_has_no_mask() {
        assert!(mask_crop(&RgbImage::new(8, 8)).is_empty());
    }
}
