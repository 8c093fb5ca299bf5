use crate::Orb;
use float_ord::FloatOrd;
use image::{GrayImage, ImageBuffer, Luma};
use imageproc::corners::corners_fast9;
use imageproc::gradients::{horizontal_sobel, vertical_sobel};

/// Half the side of the window the Harris response is accumulated over.
const HARRIS_RADIUS: u32 = 3;

/// Sobel gradients of one pyramid level.
pub(crate) struct Gradients {
    x: ImageBuffer<Luma<i16>, Vec<i16>>,
    y: ImageBuffer<Luma<i16>, Vec<i16>>,
}

impl Gradients {
    pub(crate) fn new(image: &GrayImage) -> Self {
        Self {
            x: horizontal_sobel(image),
            y: vertical_sobel(image),
        }
    }
}

/// A corner that survived detection on one pyramid level, in level coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Corner {
    pub x: u32,
    pub y: u32,
    pub response: f32,
}

impl Orb {
    /// Finds at most `budget` corners on a single pyramid level.
    ///
    /// FAST-9 corners are thinned with a 3x3 non-maximum suppression on the FAST score,
    /// corners within `edge_threshold` of the border are dropped, and the rest are ranked by
    /// their Harris response.
    pub(crate) fn detect_corners(&self, image: &GrayImage, budget: usize) -> Vec<Corner> {
        let (width, height) = image.dimensions();
        let fast = corners_fast9(image, self.fast_threshold);

        let mut scores = vec![0f32; width as usize * height as usize];
        for corner in &fast {
            scores[pixel_index(width, corner.x, corner.y)] = corner.score;
        }
        let gradients = Gradients::new(image);

        let edge = self.edge_threshold;
        let mut corners: Vec<Corner> = fast
            .iter()
            .filter(|c| {
                c.x >= edge && c.y >= edge && c.x + edge < width && c.y + edge < height
            })
            .filter(|c| is_local_maximum(&scores, width, height, c.x, c.y))
            .map(|c| Corner {
                x: c.x,
                y: c.y,
                response: harris_response(&gradients, c.x, c.y, self.harris_k),
            })
            .collect();
        corners.sort_by_key(|c| std::cmp::Reverse(FloatOrd(c.response)));
        corners.truncate(budget);
        corners
    }
}

/// Row major index of a pixel, computed in `usize` so large levels do not overflow `u32`.
fn pixel_index(width: u32, x: u32, y: u32) -> usize {
    y as usize * width as usize + x as usize
}

/// Checks the 8-neighbourhood. Equal scores are broken in favour of the corner that comes
/// first in raster order.
fn is_local_maximum(scores: &[f32], width: u32, height: u32, x: u32, y: u32) -> bool {
    let score = scores[pixel_index(width, x, y)];
    for ny in y.saturating_sub(1)..=(y + 1).min(height - 1) {
        for nx in x.saturating_sub(1)..=(x + 1).min(width - 1) {
            if (nx, ny) == (x, y) {
                continue;
            }
            let neighbour = scores[pixel_index(width, nx, ny)];
            if neighbour > score || (neighbour == score && (ny, nx) < (y, x)) {
                return false;
            }
        }
    }
    true
}

/// Harris corner measure `det(M) - k * trace(M)^2` of the structure tensor `M` summed over a
/// 7x7 window of Sobel gradients.
///
/// The caller guarantees the window fits inside the image.
pub(crate) fn harris_response(gradients: &Gradients, x: u32, y: u32, k: f32) -> f32 {
    let (mut sxx, mut syy, mut sxy) = (0f32, 0f32, 0f32);
    let r = HARRIS_RADIUS;
    for py in y - r..=y + r {
        for px in x - r..=x + r {
            let gx = gradients.x.get_pixel(px, py)[0] as f32;
            let gy = gradients.y.get_pixel(px, py)[0] as f32;
            sxx += gx * gx;
            syy += gy * gy;
            sxy += gx * gy;
        }
    }
    // Keeps the response in a range where f32 does not lose the determinant.
    let norm = 1.0 / (4.0 * 255.0 * 49.0);
    let (sxx, syy, sxy) = (sxx * norm * norm, syy * norm * norm, sxy * norm * norm);
    sxx * syy - sxy * sxy - k * (sxx + syy) * (sxx + syy)
}
