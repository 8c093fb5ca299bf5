use image::GrayImage;

/// Orientation of the patch around `(x, y)` from its intensity centroid, in radians.
///
/// The moments `m10` and `m01` are accumulated over a disc of radius `radius`, and the angle
/// is the direction from the patch center to the centroid. Pixels outside the image are
/// skipped.
pub(crate) fn intensity_centroid(image: &GrayImage, x: u32, y: u32, radius: i32) -> f32 {
    let (width, height) = image.dimensions();
    let (cx, cy) = (x as i32, y as i32);
    let (mut m10, mut m01) = (0i64, 0i64);
    for dy in -radius..=radius {
        let py = cy + dy;
        if py < 0 || py >= height as i32 {
            continue;
        }
        for dx in -radius..=radius {
            let px = cx + dx;
            if dx * dx + dy * dy > radius * radius || px < 0 || px >= width as i32 {
                continue;
            }
            let intensity = image.get_pixel(px as u32, py as u32)[0] as i64;
            m10 += dx as i64 * intensity;
            m01 += dy as i64 * intensity;
        }
    }
    (m01 as f32).atan2(m10 as f32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    #[test]
    fn brighter_side_sets_the_angle() {
        let right = GrayImage::from_fn(64, 64, |x, _| Luma([if x > 32 { 200 } else { 10 }]));
        assert!(intensity_centroid(&right, 32, 32, 15).abs() < 1e-3);

        let below = GrayImage::from_fn(64, 64, |_, y| Luma([if y > 32 { 200 } else { 10 }]));
        let angle = intensity_centroid(&below, 32, 32, 15);
        assert!((angle - std::f32::consts::FRAC_PI_2).abs() < 1e-3);
    }

    #[test]
    fn flat_patch_has_zero_angle() {
        let flat = GrayImage::from_pixel(64, 64, Luma([128]));
        assert_eq!(intensity_centroid(&flat, 32, 32, 15), 0.0);
    }
}
