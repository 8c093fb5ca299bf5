use bitarray::BitArray;
use image::GrayImage;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;

/// Number of intensity comparisons in a descriptor.
pub const DESCRIPTOR_BITS: usize = 256;

/// A 256-bit binary descriptor, compared by Hamming distance.
///
/// Bit `i` is set when the first point of the `i`-th sampling pair is darker than the second.
pub type Descriptor = BitArray<{ DESCRIPTOR_BITS / 8 }>;

/// Whether bit `index` of the descriptor is set.
pub fn bit(descriptor: &Descriptor, index: usize) -> bool {
    descriptor.bytes()[index / 8] >> (index % 8) & 1 == 1
}

pub fn set_bit(descriptor: &mut Descriptor, index: usize) {
    descriptor.bytes_mut()[index / 8] |= 1 << (index % 8);
}

/// A pair of offsets from the keypoint whose intensities are compared.
pub(crate) type SamplePair = [(f32, f32); 2];

/// The sampling pattern for a square patch of side `patch_size`.
///
/// Offsets are drawn uniformly from the patch with a seeded generator, so the same seed always
/// gives the same pattern.
pub(crate) fn pattern(patch_size: u32, seed: u64) -> Vec<SamplePair> {
    let half = (patch_size / 2) as i32;
    let mut rng = Pcg64::seed_from_u64(seed);
    let mut offset = || {
        (
            rng.gen_range(-half..=half) as f32,
            rng.gen_range(-half..=half) as f32,
        )
    };
    (0..DESCRIPTOR_BITS)
        .map(|_| [offset(), offset()])
        .collect()
}

/// Computes the descriptor of the keypoint at `(x, y)` with the pattern rotated by `angle`.
///
/// Returns `None` when a rotated sample falls outside the image.
pub(crate) fn steered_brief(
    smoothed: &GrayImage,
    x: u32,
    y: u32,
    angle: f32,
    pattern: &[SamplePair],
) -> Option<Descriptor> {
    let (width, height) = smoothed.dimensions();
    let (sin, cos) = angle.sin_cos();
    let sample = |(dx, dy): (f32, f32)| -> Option<u8> {
        let px = x as i64 + (cos * dx - sin * dy).round() as i64;
        let py = y as i64 + (sin * dx + cos * dy).round() as i64;
        if px < 0 || py < 0 || px >= width as i64 || py >= height as i64 {
            return None;
        }
        Some(smoothed.get_pixel(px as u32, py as u32)[0])
    };

    let mut descriptor = Descriptor::zeros();
    for (index, &[first, second]) in pattern.iter().enumerate() {
        if sample(first)? < sample(second)? {
            set_bit(&mut descriptor, index);
        }
    }
    Some(descriptor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    #[test]
    fn hamming_distance() {
        let mut a = Descriptor::zeros();
        let b = Descriptor::zeros();
        assert_eq!(a.distance(&b), 0);
        set_bit(&mut a, 0);
        set_bit(&mut a, 9);
        set_bit(&mut a, 255);
        assert_eq!(a.distance(&b), 3);
        assert!(bit(&a, 9) && !bit(&a, 10));
        assert_eq!(Descriptor::new([0xff; 32]).distance(&b), 256);
    }

    #[test]
    fn pattern_is_seeded() {
        assert_eq!(pattern(31, 1), pattern(31, 1));
        assert_ne!(pattern(31, 1), pattern(31, 2));
        assert!(pattern(31, 1)
            .iter()
            .flatten()
            .all(|&(x, y)| x.abs() <= 15.0 && y.abs() <= 15.0));
    }

    #[test]
    fn samples_outside_the_image_fail() {
        let image = GrayImage::from_pixel(40, 40, Luma([100]));
        let pattern = pattern(31, 0);
        assert!(steered_brief(&image, 20, 20, 0.0, &pattern).is_some());
        assert!(steered_brief(&image, 3, 20, 0.0, &pattern).is_none());
    }

    #[test]
    fn half_turn_swaps_gradient() {
        let ramp = GrayImage::from_fn(64, 64, |x, _| Luma([(x * 4) as u8]));
        let pattern = pattern(31, 0);
        let upright = steered_brief(&ramp, 32, 32, 0.0, &pattern).unwrap();
        let flipped = steered_brief(&ramp, 32, 32, std::f32::consts::PI, &pattern).unwrap();
        for (index, &[first, second]) in pattern.iter().enumerate() {
            if first.0 != second.0 {
                assert_ne!(bit(&upright, index), bit(&flipped, index));
            }
        }
    }
}
