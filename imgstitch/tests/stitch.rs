use image::{imageops, Rgb, RgbImage};
use imageproc::{drawing::draw_filled_rect_mut, rect::Rect};
use imgstitch::{stitch_image_pair, CropMode, StitchDirection, StitchSettings, Stitcher};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;

/// A scene of random colored 8x8 blocks without any black pixel.
fn scene(width: u32, height: u32, seed: u64) -> RgbImage {
    let mut rng = Pcg64::seed_from_u64(seed);
    let mut image = RgbImage::new(width, height);
    for y in (0..height).step_by(8) {
        for x in (0..width).step_by(8) {
            let color = Rgb([
                rng.gen_range(20..=255),
                rng.gen_range(20..=255),
                rng.gen_range(20..=255),
            ]);
            draw_filled_rect_mut(
                &mut image,
                Rect::at(x as i32, y as i32).of_size(8, 8),
                color,
            );
        }
    }
    image
}

fn view(scene: &RgbImage, x: u32, y: u32, width: u32, height: u32) -> RgbImage {
    imageops::crop_imm(scene, x, y, width, height).to_image()
}

fn has_black(image: &RgbImage) -> bool {
    image.pixels().any(|p| p.0 == [0, 0, 0])
}

/// Mean absolute difference over all channels against the scene, with the stitched image
/// placed at the offset (up to two pixels) that fits best.
fn mean_difference(stitched: &RgbImage, scene: &RgbImage) -> f64 {
    let mut best = f64::INFINITY;
    for dy in 0..3 {
        for dx in 0..3 {
            let mut total = 0u64;
            let mut count = 0u64;
            for (x, y, p) in stitched.enumerate_pixels() {
                let (sx, sy) = (x + dx, y + dy);
                if sx >= scene.width() || sy >= scene.height() {
                    continue;
                }
                let q = scene.get_pixel(sx, sy);
                for c in 0..3 {
                    total += (p[c] as i64 - q[c] as i64).unsigned_abs();
                }
                count += 3;
            }
            best = best.min(total as f64 / count as f64);
        }
    }
    best
}

#[test]
fn horizontal_pair() {
    let _ = pretty_env_logger::try_init();
    for seed in 20..24 {
        let scene = scene(850, 500, seed);
        let a = view(&scene, 0, 0, 500, 500);
        let b = view(&scene, 350, 0, 500, 500);

        let pair = stitch_image_pair(
            &a,
            &b,
            &StitchSettings::default(),
            Pcg64::seed_from_u64(0),
        )
        .unwrap();
        assert_eq!(pair.canvas.dimensions(), (1000, 500));
        assert!(pair.confidence >= 65, "seed {}: {}", seed, pair.confidence);

        let translation = pair.homography.0 / pair.homography.0[(2, 2)];
        assert!((translation[(0, 2)] - 350.0).abs() < 1.0, "seed {}", seed);
        assert!(translation[(1, 2)].abs() < 1.0, "seed {}", seed);

        let (width, height) = pair.stitched.dimensions();
        assert!((846..=850).contains(&width), "seed {}: width {}", seed, width);
        assert!((496..=500).contains(&height), "seed {}: height {}", seed, height);
        assert!(!has_black(&pair.stitched), "seed {}", seed);
        assert!(mean_difference(&pair.stitched, &scene) < 8.0, "seed {}", seed);
    }
}

#[test]
fn vertical_pair() {
    let _ = pretty_env_logger::try_init();
    let settings = StitchSettings {
        direction: StitchDirection::Vertical,
        ..StitchSettings::default()
    };
    for seed in 30..34 {
        let scene = scene(500, 850, seed);
        let a = view(&scene, 0, 0, 500, 500);
        let b = view(&scene, 0, 350, 500, 500);

        let pair = stitch_image_pair(&a, &b, &settings, Pcg64::seed_from_u64(0)).unwrap();
        assert_eq!(pair.canvas.dimensions(), (500, 1000));
        let (width, height) = pair.stitched.dimensions();
        assert!((496..=500).contains(&width), "seed {}: width {}", seed, width);
        assert!((846..=850).contains(&height), "seed {}: height {}", seed, height);
        assert!(!has_black(&pair.stitched), "seed {}", seed);
        assert!(mean_difference(&pair.stitched, &scene) < 8.0, "seed {}", seed);
    }
}

#[test]
fn mask_crop_removes_padding() {
    let _ = pretty_env_logger::try_init();
    let scene = scene(850, 500, 13);
    let a = view(&scene, 0, 0, 500, 500);
    let b = view(&scene, 350, 0, 500, 500);
    let settings = StitchSettings {
        crop_mode: CropMode::Mask,
        ..StitchSettings::default()
    };

    let pair = stitch_image_pair(&a, &b, &settings, Pcg64::seed_from_u64(0)).unwrap();
    assert!(has_black(&pair.canvas));
    assert!(!has_black(&pair.stitched));
    assert!(pair.stitched.width() > 800);
}

#[test]
fn three_images_fold_left_to_right() {
    let _ = pretty_env_logger::try_init();
    for seed in 40..43 {
        let scene = scene(1200, 400, seed);
        let images = vec![
            view(&scene, 0, 0, 500, 400),
            view(&scene, 350, 0, 500, 400),
            view(&scene, 700, 0, 500, 400),
        ];

        let panorama = Stitcher::new(StitchSettings::default())
            .stitch_images(images)
            .unwrap();
        let (width, height) = panorama.stitched.dimensions();
        assert!((1192..=1200).contains(&width), "seed {}: width {}", seed, width);
        assert!((392..=400).contains(&height), "seed {}: height {}", seed, height);
        assert!(!has_black(&panorama.stitched), "seed {}", seed);
        assert!(mean_difference(&panorama.stitched, &scene) < 8.0, "seed {}", seed);
        // The last canvas holds the stitch of the first two images and room for the third.
        let canvas_width = panorama.canvas.width();
        assert!((1346..=1350).contains(&canvas_width), "seed {}: canvas {}", seed, canvas_width);
    }
}

#[test]
fn unrelated_images_are_rejected() {
    let _ = pretty_env_logger::try_init();
    let a = scene(400, 400, 15);
    let b = scene(400, 400, 16);
    let settings = StitchSettings::default();
    assert!(stitch_image_pair(&a, &b, &settings, Pcg64::seed_from_u64(0)).is_err());
}
