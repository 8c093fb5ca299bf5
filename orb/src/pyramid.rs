use crate::Orb;
use image::{imageops, GrayImage};

/// One level of the scale pyramid.
pub(crate) struct Level {
    pub image: GrayImage,
    /// Multiply level coordinates by this to get full resolution coordinates.
    pub scale: f32,
}

impl Orb {
    /// Downscales the image by `scale_factor` per level.
    ///
    /// Every level is resized from the full resolution image. Levels too small to hold a
    /// single feature away from the border are not built.
    pub(crate) fn build_pyramid(&self, image: &GrayImage) -> Vec<Level> {
        let minimum = 2 * self.edge_threshold + 1;
        let (width, height) = image.dimensions();
        let mut levels = vec![];
        for octave in 0..self.num_levels.max(1) {
            let scale = self.scale_factor.powi(octave as i32);
            let level_width = (width as f32 / scale).round() as u32;
            let level_height = (height as f32 / scale).round() as u32;
            if level_width < minimum || level_height < minimum {
                break;
            }
            let level_image = if octave == 0 {
                image.clone()
            } else {
                imageops::resize(
                    image,
                    level_width,
                    level_height,
                    imageops::FilterType::Triangle,
                )
            };
            levels.push(Level {
                image: level_image,
                scale,
            });
        }
        levels
    }

    /// Splits `num_features` over the levels in proportion to each level's area.
    ///
    /// The budgets always sum to `num_features` when there is at least one level.
    pub(crate) fn level_budgets(&self, levels: usize) -> Vec<usize> {
        if levels == 0 {
            return vec![];
        }
        let factor = 1.0 / (self.scale_factor as f64).powi(2);
        let first = if (1.0 - factor).abs() < 1e-9 {
            self.num_features as f64 / levels as f64
        } else {
            self.num_features as f64 * (1.0 - factor) / (1.0 - factor.powi(levels as i32))
        };
        let mut remaining = self.num_features;
        let mut budgets = Vec::with_capacity(levels);
        for octave in 0..levels - 1 {
            let budget = ((first * factor.powi(octave as i32)).round() as usize).min(remaining);
            remaining -= budget;
            budgets.push(budget);
        }
        budgets.push(remaining);
        budgets
    }
}
