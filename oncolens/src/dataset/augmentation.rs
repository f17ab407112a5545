//! Data augmentation for training
//!
//! Mirrors the augmentations the model was originally tuned with: random
//! horizontal flip, zoom, translation, and contrast/brightness jitter. All
//! ops come from the `image` crate; zoom and translation are expressed as
//! crops followed by a resize back to the target size.

use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView};
use rand::Rng;

/// Augmentation strength configuration
#[derive(Debug, Clone)]
pub struct AugmentConfig {
    /// Probability of a horizontal flip
    pub flip_prob: f64,
    /// Maximum zoom-in factor (0.1 = crop away up to 10% of each side)
    pub max_zoom: f64,
    /// Maximum translation as a fraction of image size
    pub max_translation: f64,
    /// Maximum contrast jitter (0.1 = +/-10%)
    pub max_contrast: f32,
    /// Maximum brightness jitter in 8-bit pixel values
    pub max_brightness: i32,
}

impl Default for AugmentConfig {
    fn default() -> Self {
        Self {
            flip_prob: 0.5,
            max_zoom: 0.1,
            max_translation: 0.1,
            max_contrast: 10.0,
            max_brightness: 10,
        }
    }
}

/// Applies randomized augmentations and resizes to the target size
#[derive(Debug, Clone)]
pub struct Augmenter {
    image_size: u32,
    config: AugmentConfig,
}

impl Augmenter {
    pub fn new(image_size: u32) -> Self {
        Self {
            image_size,
            config: AugmentConfig::default(),
        }
    }

    pub fn with_config(image_size: u32, config: AugmentConfig) -> Self {
        Self { image_size, config }
    }

    /// Apply a random augmentation chain and resize to the target size
    pub fn apply<R: Rng>(&self, img: DynamicImage, rng: &mut R) -> DynamicImage {
        let mut img = img;

        if rng.gen_bool(self.config.flip_prob) {
            img = img.fliph();
        }

        img = self.random_zoom_translate(img, rng);

        if self.config.max_contrast > 0.0 {
            let contrast = rng.gen_range(-self.config.max_contrast..=self.config.max_contrast);
            img = img.adjust_contrast(contrast);
        }

        if self.config.max_brightness > 0 {
            let brightness = rng.gen_range(-self.config.max_brightness..=self.config.max_brightness);
            img = img.brighten(brightness);
        }

        img.resize_exact(self.image_size, self.image_size, FilterType::Triangle)
    }

    /// Resize only, for validation data
    pub fn resize_only(&self, img: DynamicImage) -> DynamicImage {
        img.resize_exact(self.image_size, self.image_size, FilterType::Triangle)
    }

    /// Combined zoom + translation, expressed as an offset crop
    fn random_zoom_translate<R: Rng>(&self, img: DynamicImage, rng: &mut R) -> DynamicImage {
        let (width, height) = img.dimensions();
        if width < 4 || height < 4 {
            return img;
        }

        // Crop inside the image by the translation margin even when the zoom
        // draw is near zero, so the shift is independent of the zoom amount
        let zoom = rng.gen_range(0.0..=self.config.max_zoom);
        let crop_frac = (1.0 - zoom) * (1.0 - self.config.max_translation);
        let crop_w = ((width as f64) * crop_frac).max(1.0) as u32;
        let crop_h = ((height as f64) * crop_frac).max(1.0) as u32;

        let x = if width > crop_w {
            rng.gen_range(0..=width - crop_w)
        } else {
            0
        };
        let y = if height > crop_h {
            rng.gen_range(0..=height - crop_h)
        } else {
            0
        };

        img.crop_imm(x, y, crop_w, crop_h)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn test_image(w: u32, h: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(image::RgbImage::from_fn(w, h, |x, y| {
            image::Rgb([(x % 256) as u8, (y % 256) as u8, 100])
        }))
    }

    #[test]
    fn test_output_size_is_fixed() {
        let augmenter = Augmenter::new(64);
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        for _ in 0..10 {
            let out = augmenter.apply(test_image(100, 80), &mut rng);
            assert_eq!(out.width(), 64);
            assert_eq!(out.height(), 64);
        }
    }

    #[test]
    fn test_deterministic_with_seed() {
        let augmenter = Augmenter::new(32);
        let mut rng_a = ChaCha8Rng::seed_from_u64(7);
        let mut rng_b = ChaCha8Rng::seed_from_u64(7);

        let a = augmenter.apply(test_image(64, 64), &mut rng_a);
        let b = augmenter.apply(test_image(64, 64), &mut rng_b);
        assert_eq!(a.to_rgb8().as_raw(), b.to_rgb8().as_raw());
    }

    #[test]
    fn test_resize_only() {
        let augmenter = Augmenter::new(48);
        let out = augmenter.resize_only(test_image(100, 100));
        assert_eq!(out.width(), 48);
        assert_eq!(out.height(), 48);
    }

    #[test]
    fn test_translation_applies_without_zoom() {
        // With zoom disabled the crop offset must still be able to shift
        let config = AugmentConfig {
            flip_prob: 0.0,
            max_zoom: 0.0,
            max_translation: 0.3,
            max_contrast: 0.0,
            max_brightness: 0,
        };
        let augmenter = Augmenter::with_config(32, config);

        let img = test_image(64, 64);
        let baseline = augmenter.resize_only(img.clone());

        let shifted = (0..8).any(|seed| {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let out = augmenter.apply(img.clone(), &mut rng);
            out.to_rgb8().as_raw() != baseline.to_rgb8().as_raw()
        });
        assert!(shifted);
    }

    #[test]
    fn test_tiny_image_survives() {
        let augmenter = Augmenter::new(16);
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let out = augmenter.apply(test_image(2, 2), &mut rng);
        assert_eq!(out.width(), 16);
    }
}
