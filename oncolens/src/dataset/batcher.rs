//! Burn dataset integration
//!
//! Implements Burn's `Dataset` trait and a `Batcher` that assembles CHW
//! image tensors with ImageNet normalization.

use burn::data::dataloader::batcher::Batcher;
use burn::data::dataset::Dataset;
use burn::prelude::*;
use image::DynamicImage;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::dataset::augmentation::Augmenter;
use crate::dataset::loader::ImageSample;
use crate::inference::{IMAGENET_MEAN, IMAGENET_STD};
use crate::utils::error::{OncoLensError, Result};

/// A single sample ready for batching
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ScanItem {
    /// Image data as flattened CHW float array [3 * H * W], range [0, 1]
    pub image: Vec<f32>,
    /// Class label (0-15)
    pub label: usize,
    /// Image path (for debugging/logging)
    pub path: String,
}

impl ScanItem {
    /// Convert a decoded RGB image into [0, 1] CHW floats
    pub fn from_image(img: &DynamicImage, label: usize, path: String) -> Self {
        let rgb = img.to_rgb8();
        let (width, height) = (rgb.width() as usize, rgb.height() as usize);
        let num_pixels = width * height;

        let mut image = vec![0.0f32; 3 * num_pixels];
        for (i, pixel) in rgb.pixels().enumerate() {
            image[i] = pixel[0] as f32 / 255.0;
            image[num_pixels + i] = pixel[1] as f32 / 255.0;
            image[2 * num_pixels + i] = pixel[2] as f32 / 255.0;
        }

        Self { image, label, path }
    }
}

/// Training/validation set over image files
///
/// Images are loaded on demand. When an augmenter is attached, each access
/// applies a randomized augmentation chain; the per-index RNG seed keeps the
/// dataset deterministic for a fixed base seed.
#[derive(Debug, Clone)]
pub struct TrainingSet {
    samples: Vec<ImageSample>,
    image_size: u32,
    augmenter: Option<Augmenter>,
    seed: u64,
}

impl TrainingSet {
    /// Plain dataset: resize only, no augmentation (use for validation)
    pub fn new(samples: Vec<ImageSample>, image_size: u32) -> Self {
        Self {
            samples,
            image_size,
            augmenter: None,
            seed: 0,
        }
    }

    /// Dataset with augmentation applied on every access
    pub fn with_augmentation(samples: Vec<ImageSample>, image_size: u32, seed: u64) -> Self {
        Self {
            samples,
            image_size,
            augmenter: Some(Augmenter::new(image_size)),
            seed,
        }
    }

    /// Per-class sample counts (for class-weight computation)
    pub fn class_counts(&self, num_classes: usize) -> Vec<usize> {
        let mut counts = vec![0usize; num_classes];
        for sample in &self.samples {
            if sample.label < num_classes {
                counts[sample.label] += 1;
            }
        }
        counts
    }

    fn load(&self, sample: &ImageSample, index: usize) -> Result<ScanItem> {
        let img = image::open(&sample.path)
            .map_err(|e| OncoLensError::ImageLoad(sample.path.clone(), e.to_string()))?;

        let img = match &self.augmenter {
            Some(augmenter) => {
                let mut rng = ChaCha8Rng::seed_from_u64(self.seed.wrapping_add(index as u64));
                augmenter.apply(img, &mut rng)
            }
            None => img.resize_exact(
                self.image_size,
                self.image_size,
                image::imageops::FilterType::Triangle,
            ),
        };

        Ok(ScanItem::from_image(
            &img,
            sample.label,
            sample.path.to_string_lossy().to_string(),
        ))
    }
}

impl Dataset<ScanItem> for TrainingSet {
    fn get(&self, index: usize) -> Option<ScanItem> {
        let sample = self.samples.get(index)?;
        self.load(sample, index).ok()
    }

    fn len(&self) -> usize {
        self.samples.len()
    }
}

/// A batch of images for training or evaluation
#[derive(Clone, Debug)]
pub struct ScanBatch<B: Backend> {
    /// Images with shape [batch_size, 3, height, width]
    pub images: Tensor<B, 4>,
    /// Labels with shape [batch_size]
    pub targets: Tensor<B, 1, Int>,
}

/// Batcher that assembles normalized image tensors
#[derive(Clone, Debug)]
pub struct ScanBatcher<B: Backend> {
    device: B::Device,
    image_size: usize,
}

impl<B: Backend> ScanBatcher<B> {
    pub fn new(device: B::Device, image_size: usize) -> Self {
        Self { device, image_size }
    }
}

impl<B: Backend> Batcher<B, ScanItem, ScanBatch<B>> for ScanBatcher<B> {
    fn batch(&self, items: Vec<ScanItem>, _device: &B::Device) -> ScanBatch<B> {
        let batch_size = items.len();
        let (height, width) = (self.image_size, self.image_size);

        let images_data: Vec<f32> = items.iter().flat_map(|item| item.image.clone()).collect();
        let images = Tensor::<B, 4>::from_floats(
            TensorData::new(images_data, [batch_size, 3, height, width]),
            &self.device,
        );

        // ImageNet normalization: (x - mean) / std
        let mean = Tensor::<B, 4>::from_floats(
            TensorData::new(IMAGENET_MEAN.to_vec(), [1, 3, 1, 1]),
            &self.device,
        );
        let std = Tensor::<B, 4>::from_floats(
            TensorData::new(IMAGENET_STD.to_vec(), [1, 3, 1, 1]),
            &self.device,
        );
        let images = (images - mean) / std;

        let targets_data: Vec<i64> = items.iter().map(|item| item.label as i64).collect();
        let targets =
            Tensor::<B, 1, Int>::from_data(TensorData::new(targets_data, [batch_size]), &self.device);

        ScanBatch { images, targets }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{default_device, DefaultBackend};

    #[test]
    fn test_scan_item_from_image() {
        let img = DynamicImage::ImageRgb8(image::RgbImage::from_pixel(
            4,
            4,
            image::Rgb([255, 0, 127]),
        ));
        let item = ScanItem::from_image(&img, 3, "scan.png".to_string());

        assert_eq!(item.label, 3);
        assert_eq!(item.image.len(), 3 * 4 * 4);
        // CHW layout: first plane is red
        assert!((item.image[0] - 1.0).abs() < 1e-6);
        assert!(item.image[16].abs() < 1e-6);
        assert!((item.image[32] - 127.0 / 255.0).abs() < 1e-3);
    }

    #[test]
    fn test_batch_shapes() {
        let device = default_device();
        let batcher = ScanBatcher::<DefaultBackend>::new(device.clone(), 8);

        let items: Vec<ScanItem> = (0..4)
            .map(|i| ScanItem {
                image: vec![0.5; 3 * 8 * 8],
                label: i,
                path: format!("{}.png", i),
            })
            .collect();

        let batch = batcher.batch(items, &device);
        assert_eq!(batch.images.dims(), [4, 3, 8, 8]);
        assert_eq!(batch.targets.dims(), [4]);
    }

    #[test]
    fn test_batch_normalization_applied() {
        let device = default_device();
        let batcher = ScanBatcher::<DefaultBackend>::new(device.clone(), 2);

        // All-0.5 image: red channel becomes (0.5 - 0.485) / 0.229
        let items = vec![ScanItem {
            image: vec![0.5; 3 * 2 * 2],
            label: 0,
            path: "x.png".to_string(),
        }];

        let batch = batcher.batch(items, &device);
        let values: Vec<f32> = batch.images.into_data().to_vec().unwrap();
        let expected = (0.5 - 0.485) / 0.229;
        assert!((values[0] - expected).abs() < 1e-5);
    }

    #[test]
    fn test_training_set_len() {
        let set = TrainingSet::new(Vec::new(), 32);
        assert_eq!(set.len(), 0);
        assert!(set.get(0).is_none());
    }
}
