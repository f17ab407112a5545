//! Prediction pipeline
//!
//! Decodes an uploaded image, normalizes it into the tensor shape the model
//! expects, runs a forward pass, and maps the output distribution to a
//! class name, description, and confidence score.

use std::path::Path;
use std::time::{Duration, Instant};

use burn::module::Module;
use burn::record::CompactRecorder;
use burn::tensor::{backend::Backend, Tensor, TensorData};
use image::{imageops::FilterType, DynamicImage};
use serde::{Deserialize, Serialize};

use super::{IMAGENET_MEAN, IMAGENET_STD};
use crate::classes::{class_description, class_name, NUM_CLASSES};
use crate::model::cnn::{CancerClassifier, CancerClassifierConfig};
use crate::utils::error::{OncoLensError, Result};
use crate::INFER_IMAGE_SIZE;

/// Resize an image to the model's serving resolution
fn resize_image(image: &DynamicImage, size: u32) -> DynamicImage {
    image.resize_exact(size, size, FilterType::Lanczos3)
}

/// Normalize an RGB image to a flat CHW vector with ImageNet normalization
fn normalize_image(image: &DynamicImage) -> Vec<f32> {
    let rgb = image.to_rgb8();
    let (width, height) = rgb.dimensions();
    let num_pixels = (width * height) as usize;

    let mut normalized = vec![0.0f32; 3 * num_pixels];
    for (i, pixel) in rgb.pixels().enumerate() {
        normalized[i] = (pixel[0] as f32 / 255.0 - IMAGENET_MEAN[0]) / IMAGENET_STD[0];
        normalized[num_pixels + i] = (pixel[1] as f32 / 255.0 - IMAGENET_MEAN[1]) / IMAGENET_STD[1];
        normalized[2 * num_pixels + i] =
            (pixel[2] as f32 / 255.0 - IMAGENET_MEAN[2]) / IMAGENET_STD[2];
    }
    normalized
}

/// Result of a single prediction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prediction {
    /// Predicted class index
    pub class_index: usize,

    /// Predicted class name
    pub prediction: String,

    /// Human-readable description of the predicted class
    pub description: String,

    /// Confidence as a percentage, rounded to 2 decimals
    pub confidence: f64,

    /// Full probability distribution over all classes
    #[serde(skip)]
    pub probabilities: Vec<f32>,

    /// Inference time in milliseconds
    #[serde(skip)]
    pub inference_time_ms: f64,
}

impl Prediction {
    /// Build a prediction from a probability distribution
    pub fn from_probabilities(probabilities: Vec<f32>, inference_time: Duration) -> Self {
        let (class_index, &max_prob) = probabilities
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
            .unwrap_or((0, &0.0));

        let prediction = class_name(class_index).unwrap_or("unknown").to_string();
        let description = class_description(class_index).unwrap_or("").to_string();
        let confidence = (max_prob as f64 * 100.0 * 100.0).round() / 100.0;

        Self {
            class_index,
            prediction,
            description,
            confidence,
            probabilities,
            inference_time_ms: inference_time.as_secs_f64() * 1000.0,
        }
    }

    /// Top-k (class_index, name, probability) triples, best first
    pub fn top_k(&self, k: usize) -> Vec<(usize, String, f32)> {
        let mut indexed: Vec<(usize, f32)> = self
            .probabilities
            .iter()
            .enumerate()
            .map(|(i, &p)| (i, p))
            .collect();
        indexed.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

        indexed
            .into_iter()
            .take(k)
            .map(|(idx, prob)| {
                let name = class_name(idx).unwrap_or("unknown").to_string();
                (idx, name, prob)
            })
            .collect()
    }
}

/// Predictor holding a loaded model
///
/// Load once at startup; `predict_*` calls are cheap to run repeatedly.
pub struct Predictor<B: Backend> {
    model: CancerClassifier<B>,
    device: B::Device,
    image_size: u32,
}

impl<B: Backend> Predictor<B> {
    /// Load a trained model from a checkpoint file
    pub fn load<P: AsRef<Path>>(model_path: P, device: B::Device) -> Result<Self> {
        let model_path = model_path.as_ref();

        let config = CancerClassifierConfig::new();
        let model = CancerClassifier::<B>::new(&config, &device);
        let model = model
            .load_file(model_path, &CompactRecorder::new(), &device)
            .map_err(|e| {
                OncoLensError::Model(format!("Failed to load model from {:?}: {:?}", model_path, e))
            })?;

        Ok(Self {
            model,
            device,
            image_size: INFER_IMAGE_SIZE as u32,
        })
    }

    /// Create a predictor around an already-built model (used in training
    /// evaluation and tests)
    pub fn from_model(model: CancerClassifier<B>, device: B::Device) -> Self {
        Self {
            model,
            device,
            image_size: INFER_IMAGE_SIZE as u32,
        }
    }

    /// Override the serving resolution
    pub fn with_image_size(mut self, size: u32) -> Self {
        self.image_size = size;
        self
    }

    /// Preprocess a decoded image into a flat normalized CHW vector
    pub fn preprocess(&self, image: &DynamicImage) -> Vec<f32> {
        let resized = resize_image(image, self.image_size);
        normalize_image(&resized)
    }

    /// Predict from raw uploaded bytes
    ///
    /// Grayscale sources are converted to RGB as part of decoding.
    pub fn predict_bytes(&self, bytes: &[u8]) -> Result<Prediction> {
        if bytes.is_empty() {
            return Err(OncoLensError::InvalidInput("No image data provided".to_string()));
        }

        let image = image::load_from_memory(bytes)
            .map_err(|e| OncoLensError::ImageDecode(e.to_string()))?;
        self.predict_image(&image)
    }

    /// Predict from a decoded image
    pub fn predict_image(&self, image: &DynamicImage) -> Result<Prediction> {
        let data = self.preprocess(image);
        let size = self.image_size as usize;

        let tensor = Tensor::<B, 4>::from_floats(
            TensorData::new(data, [1, 3, size, size]),
            &self.device,
        );

        let start = Instant::now();
        let probs = self.model.forward_softmax(tensor);
        let elapsed = start.elapsed();

        let probabilities: Vec<f32> = probs
            .into_data()
            .to_vec()
            .map_err(|e| OncoLensError::Inference(format!("Failed to read output tensor: {:?}", e)))?;

        if probabilities.len() != NUM_CLASSES {
            return Err(OncoLensError::Inference(format!(
                "Model produced {} outputs, expected {}",
                probabilities.len(),
                NUM_CLASSES
            )));
        }

        Ok(Prediction::from_probabilities(probabilities, elapsed))
    }

    /// Predict from an image file on disk
    pub fn predict_file<P: AsRef<Path>>(&self, path: P) -> Result<Prediction> {
        let path = path.as_ref();
        let image = image::open(path)
            .map_err(|e| OncoLensError::ImageLoad(path.to_path_buf(), e.to_string()))?;
        self.predict_image(&image)
    }
}
