//! Inference: image preprocessing and prediction.

pub mod predictor;

pub use predictor::{Prediction, Predictor};

/// ImageNet normalization mean values (RGB)
pub const IMAGENET_MEAN: [f32; 3] = [0.485, 0.456, 0.406];
/// ImageNet normalization std values (RGB)
pub const IMAGENET_STD: [f32; 3] = [0.229, 0.224, 0.225];
