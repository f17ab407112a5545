//! CNN model for multi-cancer classification.

pub mod cnn;

pub use cnn::{CancerClassifier, CancerClassifierConfig, MIN_IMAGE_SIZE};
