//! # OncoLens Multi-Cancer Classifier
//!
//! A Rust library for classifying medical images (brain, breast, cervix,
//! colon, kidney, lung) into 16 tissue/tumor categories using the Burn
//! framework.
//!
//! ## Modules
//!
//! - `classes`: The fixed 16-class taxonomy with descriptions
//! - `dataset`: Data loading, augmentation, splitting, and class weights
//! - `model`: CNN backbone + classification head built with Burn
//! - `training`: Weighted training loop with early stopping
//! - `inference`: Image preprocessing and the `Predictor`
//! - `utils`: Logging, errors, and evaluation metrics
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use oncolens::dataset::CancerDataset;
//! use oncolens::training::{run_training, TrainingConfig};
//! use oncolens::backend::TrainingBackend;
//!
//! let config = TrainingConfig::new("data/multi_cancer", "output/models");
//! run_training::<TrainingBackend>(&config)?;
//! ```

pub mod backend;
pub mod classes;
pub mod dataset;
pub mod inference;
pub mod model;
pub mod training;
pub mod utils;

// Re-export commonly used items for convenience
pub use classes::{class_description, class_index, class_name, CLASS_NAMES, NUM_CLASSES};
pub use dataset::loader::CancerDataset;
pub use dataset::split::{SplitConfig, TrainValSplit};
pub use dataset::{ScanBatch, ScanBatcher, ScanItem, TrainingSet};
pub use inference::predictor::{Prediction, Predictor};
pub use model::cnn::{CancerClassifier, CancerClassifierConfig};
pub use training::TrainingConfig;
pub use utils::error::{OncoLensError, Result};
pub use utils::metrics::ConfusionMatrix;

/// Image size the model is trained at
pub const TRAIN_IMAGE_SIZE: usize = 128;

/// Image size used at serving time (the backbone is fully convolutional,
/// so the two may differ)
pub const INFER_IMAGE_SIZE: usize = 256;

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
