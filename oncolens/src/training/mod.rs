//! Training: weighted supervised training with early stopping.

pub mod supervised;

pub use supervised::run_training;

use burn::config::Config;

/// Configuration for a training run
#[derive(Config, Debug)]
pub struct TrainingConfig {
    /// Directory with one subdirectory per class
    pub data_dir: String,

    /// Directory where model checkpoints are written
    pub output_dir: String,

    /// Number of training epochs
    #[config(default = "10")]
    pub epochs: usize,

    /// Batch size
    #[config(default = "128")]
    pub batch_size: usize,

    /// Learning rate
    #[config(default = "3e-5")]
    pub learning_rate: f64,

    /// Fraction of data held out for validation
    #[config(default = "0.2")]
    pub validation_fraction: f64,

    /// Random seed for splitting, shuffling, and augmentation
    #[config(default = "123")]
    pub seed: u64,

    /// Image size used during training
    #[config(default = "128")]
    pub image_size: usize,

    /// Apply data augmentation to the training set
    #[config(default = "true")]
    pub augmentation: bool,

    /// Label smoothing factor for the cross-entropy loss
    #[config(default = "0.1")]
    pub label_smoothing: f32,

    /// Stop after this many epochs without validation loss improvement
    #[config(default = "5")]
    pub patience: usize,

    /// Optional checkpoint to initialize the model from
    pub pretrained: Option<String>,

    /// Freeze the convolutional backbone so only the head trains
    #[config(default = "false")]
    pub freeze_backbone: bool,
}
