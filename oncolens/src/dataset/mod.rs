//! Dataset module for the multi-cancer image collection
//!
//! This module provides functionality for:
//! - Loading the dataset from a class-per-directory layout
//! - Deterministic, stratified train/validation splitting
//! - Class-weight computation for imbalance correction
//! - Data augmentation for training robustness
//! - Burn `Dataset`/`Batcher` integration

pub mod augmentation;
pub mod batcher;
pub mod loader;
pub mod split;
pub mod weights;

// Re-export main types for convenience
pub use augmentation::{AugmentConfig, Augmenter};
pub use batcher::{ScanBatch, ScanBatcher, ScanItem, TrainingSet};
pub use loader::{CancerDataset, DatasetStats, ImageSample};
pub use split::{SplitConfig, TrainValSplit};
pub use weights::balanced_class_weights;
