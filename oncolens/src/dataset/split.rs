//! Train/validation splitting
//!
//! Deterministic, optionally stratified split. The default 80/20 split with
//! seed 123 reproduces the split the model shipped with was trained on.

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::dataset::loader::ImageSample;
use crate::utils::error::{OncoLensError, Result};

/// Configuration for dataset splitting
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SplitConfig {
    /// Fraction of data held out for validation
    pub validation_fraction: f64,
    /// Random seed for reproducibility
    pub seed: u64,
    /// Split each class separately to preserve class balance
    pub stratified: bool,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            validation_fraction: 0.2,
            seed: 123,
            stratified: true,
        }
    }
}

impl SplitConfig {
    pub fn new(validation_fraction: f64, seed: u64) -> Result<Self> {
        if !(0.0..1.0).contains(&validation_fraction) {
            return Err(OncoLensError::Config(
                "validation_fraction must be in [0.0, 1.0)".to_string(),
            ));
        }
        Ok(Self {
            validation_fraction,
            seed,
            stratified: true,
        })
    }
}

/// A train/validation split of the dataset
#[derive(Debug, Clone)]
pub struct TrainValSplit {
    pub train: Vec<ImageSample>,
    pub validation: Vec<ImageSample>,
    pub config: SplitConfig,
}

impl TrainValSplit {
    /// Split samples according to the configuration
    pub fn from_samples(samples: Vec<ImageSample>, config: SplitConfig) -> Result<Self> {
        if samples.is_empty() {
            return Err(OncoLensError::Dataset("Cannot split an empty dataset".to_string()));
        }

        let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
        let mut train = Vec::new();
        let mut validation = Vec::new();

        if config.stratified {
            let num_classes = samples.iter().map(|s| s.label).max().unwrap_or(0) + 1;
            let mut by_class: Vec<Vec<ImageSample>> = vec![Vec::new(); num_classes];
            for sample in samples {
                by_class[sample.label].push(sample);
            }

            for mut class_samples in by_class {
                class_samples.shuffle(&mut rng);
                let val_count =
                    (class_samples.len() as f64 * config.validation_fraction).round() as usize;
                for (i, sample) in class_samples.into_iter().enumerate() {
                    if i < val_count {
                        validation.push(sample);
                    } else {
                        train.push(sample);
                    }
                }
            }

            // Per-class grouping leaves the pools ordered by label
            train.shuffle(&mut rng);
            validation.shuffle(&mut rng);
        } else {
            let mut shuffled = samples;
            shuffled.shuffle(&mut rng);
            let val_count = (shuffled.len() as f64 * config.validation_fraction).round() as usize;
            validation = shuffled.split_off(shuffled.len() - val_count);
            train = shuffled;
        }

        if train.is_empty() {
            return Err(OncoLensError::Dataset(
                "Split produced an empty training set".to_string(),
            ));
        }

        Ok(Self {
            train,
            validation,
            config,
        })
    }
}
