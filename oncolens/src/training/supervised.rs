//! Supervised training loop
//!
//! A custom training loop built directly on Burn's optimizer API instead of
//! the high-level LearnerBuilder. Handles class imbalance with weighted
//! cross-entropy, tracks validation loss for early stopping, and restores
//! the best model before saving.

use std::path::PathBuf;

use anyhow::Result;
use burn::{
    data::dataloader::batcher::Batcher,
    data::dataset::Dataset,
    module::{AutodiffModule, Module},
    nn::loss::CrossEntropyLossConfig,
    optim::{decay::WeightDecayConfig, AdamConfig, GradientsParams, Optimizer},
    record::CompactRecorder,
    tensor::{
        backend::{AutodiffBackend, Backend},
        ElementConversion,
    },
};
use chrono::Local;
use colored::Colorize;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::info;

use super::TrainingConfig;
use crate::classes::CLASS_NAMES;
use crate::dataset::batcher::{ScanBatcher, TrainingSet};
use crate::dataset::loader::CancerDataset;
use crate::dataset::split::{SplitConfig, TrainValSplit};
use crate::dataset::weights::balanced_class_weights;
use crate::model::cnn::{CancerClassifier, CancerClassifierConfig, MIN_IMAGE_SIZE};
use crate::utils::metrics::ConfusionMatrix;

/// Run a full training session and return the checkpoint path
pub fn run_training<B>(config: &TrainingConfig) -> Result<PathBuf>
where
    B: AutodiffBackend,
{
    if config.image_size < MIN_IMAGE_SIZE {
        anyhow::bail!(
            "image_size must be at least {} (four pooling stages halve the input)",
            MIN_IMAGE_SIZE
        );
    }

    println!("{}", "Initializing training...".green().bold());

    let device = B::Device::default();
    println!("  Device: {:?}", device);

    std::fs::create_dir_all(&config.output_dir)?;

    println!("{}", "Loading dataset...".cyan());
    let dataset = CancerDataset::new(&config.data_dir)?;
    let stats = dataset.stats();
    stats.print();

    if dataset.is_empty() {
        anyhow::bail!("No images found in {:?}", config.data_dir);
    }

    let num_classes = dataset.num_classes();

    println!();
    println!("{}", "Creating train/validation split...".cyan());
    let split_config = SplitConfig::new(config.validation_fraction, config.seed)
        .map_err(|e| anyhow::anyhow!("{}", e))?;
    let split = TrainValSplit::from_samples(dataset.samples.clone(), split_config)?;

    println!("  Training samples:   {}", split.train.len());
    println!("  Validation samples: {}", split.validation.len());

    if split.train.len() < config.batch_size {
        anyhow::bail!(
            "Not enough training data ({}) for batch size {}",
            split.train.len(),
            config.batch_size
        );
    }

    // Class weights from the training pool only
    let train_set = if config.augmentation {
        TrainingSet::with_augmentation(split.train, config.image_size as u32, config.seed)
    } else {
        TrainingSet::new(split.train, config.image_size as u32)
    };
    let val_set = TrainingSet::new(split.validation, config.image_size as u32);

    let class_counts = train_set.class_counts(num_classes);
    let class_weights = balanced_class_weights(&class_counts)?;
    info!("Class weights: {:?}", class_weights);

    let batcher = ScanBatcher::<B>::new(device.clone(), config.image_size);

    println!();
    println!("{}", "Creating model...".cyan());
    let model_config = CancerClassifierConfig::new().with_num_classes(num_classes);
    let mut model = CancerClassifier::<B>::new(&model_config, &device);

    if let Some(pretrained) = &config.pretrained {
        println!("  Loading pre-trained weights from {}", pretrained);
        model = model
            .load_file(pretrained, &CompactRecorder::new(), &device)
            .map_err(|e| anyhow::anyhow!("Failed to load pre-trained model: {:?}", e))?;
    }
    if config.freeze_backbone {
        println!("  Backbone frozen; only the classification head will train");
        model = model.freeze_backbone();
    }

    let loss_fn = CrossEntropyLossConfig::new()
        .with_weights(Some(class_weights.clone()))
        .with_smoothing(Some(config.label_smoothing))
        .init(&device);

    let mut optimizer = AdamConfig::new()
        .with_weight_decay(Some(WeightDecayConfig::new(1e-4f32)))
        .init();

    println!();
    println!("{}", "Training configuration:".cyan().bold());
    println!("  Epochs:          {}", config.epochs);
    println!("  Batch size:      {}", config.batch_size);
    println!("  Learning rate:   {}", config.learning_rate);
    println!("  Image size:      {}", config.image_size);
    println!("  Augmentation:    {}", config.augmentation);
    println!("  Label smoothing: {}", config.label_smoothing);
    println!("  Patience:        {}", config.patience);
    println!();

    println!("{}", "Starting training...".green().bold());
    println!();

    let mut epoch_rng = ChaCha8Rng::seed_from_u64(config.seed);
    let mut best_val_loss = f64::INFINITY;
    let mut best_model: Option<CancerClassifier<B>> = None;
    let mut epochs_without_improvement = 0usize;

    for epoch in 0..config.epochs {
        println!(
            "{}",
            format!("Epoch {}/{}", epoch + 1, config.epochs).yellow().bold()
        );

        let mut epoch_loss = 0.0f64;
        let mut correct = 0usize;
        let mut seen = 0usize;

        let mut indices: Vec<usize> = (0..train_set.len()).collect();
        indices.shuffle(&mut epoch_rng);
        let num_batches = (indices.len() + config.batch_size - 1) / config.batch_size;

        for batch_idx in 0..num_batches {
            let start = batch_idx * config.batch_size;
            let end = (start + config.batch_size).min(indices.len());
            let items: Vec<_> = indices[start..end]
                .iter()
                .filter_map(|&i| train_set.get(i))
                .collect();

            if items.is_empty() {
                continue;
            }

            let batch = batcher.batch(items, &device);

            let output = model.forward(batch.images.clone());
            let loss = loss_fn.forward(output.clone(), batch.targets.clone());

            let loss_value: f64 = loss.clone().into_scalar().elem();
            epoch_loss += loss_value;

            let predictions = output.argmax(1).squeeze::<1>();
            let batch_correct: i64 = predictions
                .equal(batch.targets.clone())
                .int()
                .sum()
                .into_scalar()
                .elem();
            correct += batch_correct as usize;
            seen += batch.targets.dims()[0];

            let grads = loss.backward();
            let grads = GradientsParams::from_grads(grads, &model);
            model = optimizer.step(config.learning_rate, model, grads);

            if (batch_idx + 1) % 10 == 0 || batch_idx == num_batches - 1 {
                let running_acc = 100.0 * correct as f64 / seen.max(1) as f64;
                println!(
                    "  Batch {:>4}/{}: loss = {:.4}, acc = {:.2}%",
                    batch_idx + 1,
                    num_batches,
                    loss_value,
                    running_acc
                );
            }
        }

        let avg_loss = epoch_loss / num_batches.max(1) as f64;
        let train_acc = 100.0 * correct as f64 / seen.max(1) as f64;

        let (val_loss, val_acc, _) =
            evaluate::<B>(&model, &val_set, config.batch_size, config.image_size, config.label_smoothing);

        let improved = val_loss < best_val_loss;
        if improved {
            best_val_loss = val_loss;
            best_model = Some(model.clone());
            epochs_without_improvement = 0;
        } else {
            epochs_without_improvement += 1;
        }

        println!(
            "  {} Loss: {:.4} | Train acc: {:.2}% | Val loss: {:.4} | Val acc: {:.2}%{}",
            "→".cyan(),
            avg_loss,
            train_acc,
            val_loss,
            val_acc,
            if improved {
                " (best)".green().to_string()
            } else {
                String::new()
            }
        );
        println!();

        if epochs_without_improvement >= config.patience {
            println!(
                "{}",
                format!(
                    "Early stopping: no validation improvement for {} epochs",
                    config.patience
                )
                .yellow()
            );
            println!();
            break;
        }
    }

    // Restore the best checkpoint before reporting and saving
    let final_model = best_model.unwrap_or(model);

    println!("{}", "Validation report (best model):".cyan().bold());
    let (_, final_acc, confusion) = evaluate::<B>(
        &final_model,
        &val_set,
        config.batch_size,
        config.image_size,
        config.label_smoothing,
    );
    println!("{}", confusion.summary(&CLASS_NAMES));

    let timestamp = Local::now().format("%Y%m%d_%H%M%S");
    let checkpoint_path =
        PathBuf::from(&config.output_dir).join(format!("cancer_classifier_{}", timestamp));

    println!("{}", "Saving model...".cyan());
    final_model
        .clone()
        .save_file(&checkpoint_path, &CompactRecorder::new())
        .map_err(|e| anyhow::anyhow!("Failed to save model: {:?}", e))?;
    println!("  Saved to: {:?}", checkpoint_path);
    println!();

    println!("{}", "Training complete!".green().bold());
    println!("  Best validation loss: {:.4}", best_val_loss);
    println!("  Validation accuracy:  {:.2}%", final_acc);

    Ok(checkpoint_path)
}

/// Evaluate on the inner (non-autodiff) backend
///
/// Returns average loss, accuracy in percent, and the confusion matrix.
fn evaluate<B: AutodiffBackend>(
    model: &CancerClassifier<B>,
    dataset: &TrainingSet,
    batch_size: usize,
    image_size: usize,
    label_smoothing: f32,
) -> (f64, f64, ConfusionMatrix) {
    let device = <B::InnerBackend as Backend>::Device::default();
    let batcher = ScanBatcher::<B::InnerBackend>::new(device.clone(), image_size);

    let inner_model = model.clone().valid();
    let num_classes = inner_model.num_classes();

    // Unweighted loss for validation so runs stay comparable
    let loss_fn = CrossEntropyLossConfig::new()
        .with_smoothing(Some(label_smoothing))
        .init(&device);

    let len = dataset.len();
    let mut total_loss = 0.0f64;
    let mut num_batches = 0usize;
    let mut correct = 0usize;
    let mut total = 0usize;
    let mut confusion = ConfusionMatrix::new(num_classes);

    for start in (0..len).step_by(batch_size) {
        let end = (start + batch_size).min(len);
        let items: Vec<_> = (start..end).filter_map(|i| dataset.get(i)).collect();

        if items.is_empty() {
            continue;
        }

        let batch = batcher.batch(items, &device);
        let output = inner_model.forward(batch.images);

        let loss = loss_fn.forward(output.clone(), batch.targets.clone());
        total_loss += loss.into_scalar().elem::<f64>();
        num_batches += 1;

        let predictions = output.argmax(1).squeeze::<1>();

        let preds: Vec<i64> = predictions
            .clone()
            .into_data()
            .to_vec()
            .unwrap_or_default();
        let truths: Vec<i64> = batch
            .targets
            .clone()
            .into_data()
            .to_vec()
            .unwrap_or_default();
        for (&pred, &truth) in preds.iter().zip(truths.iter()) {
            confusion.record(truth as usize, pred as usize);
        }

        let batch_correct: i64 = predictions
            .equal(batch.targets)
            .int()
            .sum()
            .into_scalar()
            .elem();
        correct += batch_correct as usize;
        total += end - start;
    }

    let avg_loss = if num_batches == 0 {
        0.0
    } else {
        total_loss / num_batches as f64
    };
    let accuracy = if total == 0 {
        0.0
    } else {
        100.0 * correct as f64 / total as f64
    };

    (avg_loss, accuracy, confusion)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::TrainingBackend;
    use crate::dataset::loader::ImageSample;
    use std::path::Path;

    fn write_test_image(path: &Path, value: u8) {
        let img = image::RgbImage::from_pixel(16, 16, image::Rgb([value, value / 2, value / 3]));
        img.save(path).unwrap();
    }

    fn build_tiny_dataset(dir: &Path) -> Vec<ImageSample> {
        let mut samples = Vec::new();
        for (label, class) in ["breast_benign", "breast_malignant"].iter().enumerate() {
            let class_dir = dir.join(class);
            std::fs::create_dir_all(&class_dir).unwrap();
            for i in 0..4 {
                let path = class_dir.join(format!("{}.png", i));
                write_test_image(&path, (label * 100 + i * 20) as u8 + 30);
                samples.push(ImageSample {
                    path,
                    label,
                    class_name: class.to_string(),
                });
            }
        }
        samples
    }

    #[test]
    fn test_config_defaults() {
        let config = TrainingConfig::new("data".into(), "out".into());
        assert_eq!(config.epochs, 10);
        assert_eq!(config.batch_size, 128);
        assert_eq!(config.seed, 123);
        assert!((config.learning_rate - 3e-5).abs() < 1e-12);
        assert!(config.augmentation);
        assert_eq!(config.patience, 5);
        assert!(config.pretrained.is_none());
    }

    #[test]
    fn test_rejects_tiny_image_size() {
        // The backbone pools four times, so sub-16 inputs cannot train
        let config = TrainingConfig::new("data".into(), "out".into()).with_image_size(8);
        let result = run_training::<TrainingBackend>(&config);

        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("image_size"));
    }

    #[test]
    fn test_evaluate_on_tiny_dataset() {
        let dir = std::env::temp_dir().join("oncolens_eval_test");
        let _ = std::fs::remove_dir_all(&dir);
        let samples = build_tiny_dataset(&dir);

        let device = Default::default();
        let model_config = CancerClassifierConfig::new()
            .with_num_classes(2)
            .with_base_filters(4);
        let model = CancerClassifier::<TrainingBackend>::new(&model_config, &device);

        let val_set = TrainingSet::new(samples, 16);
        let (loss, acc, confusion) = evaluate::<TrainingBackend>(&model, &val_set, 4, 16, 0.1);

        assert!(loss.is_finite());
        assert!((0.0..=100.0).contains(&acc));
        assert_eq!(confusion.total(), 8);

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_single_training_step() {
        // One optimizer step on a tiny batch should leave the loss finite
        let device = Default::default();
        let model_config = CancerClassifierConfig::new()
            .with_num_classes(2)
            .with_base_filters(4);
        let mut model = CancerClassifier::<TrainingBackend>::new(&model_config, &device);

        let batcher = ScanBatcher::<TrainingBackend>::new(device, 16);
        let items: Vec<_> = (0..2)
            .map(|i| crate::dataset::batcher::ScanItem {
                image: vec![0.4 + 0.1 * i as f32; 3 * 16 * 16],
                label: i,
                path: format!("{}.png", i),
            })
            .collect();
        let batch = batcher.batch(items, &Default::default());

        let loss_fn = CrossEntropyLossConfig::new()
            .with_smoothing(Some(0.1))
            .init(&Default::default());
        let mut optimizer = AdamConfig::new().init();

        let output = model.forward(batch.images.clone());
        let loss = loss_fn.forward(output, batch.targets);
        let loss_value: f64 = loss.clone().into_scalar().elem();

        let grads = GradientsParams::from_grads(loss.backward(), &model);
        model = optimizer.step(1e-3, model, grads);

        assert!(loss_value.is_finite());
        assert_eq!(model.num_classes(), 2);
    }
}
