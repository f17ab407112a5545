//! OncoLens command-line interface
//!
//! Entry point for training the multi-cancer classifier, running inference
//! on single images, and inspecting datasets.

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;

use oncolens::backend::{backend_name, default_device, DefaultBackend, TrainingBackend};
use oncolens::dataset::loader::CancerDataset;
use oncolens::inference::Predictor;
use oncolens::training::{run_training, TrainingConfig};
use oncolens::utils::logging::{init_logging, LogConfig};

/// Multi-cancer image classification with Burn
#[derive(Parser, Debug)]
#[command(name = "oncolens")]
#[command(version)]
#[command(about = "Multi-cancer image classification with Burn", long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, default_value = "false")]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Train the classifier on a labeled image directory
    Train {
        /// Path to the dataset directory (one subdirectory per class)
        #[arg(short, long, default_value = "data/multi_cancer")]
        data_dir: String,

        /// Output directory for model checkpoints
        #[arg(short, long, default_value = "output/models")]
        output_dir: String,

        /// Number of training epochs
        #[arg(short, long, default_value = "10")]
        epochs: usize,

        /// Batch size
        #[arg(short, long, default_value = "128")]
        batch_size: usize,

        /// Learning rate
        #[arg(short, long, default_value = "0.00003")]
        learning_rate: f64,

        /// Fraction of data held out for validation
        #[arg(long, default_value = "0.2")]
        validation_fraction: f64,

        /// Random seed for reproducibility
        #[arg(long, default_value = "123")]
        seed: u64,

        /// Image size used during training
        #[arg(long, default_value = "128")]
        image_size: usize,

        /// Disable data augmentation
        #[arg(long, default_value = "false")]
        no_augmentation: bool,

        /// Early stopping patience (epochs without validation improvement)
        #[arg(long, default_value = "5")]
        patience: usize,

        /// Checkpoint to initialize the model from
        #[arg(long)]
        pretrained: Option<String>,

        /// Freeze the backbone so only the classification head trains
        #[arg(long, default_value = "false")]
        freeze_backbone: bool,
    },

    /// Classify a single image
    Infer {
        /// Path to the input image
        #[arg(short, long)]
        input: String,

        /// Path to a trained model checkpoint
        #[arg(short, long)]
        model: String,

        /// Show the top-k most likely classes
        #[arg(long, default_value = "3")]
        top_k: usize,
    },

    /// Print dataset statistics
    Stats {
        /// Path to the dataset directory
        #[arg(short, long, default_value = "data/multi_cancer")]
        data_dir: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_config = if cli.verbose {
        LogConfig::verbose()
    } else {
        LogConfig::default()
    };
    init_logging(&log_config).map_err(|e| anyhow::anyhow!("Failed to init logging: {}", e))?;

    match cli.command {
        Commands::Train {
            data_dir,
            output_dir,
            epochs,
            batch_size,
            learning_rate,
            validation_fraction,
            seed,
            image_size,
            no_augmentation,
            patience,
            pretrained,
            freeze_backbone,
        } => {
            println!("{}", "OncoLens Training".green().bold());
            println!("  Backend: {}", backend_name());
            println!();

            let mut config = TrainingConfig::new(data_dir, output_dir)
                .with_epochs(epochs)
                .with_batch_size(batch_size)
                .with_learning_rate(learning_rate)
                .with_validation_fraction(validation_fraction)
                .with_seed(seed)
                .with_image_size(image_size)
                .with_augmentation(!no_augmentation)
                .with_patience(patience)
                .with_freeze_backbone(freeze_backbone);
            config.pretrained = pretrained;

            run_training::<TrainingBackend>(&config)?;
        }

        Commands::Infer {
            input,
            model,
            top_k,
        } => {
            println!("{}", "OncoLens Inference".green().bold());

            let device = default_device();
            let predictor = Predictor::<DefaultBackend>::load(&model, device)?;
            let result = predictor.predict_file(&input)?;

            println!();
            println!("  Image:      {}", input);
            println!(
                "  Prediction: {} ({:.2}%)",
                result.prediction.cyan().bold(),
                result.confidence
            );
            println!("  Details:    {}", result.description);
            println!("  Time:       {:.1} ms", result.inference_time_ms);

            if top_k > 1 {
                println!();
                println!("  Top {} classes:", top_k);
                for (_, name, prob) in result.top_k(top_k) {
                    println!("    {:20} {:.2}%", name, prob as f64 * 100.0);
                }
            }
        }

        Commands::Stats { data_dir } => {
            let dataset = CancerDataset::new(&data_dir)?;
            dataset.stats().print();
        }
    }

    Ok(())
}
