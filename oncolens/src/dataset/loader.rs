//! Multi-cancer dataset loader
//!
//! Loads the dataset from disk. The directory layout is one subdirectory per
//! class, e.g. `multi_cancer/brain_glioma/*.jpg`. Class indices follow the
//! alphabetical order of the directory names, matching `classes::CLASS_NAMES`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use image::{DynamicImage, ImageReader};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::utils::error::{OncoLensError, Result};

const IMAGE_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "bmp"];

/// A single image sample with its label and metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageSample {
    /// Path to the image file
    pub path: PathBuf,
    /// Class label index (0-15)
    pub label: usize,
    /// Class name (e.g. "lung_scc")
    pub class_name: String,
}

/// Multi-cancer dataset with lazy image loading
#[derive(Debug)]
pub struct CancerDataset {
    /// Root directory of the dataset
    pub root_dir: PathBuf,
    /// All samples in the dataset
    pub samples: Vec<ImageSample>,
    /// Mapping from class name to label index
    pub class_to_idx: HashMap<String, usize>,
    /// Mapping from label index to class name
    pub idx_to_class: HashMap<usize, String>,
}

impl CancerDataset {
    /// Create a new dataset from a directory
    ///
    /// The directory should be structured as:
    /// ```text
    /// root_dir/
    /// ├── brain_glioma/
    /// │   ├── image1.jpg
    /// │   └── image2.jpg
    /// ├── brain_menin/
    /// │   └── ...
    /// └── ...
    /// ```
    pub fn new<P: AsRef<Path>>(root_dir: P) -> Result<Self> {
        let root_dir = root_dir.as_ref().to_path_buf();
        info!("Loading multi-cancer dataset from: {:?}", root_dir);

        if !root_dir.exists() {
            return Err(OncoLensError::PathNotFound(root_dir));
        }

        // Discover class directories; sorted order defines the label indices
        let mut class_dirs: Vec<String> = Vec::new();
        for entry in std::fs::read_dir(&root_dir)? {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                if let Some(name) = entry.file_name().to_str() {
                    class_dirs.push(name.to_string());
                }
            }
        }
        class_dirs.sort();

        if class_dirs.is_empty() {
            return Err(OncoLensError::Dataset(format!(
                "No class directories found in {:?}",
                root_dir
            )));
        }

        info!("Found {} classes", class_dirs.len());

        let class_to_idx: HashMap<String, usize> = class_dirs
            .iter()
            .enumerate()
            .map(|(idx, name)| (name.clone(), idx))
            .collect();

        let idx_to_class: HashMap<usize, String> = class_dirs
            .iter()
            .enumerate()
            .map(|(idx, name)| (idx, name.clone()))
            .collect();

        let mut samples = Vec::new();
        for class_name in &class_dirs {
            let class_dir = root_dir.join(class_name);
            let label = class_to_idx[class_name];
            let before = samples.len();

            for entry in WalkDir::new(&class_dir)
                .min_depth(1)
                .max_depth(1)
                .into_iter()
                .filter_map(|e| e.ok())
            {
                let path = entry.path().to_path_buf();

                if let Some(ext) = path.extension() {
                    let ext = ext.to_string_lossy().to_lowercase();
                    if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
                        samples.push(ImageSample {
                            path,
                            label,
                            class_name: class_name.clone(),
                        });
                    }
                }
            }

            debug!(
                "Class '{}' (label {}): {} samples",
                class_name,
                label,
                samples.len() - before
            );
        }

        info!("Loaded {} total samples", samples.len());

        Ok(Self {
            root_dir,
            samples,
            class_to_idx,
            idx_to_class,
        })
    }

    /// Get the number of samples in the dataset
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Check if the dataset is empty
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Get the number of classes
    pub fn num_classes(&self) -> usize {
        self.class_to_idx.len()
    }

    /// Load an image from disk, converted to RGB and resized to a square
    pub fn load_image(&self, sample: &ImageSample, image_size: u32) -> Result<DynamicImage> {
        let img = ImageReader::open(&sample.path)
            .map_err(|e| OncoLensError::ImageLoad(sample.path.clone(), e.to_string()))?
            .decode()
            .map_err(|e| OncoLensError::ImageLoad(sample.path.clone(), e.to_string()))?;

        Ok(img.resize_exact(image_size, image_size, image::imageops::FilterType::Triangle))
    }

    /// Shuffle the samples in place with a given seed
    pub fn shuffle(&mut self, seed: u64) {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        self.samples.shuffle(&mut rng);
    }

    /// Per-class sample counts, indexed by label
    pub fn class_counts(&self) -> Vec<usize> {
        let mut counts = vec![0usize; self.num_classes()];
        for sample in &self.samples {
            counts[sample.label] += 1;
        }
        counts
    }

    /// Get statistics about the dataset
    pub fn stats(&self) -> DatasetStats {
        DatasetStats {
            total_samples: self.samples.len(),
            num_classes: self.num_classes(),
            class_counts: self.class_counts(),
            class_names: self.idx_to_class.clone(),
        }
    }
}

/// Statistics about the dataset
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetStats {
    pub total_samples: usize,
    pub num_classes: usize,
    pub class_counts: Vec<usize>,
    pub class_names: HashMap<usize, String>,
}

impl DatasetStats {
    /// Print statistics to console
    pub fn print(&self) {
        println!("\nDataset statistics:");
        println!("  Total samples: {}", self.total_samples);
        println!("  Number of classes: {}", self.num_classes);
        println!("\n  Samples per class:");

        let mut sorted: Vec<_> = self.class_names.iter().collect();
        sorted.sort_by_key(|(idx, _)| *idx);

        for (idx, name) in sorted {
            let count = self.class_counts[*idx];
            let pct = if self.total_samples > 0 {
                100.0 * count as f64 / self.total_samples as f64
            } else {
                0.0
            };
            println!("    {:3}. {:20} {:6} ({:>5.1}%)", idx, name, count, pct);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_test_image(path: &Path) {
        let img = image::RgbImage::from_pixel(8, 8, image::Rgb([128, 64, 32]));
        img.save(path).unwrap();
    }

    #[test]
    fn test_load_from_directory() {
        let dir = std::env::temp_dir().join("oncolens_loader_test");
        let _ = std::fs::remove_dir_all(&dir);
        for class in ["brain_glioma", "lung_scc"] {
            let class_dir = dir.join(class);
            std::fs::create_dir_all(&class_dir).unwrap();
            write_test_image(&class_dir.join("a.png"));
            write_test_image(&class_dir.join("b.png"));
        }
        // Non-image files are skipped
        std::fs::write(dir.join("brain_glioma").join("notes.txt"), "x").unwrap();

        let dataset = CancerDataset::new(&dir).unwrap();
        assert_eq!(dataset.num_classes(), 2);
        assert_eq!(dataset.len(), 4);
        assert_eq!(dataset.class_to_idx["brain_glioma"], 0);
        assert_eq!(dataset.class_to_idx["lung_scc"], 1);
        assert_eq!(dataset.class_counts(), vec![2, 2]);

        let img = dataset.load_image(&dataset.samples[0], 16).unwrap();
        assert_eq!(img.width(), 16);
        assert_eq!(img.height(), 16);

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_missing_directory() {
        let result = CancerDataset::new("/nonexistent/multi_cancer");
        assert!(matches!(result, Err(OncoLensError::PathNotFound(_))));
    }

    #[test]
    fn test_shuffle_is_deterministic() {
        let samples: Vec<ImageSample> = (0..10)
            .map(|i| ImageSample {
                path: PathBuf::from(format!("{}.jpg", i)),
                label: 0,
                class_name: "brain_glioma".to_string(),
            })
            .collect();

        let mut a = CancerDataset {
            root_dir: PathBuf::new(),
            samples: samples.clone(),
            class_to_idx: HashMap::new(),
            idx_to_class: HashMap::new(),
        };
        let mut b = CancerDataset {
            root_dir: PathBuf::new(),
            samples,
            class_to_idx: HashMap::new(),
            idx_to_class: HashMap::new(),
        };

        a.shuffle(123);
        b.shuffle(123);
        assert_eq!(
            a.samples.iter().map(|s| &s.path).collect::<Vec<_>>(),
            b.samples.iter().map(|s| &s.path).collect::<Vec<_>>()
        );
    }
}
