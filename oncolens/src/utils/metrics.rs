//! Evaluation metrics
//!
//! Confusion matrix and per-class precision/recall for validation reporting.
//! Per-class recall is the number that matters on imbalanced medical data.

use serde::{Deserialize, Serialize};

/// Confusion matrix: rows are ground truth, columns are predictions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    /// Number of classes
    pub num_classes: usize,
    /// Flattened matrix, `matrix[truth * num_classes + pred]`
    pub matrix: Vec<usize>,
}

impl ConfusionMatrix {
    /// Create an empty confusion matrix
    pub fn new(num_classes: usize) -> Self {
        Self {
            num_classes,
            matrix: vec![0; num_classes * num_classes],
        }
    }

    /// Build from parallel prediction/ground-truth slices
    pub fn from_predictions(predictions: &[usize], ground_truth: &[usize], num_classes: usize) -> Self {
        assert_eq!(predictions.len(), ground_truth.len());

        let mut cm = Self::new(num_classes);
        for (&pred, &truth) in predictions.iter().zip(ground_truth.iter()) {
            cm.record(truth, pred);
        }
        cm
    }

    /// Record a single observation
    pub fn record(&mut self, truth: usize, pred: usize) {
        if truth < self.num_classes && pred < self.num_classes {
            self.matrix[truth * self.num_classes + pred] += 1;
        }
    }

    /// Get a cell value
    pub fn get(&self, truth: usize, pred: usize) -> usize {
        self.matrix[truth * self.num_classes + pred]
    }

    /// Total number of recorded observations
    pub fn total(&self) -> usize {
        self.matrix.iter().sum()
    }

    /// Overall accuracy (trace / total)
    pub fn accuracy(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        let correct: usize = (0..self.num_classes).map(|i| self.get(i, i)).sum();
        correct as f64 / total as f64
    }

    /// Number of ground-truth samples for a class
    pub fn support(&self, class: usize) -> usize {
        (0..self.num_classes).map(|p| self.get(class, p)).sum()
    }

    /// Per-class recall: TP / (TP + FN). None if the class has no samples.
    pub fn recall(&self, class: usize) -> Option<f64> {
        let support = self.support(class);
        if support == 0 {
            return None;
        }
        Some(self.get(class, class) as f64 / support as f64)
    }

    /// Per-class precision: TP / (TP + FP). None if the class was never predicted.
    pub fn precision(&self, class: usize) -> Option<f64> {
        let predicted: usize = (0..self.num_classes).map(|t| self.get(t, class)).sum();
        if predicted == 0 {
            return None;
        }
        Some(self.get(class, class) as f64 / predicted as f64)
    }

    /// Macro-averaged recall over classes with at least one sample
    pub fn macro_recall(&self) -> f64 {
        let recalls: Vec<f64> = (0..self.num_classes).filter_map(|c| self.recall(c)).collect();
        if recalls.is_empty() {
            return 0.0;
        }
        recalls.iter().sum::<f64>() / recalls.len() as f64
    }

    /// Render a per-class summary table
    pub fn summary(&self, class_names: &[&str]) -> String {
        let mut out = String::new();
        out.push_str(&format!(
            "{:<20} {:>8} {:>10} {:>10}\n",
            "class", "support", "recall", "precision"
        ));

        for class in 0..self.num_classes {
            let name = class_names.get(class).copied().unwrap_or("?");
            let recall = self
                .recall(class)
                .map(|r| format!("{:.3}", r))
                .unwrap_or_else(|| "-".to_string());
            let precision = self
                .precision(class)
                .map(|p| format!("{:.3}", p))
                .unwrap_or_else(|| "-".to_string());

            out.push_str(&format!(
                "{:<20} {:>8} {:>10} {:>10}\n",
                name,
                self.support(class),
                recall,
                precision
            ));
        }

        out.push_str(&format!(
            "\naccuracy: {:.4}  macro recall: {:.4}\n",
            self.accuracy(),
            self.macro_recall()
        ));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_perfect_predictions() {
        let preds = vec![0, 1, 2, 0, 1];
        let truth = vec![0, 1, 2, 0, 1];
        let cm = ConfusionMatrix::from_predictions(&preds, &truth, 3);

        assert_eq!(cm.accuracy(), 1.0);
        assert_eq!(cm.recall(0), Some(1.0));
        assert_eq!(cm.precision(1), Some(1.0));
    }

    #[test]
    fn test_misclassification() {
        // Class 0 predicted as 1 once
        let preds = vec![0, 1, 1];
        let truth = vec![0, 0, 1];
        let cm = ConfusionMatrix::from_predictions(&preds, &truth, 2);

        assert_eq!(cm.get(0, 1), 1);
        assert_eq!(cm.recall(0), Some(0.5));
        assert_eq!(cm.precision(1), Some(0.5));
        assert!((cm.accuracy() - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_class() {
        let preds = vec![0, 0];
        let truth = vec![0, 0];
        let cm = ConfusionMatrix::from_predictions(&preds, &truth, 3);

        assert_eq!(cm.recall(2), None);
        assert_eq!(cm.precision(2), None);
        assert_eq!(cm.macro_recall(), 1.0);
    }

    #[test]
    fn test_summary_renders_all_classes() {
        let cm = ConfusionMatrix::from_predictions(&[0, 1], &[0, 1], 2);
        let summary = cm.summary(&["benign", "malignant"]);
        assert!(summary.contains("benign"));
        assert!(summary.contains("malignant"));
    }
}
