//! Class-weight computation for imbalance correction
//!
//! Implements the "balanced" weighting scheme: each class gets weight
//! `n_samples / (n_classes * count)`, so under-represented classes pull
//! proportionally harder on the loss.

use crate::utils::error::{OncoLensError, Result};

/// Compute balanced class weights from per-class sample counts
///
/// Classes with zero samples get weight 0.0 so they contribute nothing to
/// the loss rather than producing an infinite weight.
pub fn balanced_class_weights(class_counts: &[usize]) -> Result<Vec<f32>> {
    if class_counts.is_empty() {
        return Err(OncoLensError::Dataset(
            "Cannot compute class weights without classes".to_string(),
        ));
    }

    let total: usize = class_counts.iter().sum();
    if total == 0 {
        return Err(OncoLensError::Dataset(
            "Cannot compute class weights from an empty dataset".to_string(),
        ));
    }

    let num_classes = class_counts.len();
    Ok(class_counts
        .iter()
        .map(|&count| {
            if count == 0 {
                0.0
            } else {
                total as f32 / (num_classes as f32 * count as f32)
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_balanced_dataset_gets_unit_weights() {
        let weights = balanced_class_weights(&[100, 100, 100]).unwrap();
        for w in weights {
            assert!((w - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn test_minority_class_weighted_up() {
        let weights = balanced_class_weights(&[300, 100]).unwrap();
        // 400 / (2 * 300) and 400 / (2 * 100)
        assert!((weights[0] - 400.0 / 600.0).abs() < 1e-6);
        assert!((weights[1] - 2.0).abs() < 1e-6);
        assert!(weights[1] > weights[0]);
    }

    #[test]
    fn test_empty_class_gets_zero() {
        let weights = balanced_class_weights(&[10, 0, 10]).unwrap();
        assert_eq!(weights[1], 0.0);
    }

    #[test]
    fn test_empty_inputs_rejected() {
        assert!(balanced_class_weights(&[]).is_err());
        assert!(balanced_class_weights(&[0, 0]).is_err());
    }
}
