//! Evaluation metrics for classification models.

/// Fraction of predictions matching the truth. Empty input yields `0.0`.
pub fn accuracy(truth: &[usize], predicted: &[usize]) -> f32 {
    if truth.is_empty() || truth.len() != predicted.len() {
        return 0.0;
    }
    let correct = truth
        .iter()
        .zip(predicted)
        .filter(|(t, p)| t == p)
        .count();
    correct as f32 / truth.len() as f32
}

/// Arithmetic mean. Empty input yields `0.0`.
pub fn mean(values: &[f32]) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f32>() / values.len() as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accuracy_counts_matches() {
        assert_eq!(accuracy(&[0, 1, 1, 0], &[0, 1, 0, 0]), 0.75);
    }

    #[test]
    fn accuracy_of_empty_or_mismatched_input_is_zero() {
        assert_eq!(accuracy(&[], &[]), 0.0);
        assert_eq!(accuracy(&[0], &[0, 1]), 0.0);
    }

    #[test]
    fn mean_of_values() {
        assert_eq!(mean(&[0.5, 1.0, 1.5]), 1.0);
        assert_eq!(mean(&[]), 0.0);
    }
}
