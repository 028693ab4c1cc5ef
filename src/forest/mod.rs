//! Ensemble classifier and the trainer seam used by the tuning pipeline.
//!
//! The tuner and cross-validation code only see the [`ClassifierTrainer`]
//! trait; the bundled random forest is one implementation behind it.

pub mod model;
pub mod train;

pub use model::{ForestModel, Tree, TreeNode};
pub use train::{ForestTrainer, TrainError};

/// A fitted classifier able to score feature vectors.
pub trait Classifier {
    /// Ordered class names emitted by the model.
    fn classes(&self) -> &[String];

    /// Per-class probabilities for one feature vector, aligned with `classes()`.
    fn predict_proba(&self, features: &[f32]) -> Vec<f32>;

    /// Index of the most probable class.
    fn predict_class_index(&self, features: &[f32]) -> usize {
        argmax(&self.predict_proba(features))
    }
}

/// Black-box trainer: fits a classifier for one branching-factor candidate.
pub trait ClassifierTrainer {
    type Model: Classifier;

    /// Fit on a labeled matrix. `mtry` is the number of candidate features
    /// considered at each split.
    fn fit(
        &self,
        x: &[Vec<f32>],
        y: &[usize],
        classes: &[String],
        mtry: usize,
    ) -> Result<Self::Model, TrainError>;
}

pub(crate) fn argmax(values: &[f32]) -> usize {
    let mut best_idx = 0usize;
    let mut best_val = f32::NEG_INFINITY;
    for (idx, &value) in values.iter().enumerate() {
        if value > best_val {
            best_val = value;
            best_idx = idx;
        }
    }
    best_idx
}
