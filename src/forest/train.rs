//! Random-forest training: bootstrap bagging with per-node feature
//! subsampling and binned Gini split search.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use thiserror::Error;

use super::ClassifierTrainer;
use super::model::{ForestModel, Tree, TreeNode};

/// Errors that may occur while fitting a classifier.
#[derive(Debug, Error)]
pub enum TrainError {
    #[error("empty training set")]
    EmptyDataset,
    #[error("mismatched training inputs/labels ({x} rows, {y} labels)")]
    LengthMismatch { x: usize, y: usize },
    #[error("inconsistent feature row length at row {row}")]
    InconsistentRow { row: usize },
    #[error("need at least 2 classes, got {0}")]
    TooFewClasses(usize),
    #[error("invalid branching factor {mtry} for {features} features")]
    InvalidMtry { mtry: usize, features: usize },
    #[error("{features} features exceed the supported maximum")]
    TooManyFeatures { features: usize },
}

/// Seeded random-forest trainer.
#[derive(Debug, Clone)]
pub struct ForestTrainer {
    /// Number of bootstrap trees.
    pub n_trees: usize,
    /// Minimum samples per leaf.
    pub min_leaf: usize,
    /// Maximum tree depth.
    pub max_depth: usize,
    /// Number of histogram bins used for split search.
    pub bins: usize,
    /// Seed for bootstrap and feature subsampling.
    pub seed: u64,
}

impl Default for ForestTrainer {
    fn default() -> Self {
        Self {
            n_trees: 500,
            min_leaf: 1,
            max_depth: 24,
            bins: 32,
            seed: 42,
        }
    }
}

impl ClassifierTrainer for ForestTrainer {
    type Model = ForestModel;

    fn fit(
        &self,
        x: &[Vec<f32>],
        y: &[usize],
        classes: &[String],
        mtry: usize,
    ) -> Result<ForestModel, TrainError> {
        if x.is_empty() {
            return Err(TrainError::EmptyDataset);
        }
        if x.len() != y.len() {
            return Err(TrainError::LengthMismatch {
                x: x.len(),
                y: y.len(),
            });
        }
        if classes.len() < 2 {
            return Err(TrainError::TooFewClasses(classes.len()));
        }
        let feature_len = x[0].len();
        for (row, features) in x.iter().enumerate() {
            if features.len() != feature_len {
                return Err(TrainError::InconsistentRow { row });
            }
        }
        if feature_len > u16::MAX as usize {
            return Err(TrainError::TooManyFeatures {
                features: feature_len,
            });
        }
        if mtry == 0 || mtry > feature_len {
            return Err(TrainError::InvalidMtry {
                mtry,
                features: feature_len,
            });
        }

        let n = x.len();
        let n_classes = classes.len();
        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut trees = Vec::with_capacity(self.n_trees.max(1));
        for _ in 0..self.n_trees.max(1) {
            let sample: Vec<usize> = (0..n).map(|_| rng.random_range(0..n)).collect();
            let mut nodes = Vec::new();
            self.grow_node(
                x,
                y,
                n_classes,
                feature_len,
                mtry,
                &mut nodes,
                sample,
                0,
                &mut rng,
            );
            trees.push(Tree { nodes });
        }

        Ok(ForestModel {
            model_version: 1,
            classes: classes.to_vec(),
            feature_len,
            mtry,
            trees,
        })
    }
}

#[derive(Debug, Clone, Copy)]
struct SplitCandidate {
    feature_index: usize,
    threshold: f32,
    score: f64,
}

impl ForestTrainer {
    #[allow(clippy::too_many_arguments)]
    fn grow_node(
        &self,
        x: &[Vec<f32>],
        y: &[usize],
        n_classes: usize,
        feature_len: usize,
        mtry: usize,
        nodes: &mut Vec<TreeNode>,
        indices: Vec<usize>,
        depth: usize,
        rng: &mut StdRng,
    ) -> u32 {
        let counts = class_counts(y, &indices, n_classes);
        let min_leaf = self.min_leaf.max(1);
        let pure = counts.iter().filter(|&&count| count > 0).count() <= 1;
        if pure || depth >= self.max_depth || indices.len() < min_leaf * 2 {
            return push_leaf(nodes, &counts);
        }

        let mut features: Vec<usize> = (0..feature_len).collect();
        features.shuffle(rng);
        features.truncate(mtry);

        let mut best: Option<SplitCandidate> = None;
        for &feature in &features {
            if let Some(candidate) =
                best_split_for_feature(x, y, &indices, feature, n_classes, self.bins)
            {
                if best.is_none_or(|b| candidate.score < b.score) {
                    best = Some(candidate);
                }
            }
        }
        let Some(split) = best else {
            return push_leaf(nodes, &counts);
        };

        let mut left_indices = Vec::new();
        let mut right_indices = Vec::new();
        for &idx in &indices {
            let value = x[idx][split.feature_index];
            if value <= split.threshold {
                left_indices.push(idx);
            } else {
                // NaN compares false and lands right, matching prediction.
                right_indices.push(idx);
            }
        }
        if left_indices.len() < min_leaf || right_indices.len() < min_leaf {
            return push_leaf(nodes, &counts);
        }

        let node_idx = nodes.len();
        nodes.push(TreeNode::Split {
            feature_index: split.feature_index as u16,
            threshold: split.threshold,
            left: 0,
            right: 0,
        });
        let left = self.grow_node(
            x,
            y,
            n_classes,
            feature_len,
            mtry,
            nodes,
            left_indices,
            depth + 1,
            rng,
        );
        let right = self.grow_node(
            x,
            y,
            n_classes,
            feature_len,
            mtry,
            nodes,
            right_indices,
            depth + 1,
            rng,
        );
        if let TreeNode::Split {
            left: left_slot,
            right: right_slot,
            ..
        } = &mut nodes[node_idx]
        {
            *left_slot = left;
            *right_slot = right;
        }
        node_idx as u32
    }
}

fn class_counts(y: &[usize], indices: &[usize], n_classes: usize) -> Vec<u32> {
    let mut counts = vec![0u32; n_classes];
    for &idx in indices {
        if y[idx] < n_classes {
            counts[y[idx]] += 1;
        }
    }
    counts
}

fn push_leaf(nodes: &mut Vec<TreeNode>, counts: &[u32]) -> u32 {
    let mut best_class = 0usize;
    let mut best_count = 0u32;
    for (class, &count) in counts.iter().enumerate() {
        if count > best_count {
            best_count = count;
            best_class = class;
        }
    }
    nodes.push(TreeNode::Leaf {
        class_index: best_class as u16,
    });
    (nodes.len() - 1) as u32
}

fn best_split_for_feature(
    x: &[Vec<f32>],
    y: &[usize],
    indices: &[usize],
    feature: usize,
    n_classes: usize,
    bins: usize,
) -> Option<SplitCandidate> {
    let mut min = f32::INFINITY;
    let mut max = f32::NEG_INFINITY;
    let mut nan_counts = vec![0u32; n_classes];
    for &idx in indices {
        let value = x[idx][feature];
        if value.is_finite() {
            min = min.min(value);
            max = max.max(value);
        } else {
            nan_counts[y[idx]] += 1;
        }
    }
    if !min.is_finite() || min == max {
        return None;
    }

    let bins = bins.clamp(2, 256);
    let mut bin_counts = vec![0u32; bins * n_classes];
    for &idx in indices {
        let value = x[idx][feature];
        if !value.is_finite() {
            continue;
        }
        let t = ((value - min) / (max - min)).clamp(0.0, 1.0);
        let bin = (t * (bins - 1) as f32).round() as usize;
        bin_counts[bin * n_classes + y[idx]] += 1;
    }

    let mut totals = nan_counts.clone();
    for bin in 0..bins {
        for class in 0..n_classes {
            totals[class] += bin_counts[bin * n_classes + class];
        }
    }
    let n: u32 = totals.iter().sum();
    if n == 0 {
        return None;
    }

    let mut best: Option<(f64, usize)> = None;
    let mut left = vec![0u32; n_classes];
    for split_bin in 0..bins - 1 {
        for class in 0..n_classes {
            left[class] += bin_counts[split_bin * n_classes + class];
        }
        let left_n: u32 = left.iter().sum();
        let right_n = n - left_n;
        if left_n == 0 || right_n == 0 {
            continue;
        }
        let right: Vec<u32> = totals
            .iter()
            .zip(&left)
            .map(|(total, l)| total - l)
            .collect();
        let score =
            (left_n as f64 * gini(&left) + right_n as f64 * gini(&right)) / n as f64;
        if best.is_none_or(|(best_score, _)| score < best_score) {
            best = Some((score, split_bin));
        }
    }

    best.map(|(score, split_bin)| SplitCandidate {
        feature_index: feature,
        threshold: threshold_for_bin(min, max, split_bin, bins),
        score,
    })
}

fn gini(counts: &[u32]) -> f64 {
    let n: u32 = counts.iter().sum();
    if n == 0 {
        return 0.0;
    }
    let n = n as f64;
    1.0 - counts
        .iter()
        .map(|&count| {
            let p = count as f64 / n;
            p * p
        })
        .sum::<f64>()
}

fn threshold_for_bin(min: f32, max: f32, split_bin: usize, bins: usize) -> f32 {
    let t = ((split_bin + 1) as f32) / bins as f32;
    min + t * (max - min)
}
