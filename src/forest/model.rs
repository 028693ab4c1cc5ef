//! Fitted random-forest model.

use serde::{Deserialize, Serialize};

use super::Classifier;

/// One node of a fitted decision tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TreeNode {
    /// Internal split: `feature <= threshold` goes left, anything else
    /// (including `NaN`) goes right.
    Split {
        feature_index: u16,
        threshold: f32,
        left: u32,
        right: u32,
    },
    /// Terminal node voting for a single class.
    Leaf { class_index: u16 },
}

/// A decision tree stored as a node arena rooted at index 0.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tree {
    pub nodes: Vec<TreeNode>,
}

impl Tree {
    /// Class vote for a feature vector.
    pub fn predict_class(&self, features: &[f32]) -> usize {
        let mut idx = 0usize;
        loop {
            match &self.nodes[idx] {
                TreeNode::Leaf { class_index } => return *class_index as usize,
                TreeNode::Split {
                    feature_index,
                    threshold,
                    left,
                    right,
                } => {
                    let value = features
                        .get(*feature_index as usize)
                        .copied()
                        .unwrap_or(f32::NAN);
                    idx = if value <= *threshold {
                        *left as usize
                    } else {
                        *right as usize
                    };
                }
            }
        }
    }
}

/// Bagged decision-tree ensemble over conservation features.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForestModel {
    /// Model format version.
    pub model_version: i64,
    /// Ordered list of class names.
    pub classes: Vec<String>,
    /// Number of `f32` values per feature vector.
    pub feature_len: usize,
    /// Branching factor the forest was grown with.
    pub mtry: usize,
    /// Fitted trees.
    pub trees: Vec<Tree>,
}

impl ForestModel {
    /// Validate structural invariants of the model.
    pub fn validate(&self) -> Result<(), String> {
        if self.classes.len() < 2 {
            return Err("Model must contain at least 2 classes".to_string());
        }
        if self.trees.is_empty() {
            return Err("Model contains no trees".to_string());
        }
        for (tree_idx, tree) in self.trees.iter().enumerate() {
            if tree.nodes.is_empty() {
                return Err(format!("Tree {tree_idx} has no nodes"));
            }
            for (node_idx, node) in tree.nodes.iter().enumerate() {
                match node {
                    TreeNode::Leaf { class_index } => {
                        if *class_index as usize >= self.classes.len() {
                            return Err(format!(
                                "Tree {tree_idx} leaf {node_idx} votes for unknown class {class_index}"
                            ));
                        }
                    }
                    TreeNode::Split {
                        feature_index,
                        left,
                        right,
                        ..
                    } => {
                        if *feature_index as usize >= self.feature_len {
                            return Err(format!(
                                "Tree {tree_idx} node {node_idx} splits on unknown feature {feature_index}"
                            ));
                        }
                        // Children always follow their parent in the arena, so
                        // traversal terminates.
                        for &child in [left, right] {
                            let child = child as usize;
                            if child <= node_idx || child >= tree.nodes.len() {
                                return Err(format!(
                                    "Tree {tree_idx} node {node_idx} has invalid child {child}"
                                ));
                            }
                        }
                    }
                }
            }
        }
        Ok(())
    }

    /// Vote fractions per class for a feature vector.
    pub fn vote_fractions(&self, features: &[f32]) -> Vec<f32> {
        let mut votes = vec![0.0f32; self.classes.len()];
        for tree in &self.trees {
            let class = tree.predict_class(features);
            if class < votes.len() {
                votes[class] += 1.0;
            }
        }
        let total = self.trees.len().max(1) as f32;
        for vote in &mut votes {
            *vote /= total;
        }
        votes
    }
}

impl Classifier for ForestModel {
    fn classes(&self) -> &[String] {
        &self.classes
    }

    fn predict_proba(&self, features: &[f32]) -> Vec<f32> {
        self.vote_fractions(features)
    }
}
