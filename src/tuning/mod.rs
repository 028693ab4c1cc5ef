//! Two-round grid search over the ensemble branching factor.
//!
//! Round 1 scans a coarse grid across the full feature-count range; round 2
//! refines between the two best coarse candidates. Every grid value is scored
//! by repeated stratified k-fold cross-validation through the
//! [`ClassifierTrainer`] seam.

pub mod folds;

use ordered_float::OrderedFloat;
use rand::SeedableRng;
use rand::rngs::StdRng;
use thiserror::Error;

use crate::dataset::view::TrainingView;
use crate::forest::{Classifier, ClassifierTrainer, TrainError};
use crate::metrics;
use folds::{fold_partition, stratified_folds};

/// Search parameters. Defaults: an 11-point coarse grid, a 5-point
/// refinement, 5 folds, 10 repeats.
#[derive(Debug, Clone)]
pub struct TuneOptions {
    /// Round-1 grid size (one slot is taken by `round(sqrt(F))`).
    pub first_grid: usize,
    /// Round-2 grid size.
    pub second_grid: usize,
    /// Cross-validation folds per repeat.
    pub folds: usize,
    /// Cross-validation repeats.
    pub repeats: usize,
    /// Seed for fold assignment.
    pub seed: u64,
}

impl Default for TuneOptions {
    fn default() -> Self {
        Self {
            first_grid: 11,
            second_grid: 5,
            folds: 5,
            repeats: 10,
            seed: 42,
        }
    }
}

/// Cross-validated accuracy for one branching-factor candidate.
#[derive(Debug, Clone)]
pub struct CandidateResult {
    pub mtry: usize,
    pub mean_accuracy: f32,
    /// Held-out accuracy per (repeat, fold) evaluation.
    pub fold_accuracies: Vec<f32>,
}

/// Search result, including both rounds' full tables for audit.
#[derive(Debug, Clone)]
pub struct TuneOutcome {
    pub best_mtry: usize,
    pub round1: Vec<CandidateResult>,
    pub round2: Vec<CandidateResult>,
}

#[derive(Debug, Error)]
pub enum TuneError {
    #[error("cross-validation needs at least 2 folds, got {0}")]
    TooFewFolds(usize),
    #[error("cross-validation needs at least one repeat")]
    NoRepeats,
    #[error("training failed for mtry {mtry}: {source}")]
    Train { mtry: usize, source: TrainError },
}

/// Rank candidates: highest mean accuracy first, ties to the smaller `mtry`.
///
/// The explicit comparator keeps selection deterministic regardless of grid
/// evaluation order.
fn rank(candidates: &mut [CandidateResult]) {
    candidates.sort_by(|a, b| {
        OrderedFloat(b.mean_accuracy)
            .cmp(&OrderedFloat(a.mean_accuracy))
            .then(a.mtry.cmp(&b.mtry))
    });
}

/// Round-1 grid: `first_grid - 1` integers evenly spaced across `[2, F]` plus
/// `round(sqrt(F))`, deduplicated. Degenerates to a single value for `F <= 2`.
pub(crate) fn round1_grid(n_features: usize, first_grid: usize) -> Vec<usize> {
    if n_features <= 2 {
        return vec![n_features.max(1)];
    }
    let lo = 2.0f64;
    let hi = n_features as f64;
    let points = first_grid.saturating_sub(1).max(2);
    let mut values: Vec<usize> = (0..points)
        .map(|i| {
            let t = i as f64 / (points - 1) as f64;
            (lo + t * (hi - lo)).round() as usize
        })
        .collect();
    values.push(hi.sqrt().round() as usize);
    values.retain(|&v| v >= 1 && v <= n_features);
    values.sort_unstable();
    values.dedup();
    values
}

/// Round-2 grid: `second_grid` integers evenly spaced inclusive between the
/// two bounds.
pub(crate) fn refine_grid(a: usize, b: usize, second_grid: usize) -> Vec<usize> {
    let lo = a.min(b);
    let hi = a.max(b);
    if lo == hi {
        return vec![lo];
    }
    let points = second_grid.max(2);
    let mut values: Vec<usize> = (0..points)
        .map(|i| {
            let t = i as f64 / (points - 1) as f64;
            (lo as f64 + t * (hi - lo) as f64).round() as usize
        })
        .collect();
    values.sort_unstable();
    values.dedup();
    values
}

/// Score one candidate by repeated stratified k-fold cross-validation.
fn cross_validate<T: ClassifierTrainer>(
    trainer: &T,
    view: &TrainingView,
    mtry: usize,
    options: &TuneOptions,
) -> Result<CandidateResult, TuneError> {
    let mut fold_accuracies = Vec::with_capacity(options.folds * options.repeats);
    let mut rng = StdRng::seed_from_u64(options.seed);
    for _repeat in 0..options.repeats {
        let assignment = stratified_folds(&view.y, view.classes.len(), options.folds, &mut rng);
        for fold in 0..options.folds {
            let (train_idx, test_idx) = fold_partition(&assignment, fold);
            if train_idx.is_empty() || test_idx.is_empty() {
                continue;
            }
            let train_x: Vec<Vec<f32>> = train_idx.iter().map(|&i| view.x[i].clone()).collect();
            let train_y: Vec<usize> = train_idx.iter().map(|&i| view.y[i]).collect();
            let model = trainer
                .fit(&train_x, &train_y, &view.classes, mtry)
                .map_err(|source| TuneError::Train { mtry, source })?;
            let truth: Vec<usize> = test_idx.iter().map(|&i| view.y[i]).collect();
            let predicted: Vec<usize> = test_idx
                .iter()
                .map(|&i| model.predict_class_index(&view.x[i]))
                .collect();
            fold_accuracies.push(metrics::accuracy(&truth, &predicted));
        }
    }
    let mean_accuracy = metrics::mean(&fold_accuracies);
    Ok(CandidateResult {
        mtry,
        mean_accuracy,
        fold_accuracies,
    })
}

fn run_round<T: ClassifierTrainer>(
    trainer: &T,
    view: &TrainingView,
    grid: &[usize],
    options: &TuneOptions,
) -> Result<Vec<CandidateResult>, TuneError> {
    let mut results = Vec::with_capacity(grid.len());
    for &mtry in grid {
        let candidate = cross_validate(trainer, view, mtry, options)?;
        tracing::debug!(
            "mtry {mtry}: mean accuracy {:.4} over {} folds",
            candidate.mean_accuracy,
            candidate.fold_accuracies.len()
        );
        results.push(candidate);
    }
    Ok(results)
}

/// Run the two-round search and return the winning branching factor.
pub fn tune<T: ClassifierTrainer>(
    trainer: &T,
    view: &TrainingView,
    options: &TuneOptions,
) -> Result<TuneOutcome, TuneError> {
    if options.folds < 2 {
        return Err(TuneError::TooFewFolds(options.folds));
    }
    if options.repeats == 0 {
        return Err(TuneError::NoRepeats);
    }

    let n_features = view.feature_names.len();
    let grid1 = round1_grid(n_features, options.first_grid);
    tracing::info!("Round 1 over {n_features} features: grid {grid1:?}");
    let round1 = run_round(trainer, view, &grid1, options)?;

    let mut ranked = round1.clone();
    rank(&mut ranked);
    // `round1_grid` never returns an empty grid, so the top candidate exists.
    let top = ranked[0].mtry;
    let second = ranked.get(1).map(|c| c.mtry).unwrap_or(top);

    let grid2 = refine_grid(top, second, options.second_grid);
    tracing::info!("Round 2 between {top} and {second}: grid {grid2:?}");
    let round2 = run_round(trainer, view, &grid2, options)?;

    let mut ranked2 = round2.clone();
    rank(&mut ranked2);
    let best_mtry = ranked2[0].mtry;
    tracing::info!(
        "Selected mtry {best_mtry} (mean accuracy {:.4})",
        ranked2[0].mean_accuracy
    );

    Ok(TuneOutcome {
        best_mtry,
        round1,
        round2,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Trainer whose model is only accurate for one planted `mtry`.
    struct PlantedTrainer {
        target: usize,
    }

    struct PlantedModel {
        classes: Vec<String>,
        good: bool,
    }

    impl Classifier for PlantedModel {
        fn classes(&self) -> &[String] {
            &self.classes
        }

        fn predict_proba(&self, features: &[f32]) -> Vec<f32> {
            let mut probs = vec![0.0; self.classes.len()];
            let index = if self.good {
                (features[0] as usize).min(self.classes.len() - 1)
            } else {
                0
            };
            probs[index] = 1.0;
            probs
        }
    }

    impl ClassifierTrainer for PlantedTrainer {
        type Model = PlantedModel;

        fn fit(
            &self,
            _x: &[Vec<f32>],
            _y: &[usize],
            classes: &[String],
            mtry: usize,
        ) -> Result<PlantedModel, TrainError> {
            Ok(PlantedModel {
                classes: classes.to_vec(),
                good: mtry == self.target,
            })
        }
    }

    /// Balanced two-class view whose first feature encodes the label.
    fn oracle_view(rows: usize, n_features: usize) -> TrainingView {
        let mut x = Vec::with_capacity(rows);
        let mut y = Vec::with_capacity(rows);
        for i in 0..rows {
            let label = i % 2;
            let mut features = vec![0.0f32; n_features];
            features[0] = label as f32;
            x.push(features);
            y.push(label);
        }
        TrainingView {
            feature_names: (0..n_features).map(|i| format!("organism_{i}")).collect(),
            classes: vec!["Benign".into(), "Pathogenic".into()],
            x,
            y,
        }
    }

    #[test]
    fn round1_grid_spans_two_to_feature_count() {
        // F = 3 covers [2, 3]; round(sqrt(3)) = 2 is already in the span.
        let grid = round1_grid(3, 11);
        assert_eq!(grid, vec![2, 3]);

        let grid = round1_grid(100, 11);
        assert_eq!(grid.first(), Some(&2));
        assert_eq!(grid.last(), Some(&100));
        assert!(grid.contains(&10), "sqrt(100) missing from {grid:?}");
        assert!(grid.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn degenerate_feature_counts_yield_single_value_grids() {
        assert_eq!(round1_grid(1, 11), vec![1]);
        assert_eq!(round1_grid(2, 11), vec![2]);
    }

    #[test]
    fn refine_grid_stays_inside_bounds() {
        let grid = refine_grid(4, 12, 5);
        assert_eq!(grid.first(), Some(&4));
        assert_eq!(grid.last(), Some(&12));
        assert!(grid.iter().all(|&v| (4..=12).contains(&v)));

        assert_eq!(refine_grid(6, 6, 5), vec![6]);
        // Order of bounds must not matter.
        assert_eq!(refine_grid(12, 4, 5), refine_grid(4, 12, 5));
    }

    #[test]
    fn ranking_breaks_accuracy_ties_toward_smaller_mtry() {
        let mut candidates = vec![
            CandidateResult {
                mtry: 8,
                mean_accuracy: 0.9,
                fold_accuracies: Vec::new(),
            },
            CandidateResult {
                mtry: 3,
                mean_accuracy: 0.9,
                fold_accuracies: Vec::new(),
            },
            CandidateResult {
                mtry: 5,
                mean_accuracy: 0.95,
                fold_accuracies: Vec::new(),
            },
        ];
        rank(&mut candidates);
        let order: Vec<usize> = candidates.iter().map(|c| c.mtry).collect();
        assert_eq!(order, vec![5, 3, 8]);
    }

    #[test]
    fn tune_finds_the_planted_candidate() {
        let view = oracle_view(20, 8);
        let trainer = PlantedTrainer { target: 5 };
        let outcome = tune(&trainer, &view, &TuneOptions::default()).unwrap();
        assert_eq!(outcome.best_mtry, 5);

        // Round-1 candidates all lie in [2, F].
        assert!(outcome.round1.iter().all(|c| (2..=8).contains(&c.mtry)));
        // Round 2 stays between the two best round-1 values.
        let mut ranked = outcome.round1.clone();
        rank(&mut ranked);
        let lo = ranked[0].mtry.min(ranked[1].mtry);
        let hi = ranked[0].mtry.max(ranked[1].mtry);
        assert!(outcome.round2.iter().all(|c| (lo..=hi).contains(&c.mtry)));
        // 5 folds x 10 repeats per candidate.
        assert!(outcome.round1.iter().all(|c| c.fold_accuracies.len() == 50));
    }

    #[test]
    fn tune_survives_a_degenerate_grid() {
        let view = oracle_view(12, 1);
        let trainer = PlantedTrainer { target: 1 };
        let outcome = tune(&trainer, &view, &TuneOptions::default()).unwrap();
        assert_eq!(outcome.best_mtry, 1);
        assert_eq!(outcome.round1.len(), 1);
        assert_eq!(outcome.round2.len(), 1);
    }

    #[test]
    fn tune_validates_fold_options() {
        let view = oracle_view(12, 3);
        let trainer = PlantedTrainer { target: 2 };
        let options = TuneOptions {
            folds: 1,
            ..TuneOptions::default()
        };
        assert!(matches!(
            tune(&trainer, &view, &options),
            Err(TuneError::TooFewFolds(1))
        ));
        let options = TuneOptions {
            repeats: 0,
            ..TuneOptions::default()
        };
        assert!(matches!(
            tune(&trainer, &view, &options),
            Err(TuneError::NoRepeats)
        ));
    }
}
