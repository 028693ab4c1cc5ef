//! Stratified fold assignment for repeated cross-validation.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;

/// Assign each sample to one of `k` folds, stratified by class.
///
/// Samples are shuffled within each class and dealt round-robin across folds
/// with a counter carried between classes, so fold sizes stay balanced even
/// for small minority classes. Returns `folds[i]` = fold of sample `i`.
pub fn stratified_folds(y: &[usize], n_classes: usize, k: usize, rng: &mut StdRng) -> Vec<usize> {
    let k = k.max(1);
    let mut by_class: Vec<Vec<usize>> = vec![Vec::new(); n_classes];
    for (idx, &label) in y.iter().enumerate() {
        if label < n_classes {
            by_class[label].push(idx);
        }
    }

    let mut folds = vec![0usize; y.len()];
    let mut next = 0usize;
    for bucket in &mut by_class {
        bucket.shuffle(rng);
        for &idx in bucket.iter() {
            folds[idx] = next % k;
            next += 1;
        }
    }
    folds
}

/// Split sample indices into (train, test) for one fold.
pub fn fold_partition(assignment: &[usize], fold: usize) -> (Vec<usize>, Vec<usize>) {
    let mut train = Vec::new();
    let mut test = Vec::new();
    for (idx, &assigned) in assignment.iter().enumerate() {
        if assigned == fold {
            test.push(idx);
        } else {
            train.push(idx);
        }
    }
    (train, test)
}
