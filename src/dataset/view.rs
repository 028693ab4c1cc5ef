//! Numeric training view over a resolved dataset.

use std::collections::BTreeSet;

use thiserror::Error;

use super::Dataset;
use super::schema::ResolvedSchema;

/// In-memory matrix form consumed by trainers.
///
/// Built once per dataset from a [`ResolvedSchema`]; the dataset itself is not
/// touched again after construction.
#[derive(Debug, Clone)]
pub struct TrainingView {
    /// Feature column names, matrix order.
    pub feature_names: Vec<String>,
    /// Distinct label values, sorted.
    pub classes: Vec<String>,
    /// Feature matrix, row-major. Missing cells are `NaN`.
    pub x: Vec<Vec<f32>>,
    /// Class indices aligned with `x`.
    pub y: Vec<usize>,
}

#[derive(Debug, Error)]
pub enum ViewError {
    #[error("training data has no rows")]
    Empty,
    #[error("label column holds the single class `{0}`; need at least 2")]
    SingleClass(String),
}

/// Parse a conservation cell. Missing or malformed values become `NaN`.
pub(crate) fn parse_numeric(cell: &str) -> f32 {
    let trimmed = cell.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("na") {
        return f32::NAN;
    }
    trimmed.parse::<f32>().unwrap_or(f32::NAN)
}

/// Materialize the numeric matrix and class-index labels.
pub fn build_training_view(
    dataset: &Dataset,
    schema: &ResolvedSchema,
) -> Result<TrainingView, ViewError> {
    if dataset.n_rows() == 0 {
        return Err(ViewError::Empty);
    }

    let class_set: BTreeSet<String> = (0..dataset.n_rows())
        .map(|row| dataset.value(row, schema.label_index).trim().to_string())
        .collect();
    let classes: Vec<String> = class_set.into_iter().collect();
    if classes.len() < 2 {
        return Err(ViewError::SingleClass(
            classes.first().cloned().unwrap_or_default(),
        ));
    }

    let mut x = Vec::with_capacity(dataset.n_rows());
    let mut y = Vec::with_capacity(dataset.n_rows());
    for row in 0..dataset.n_rows() {
        let features: Vec<f32> = schema
            .feature_indices
            .iter()
            .map(|&col| parse_numeric(dataset.value(row, col)))
            .collect();
        let label = dataset.value(row, schema.label_index).trim();
        // Present by construction: `classes` was built from this column.
        let class_index = classes
            .binary_search_by(|candidate| candidate.as_str().cmp(label))
            .unwrap_or(0);
        x.push(features);
        y.push(class_index);
    }

    Ok(TrainingView {
        feature_names: schema.feature_names.clone(),
        classes,
        x,
        y,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Dataset;

    fn schema() -> ResolvedSchema {
        ResolvedSchema {
            label_index: 0,
            feature_indices: vec![1, 2],
            feature_names: vec!["organism_a".into(), "organism_b".into()],
        }
    }

    fn dataset(rows: Vec<Vec<String>>) -> Dataset {
        Dataset::new(
            vec![
                "significance".into(),
                "organism_a".into(),
                "organism_b".into(),
            ],
            rows,
        )
        .unwrap()
    }

    #[test]
    fn classes_are_sorted_and_labels_indexed() {
        let data = dataset(vec![
            vec!["Pathogenic".into(), "0.9".into(), "0.8".into()],
            vec!["Benign".into(), "0.1".into(), "0.2".into()],
        ]);
        let view = build_training_view(&data, &schema()).unwrap();
        assert_eq!(view.classes, vec!["Benign", "Pathogenic"]);
        assert_eq!(view.y, vec![1, 0]);
        assert_eq!(view.x[0], vec![0.9, 0.8]);
    }

    #[test]
    fn missing_cells_become_nan() {
        let data = dataset(vec![
            vec!["Pathogenic".into(), "".into(), "NA".into()],
            vec!["Benign".into(), "junk".into(), "0.2".into()],
        ]);
        let view = build_training_view(&data, &schema()).unwrap();
        assert!(view.x[0][0].is_nan());
        assert!(view.x[0][1].is_nan());
        assert!(view.x[1][0].is_nan());
        assert_eq!(view.x[1][1], 0.2);
    }

    #[test]
    fn single_class_is_rejected() {
        let data = dataset(vec![
            vec!["Benign".into(), "0.1".into(), "0.2".into()],
            vec!["Benign".into(), "0.3".into(), "0.4".into()],
        ]);
        assert!(matches!(
            build_training_view(&data, &schema()),
            Err(ViewError::SingleClass(_))
        ));
    }

    #[test]
    fn empty_dataset_is_rejected() {
        let data = dataset(Vec::new());
        assert!(matches!(
            build_training_view(&data, &schema()),
            Err(ViewError::Empty)
        ));
    }
}
