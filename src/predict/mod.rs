//! Scoring unseen variant tables with a fitted model.

pub mod export;

use std::path::PathBuf;

use thiserror::Error;

use crate::dataset::schema::{self, OrganismReference, ResolutionMode, SchemaError};
use crate::dataset::view::parse_numeric;
use crate::dataset::{ALLELE_ID_COLUMN, COORDINATE_COLUMN, Dataset};
use crate::forest::Classifier;
use crate::training::ModelArtifact;

/// Caller-supplied switches controlling prediction output.
///
/// The output column set is determined entirely by these flags, never
/// inferred from the dataset.
#[derive(Debug, Clone)]
pub struct PredictOptions {
    /// Naming convention of the unseen dataset's feature columns. May differ
    /// from the convention used at training time.
    pub resolution: ResolutionMode,
    /// Extra feature columns to accept beyond the reference list.
    pub extra_feature_names: Vec<String>,
    /// Emit the `allele_id` column.
    pub include_allele_id: bool,
    /// Pass-through columns appended after the fixed columns, in this order.
    pub additional_columns: Vec<String>,
    /// When set, write the finished table to this path as CSV.
    pub export_path: Option<PathBuf>,
}

impl Default for PredictOptions {
    fn default() -> Self {
        Self {
            resolution: ResolutionMode::ShortCode,
            extra_feature_names: Vec::new(),
            include_allele_id: false,
            additional_columns: Vec::new(),
            export_path: None,
        }
    }
}

/// One scored variant.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionRow {
    /// Probability the variant is pathogenic, in `[0, 1]`.
    pub score: f32,
    pub coordinate: String,
    pub allele_id: Option<String>,
    /// Values aligned with the table's `additional_columns`.
    pub additional: Vec<String>,
}

/// Scored table. Column layout is fixed by the options that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionTable {
    pub include_allele_id: bool,
    pub additional_columns: Vec<String>,
    pub rows: Vec<PredictionRow>,
}

#[derive(Debug, Error)]
pub enum PredictError {
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error("unseen dataset is missing trained feature column `{name}`")]
    MissingFeature { name: String },
    #[error("dataset has no `{0}` column")]
    MissingColumn(&'static str),
    #[error("requested additional column `{name}` is not in the dataset")]
    UnknownAdditionalColumn { name: String },
    #[error("no model class name contains \"pathogenic\"")]
    NoPathogenicClass,
    #[error("multiple model class names contain \"pathogenic\": {matches:?}")]
    AmbiguousPathogenicClass { matches: Vec<String> },
    #[error("scored {actual} rows for {expected} input records")]
    RowCountMismatch { expected: usize, actual: usize },
    #[error(transparent)]
    Export(#[from] export::ExportError),
}

/// Identify the positive class by case-insensitive substring match on
/// "pathogenic". Trainers are free to emit `Pathogenic`, `pathogenic`,
/// `Likely_Pathogenic` and the like; anything other than exactly one match is
/// a configuration error.
pub fn pathogenic_class_index(classes: &[String]) -> Result<usize, PredictError> {
    let matches: Vec<usize> = classes
        .iter()
        .enumerate()
        .filter(|(_, name)| name.to_lowercase().contains("pathogenic"))
        .map(|(idx, _)| idx)
        .collect();
    match matches.as_slice() {
        [single] => Ok(*single),
        [] => Err(PredictError::NoPathogenicClass),
        many => Err(PredictError::AmbiguousPathogenicClass {
            matches: many.iter().map(|&idx| classes[idx].clone()).collect(),
        }),
    }
}

/// Score every record of `dataset` and assemble the prediction table.
///
/// Feature columns are re-resolved against the unseen dataset's own schema;
/// the model then consumes them in training order, so every trained feature
/// name must be present in the dataset. Export runs only after the whole
/// table is built.
pub fn predict(
    artifact: &ModelArtifact,
    dataset: &Dataset,
    reference: &OrganismReference,
    options: &PredictOptions,
) -> Result<PredictionTable, PredictError> {
    let (_, resolved_names) = schema::resolve_features(
        dataset,
        reference,
        options.resolution,
        &options.extra_feature_names,
    )?;
    if resolved_names != artifact.feature_names {
        tracing::warn!(
            "Unseen dataset resolves {} feature columns, model was trained on {}",
            resolved_names.len(),
            artifact.feature_names.len()
        );
    }

    let mut feature_indices = Vec::with_capacity(artifact.feature_names.len());
    for name in &artifact.feature_names {
        let idx = dataset
            .column_index(name)
            .ok_or_else(|| PredictError::MissingFeature { name: name.clone() })?;
        feature_indices.push(idx);
    }

    let coordinate_idx = dataset
        .column_index(COORDINATE_COLUMN)
        .ok_or(PredictError::MissingColumn(COORDINATE_COLUMN))?;
    let allele_idx = if options.include_allele_id {
        Some(
            dataset
                .column_index(ALLELE_ID_COLUMN)
                .ok_or(PredictError::MissingColumn(ALLELE_ID_COLUMN))?,
        )
    } else {
        None
    };
    let mut additional_indices = Vec::with_capacity(options.additional_columns.len());
    for name in &options.additional_columns {
        let idx = dataset
            .column_index(name)
            .ok_or_else(|| PredictError::UnknownAdditionalColumn { name: name.clone() })?;
        additional_indices.push(idx);
    }

    let positive = pathogenic_class_index(&artifact.model.classes)?;

    let mut rows = Vec::with_capacity(dataset.n_rows());
    for row in 0..dataset.n_rows() {
        let features: Vec<f32> = feature_indices
            .iter()
            .map(|&col| parse_numeric(dataset.value(row, col)))
            .collect();
        let probs = artifact.model.predict_proba(&features);
        let score = probs.get(positive).copied().unwrap_or(0.0);
        rows.push(PredictionRow {
            score,
            coordinate: dataset.value(row, coordinate_idx).to_string(),
            allele_id: allele_idx.map(|col| dataset.value(row, col).to_string()),
            additional: additional_indices
                .iter()
                .map(|&col| dataset.value(row, col).to_string())
                .collect(),
        });
    }
    if rows.len() != dataset.n_rows() {
        return Err(PredictError::RowCountMismatch {
            expected: dataset.n_rows(),
            actual: rows.len(),
        });
    }

    let table = PredictionTable {
        include_allele_id: options.include_allele_id,
        additional_columns: options.additional_columns.clone(),
        rows,
    };
    if let Some(path) = &options.export_path {
        export::write_predictions(path, &table)?;
        tracing::info!(
            "Exported {} predictions to {}",
            table.rows.len(),
            path.display()
        );
    }
    Ok(table)
}
