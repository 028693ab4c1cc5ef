//! Feature and label column resolution.
//!
//! A dataset names its conservation columns after organisms, using either
//! short codes or long-form names. Resolution intersects the dataset header
//! with the active reference list, preserving the dataset's column order, and
//! produces an immutable index mapping used by every later stage.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::{Dataset, LABEL_COLUMN};
use crate::config::ReferenceConfig;

/// Which organism naming convention identifies feature columns in a dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionMode {
    /// Intersect against the short-code reference list.
    ShortCode,
    /// Intersect against the long-form name reference list.
    LongName,
}

/// Errors that may occur during column resolution.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("failed to read reference list {path}: {source}")]
    ReadList {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("reference list {path} contains no entries")]
    EmptyReferenceList { path: PathBuf },
    #[error("dataset has no `{LABEL_COLUMN}` column")]
    MissingLabelColumn,
    #[error("no feature columns matched the {0:?} reference list")]
    NoFeatureColumns(ResolutionMode),
    #[error("extra feature column `{name}` is not in the dataset")]
    UnknownExtraColumn { name: String },
}

/// The two organism reference lists, loaded once and consumed read-only.
#[derive(Debug, Clone)]
pub struct OrganismReference {
    short_codes: Vec<String>,
    long_names: Vec<String>,
}

impl OrganismReference {
    /// Load both reference lists from the files named by `config`.
    pub fn load(config: &ReferenceConfig) -> Result<Self, SchemaError> {
        Ok(Self {
            short_codes: read_list(&config.short_code_list)?,
            long_names: read_list(&config.long_name_list)?,
        })
    }

    /// Build a reference from in-memory lists.
    pub fn from_lists(short_codes: Vec<String>, long_names: Vec<String>) -> Self {
        Self {
            short_codes,
            long_names,
        }
    }

    fn list(&self, mode: ResolutionMode) -> &[String] {
        match mode {
            ResolutionMode::ShortCode => &self.short_codes,
            ResolutionMode::LongName => &self.long_names,
        }
    }
}

/// One organism identifier per line; blank lines and `#` comments ignored.
fn read_list(path: &Path) -> Result<Vec<String>, SchemaError> {
    let text = fs::read_to_string(path).map_err(|source| SchemaError::ReadList {
        path: path.to_path_buf(),
        source,
    })?;
    let entries: Vec<String> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(|line| line.to_string())
        .collect();
    if entries.is_empty() {
        return Err(SchemaError::EmptyReferenceList {
            path: path.to_path_buf(),
        });
    }
    Ok(entries)
}

/// Immutable column-index mapping resolved once per dataset.
#[derive(Debug, Clone)]
pub struct ResolvedSchema {
    /// Index of the `significance` column.
    pub label_index: usize,
    /// Feature column indices, dataset order, extras appended.
    pub feature_indices: Vec<usize>,
    /// Names aligned with `feature_indices`.
    pub feature_names: Vec<String>,
}

/// Resolve feature columns only.
///
/// Returns the order-preserving intersection of the dataset header with the
/// active reference list; `extra_feature_names` are unioned in regardless of
/// list membership. An empty result means the dataset has no predictors.
pub fn resolve_features(
    dataset: &Dataset,
    reference: &OrganismReference,
    mode: ResolutionMode,
    extra_feature_names: &[String],
) -> Result<(Vec<usize>, Vec<String>), SchemaError> {
    let wanted: HashSet<&str> = reference.list(mode).iter().map(String::as_str).collect();
    let mut indices: Vec<usize> = dataset
        .columns()
        .iter()
        .enumerate()
        .filter(|(_, name)| wanted.contains(name.as_str()))
        .map(|(idx, _)| idx)
        .collect();
    for name in extra_feature_names {
        let idx = dataset
            .column_index(name)
            .ok_or_else(|| SchemaError::UnknownExtraColumn { name: name.clone() })?;
        if !indices.contains(&idx) {
            indices.push(idx);
        }
    }
    if indices.is_empty() {
        return Err(SchemaError::NoFeatureColumns(mode));
    }
    let names = indices
        .iter()
        .map(|&idx| dataset.columns()[idx].clone())
        .collect();
    Ok((indices, names))
}

/// Resolve the full training schema: feature columns plus the label column.
pub fn resolve_schema(
    dataset: &Dataset,
    reference: &OrganismReference,
    mode: ResolutionMode,
    extra_feature_names: &[String],
) -> Result<ResolvedSchema, SchemaError> {
    let label_index = dataset
        .column_index(LABEL_COLUMN)
        .ok_or(SchemaError::MissingLabelColumn)?;
    let (feature_indices, feature_names) =
        resolve_features(dataset, reference, mode, extra_feature_names)?;
    tracing::debug!(
        "Resolved {} feature columns and label at index {label_index}",
        feature_indices.len()
    );
    Ok(ResolvedSchema {
        label_index,
        feature_indices,
        feature_names,
    })
}
