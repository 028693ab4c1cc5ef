//! Final model fitting and artifact persistence.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::dataset::view::TrainingView;
use crate::forest::{ClassifierTrainer, ForestModel, TrainError};

/// A fitted model plus everything needed to score unseen data with it.
///
/// Immutable once created; `save`/`load` round-trip it exactly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub model: ForestModel,
    /// Feature column names, in the order the model expects them.
    pub feature_names: Vec<String>,
    /// Winning branching factor used for the final fit.
    pub mtry: usize,
}

/// Errors that may occur while persisting or loading an artifact.
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("failed to write model artifact {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to read model artifact {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("model artifact {path} is not valid JSON: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("model artifact {path} failed validation: {message}")]
    Invalid { path: PathBuf, message: String },
}

/// Fit the final model on the full training view, no internal
/// cross-validation.
pub fn train_final<T>(
    trainer: &T,
    view: &TrainingView,
    mtry: usize,
) -> Result<ModelArtifact, TrainError>
where
    T: ClassifierTrainer<Model = ForestModel>,
{
    tracing::info!(
        "Fitting final model with mtry {mtry} on {} rows x {} features",
        view.x.len(),
        view.feature_names.len()
    );
    let model = trainer.fit(&view.x, &view.y, &view.classes, mtry)?;
    Ok(ModelArtifact {
        model,
        feature_names: view.feature_names.clone(),
        mtry,
    })
}

impl ModelArtifact {
    /// Persist as JSON. The bytes go to a temporary sibling first and are
    /// renamed into place, so a failed write never leaves a partial artifact.
    pub fn save(&self, path: &Path) -> Result<(), ArtifactError> {
        let bytes = serde_json::to_vec_pretty(self).map_err(|source| ArtifactError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, bytes).map_err(|source| ArtifactError::Write {
            path: tmp.clone(),
            source,
        })?;
        fs::rename(&tmp, path).map_err(|source| ArtifactError::Write {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::info!("Saved model artifact to {}", path.display());
        Ok(())
    }

    /// Load and validate a persisted artifact.
    pub fn load(path: &Path) -> Result<Self, ArtifactError> {
        let bytes = fs::read(path).map_err(|source| ArtifactError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let artifact: Self =
            serde_json::from_slice(&bytes).map_err(|source| ArtifactError::Json {
                path: path.to_path_buf(),
                source,
            })?;
        artifact
            .model
            .validate()
            .map_err(|message| ArtifactError::Invalid {
                path: path.to_path_buf(),
                message,
            })?;
        if artifact.feature_names.len() != artifact.model.feature_len {
            return Err(ArtifactError::Invalid {
                path: path.to_path_buf(),
                message: format!(
                    "{} feature names for a model expecting {}",
                    artifact.feature_names.len(),
                    artifact.model.feature_len
                ),
            });
        }
        Ok(artifact)
    }
}
