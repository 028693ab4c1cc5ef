//! Delimited table loading.

use std::fs::File;
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::{Dataset, DatasetError};

/// Errors that may occur while loading a table from disk.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to read {path}: {source}")]
    Csv { path: PathBuf, source: csv::Error },
    #[error(transparent)]
    Shape(#[from] DatasetError),
}

/// Load a delimited table with a header row.
///
/// The delimiter is chosen by extension: `.tsv`/`.tab` files use tabs,
/// everything else commas. Column order is irrelevant downstream; selection is
/// by name.
pub fn load_table(path: &Path) -> Result<Dataset, LoadError> {
    let delimiter = match path.extension().and_then(|ext| ext.to_str()) {
        Some("tsv") | Some("tab") => b'\t',
        _ => b',',
    };
    let file = File::open(path).map_err(|source| LoadError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_reader(file);

    let columns: Vec<String> = reader
        .headers()
        .map_err(|source| LoadError::Csv {
            path: path.to_path_buf(),
            source,
        })?
        .iter()
        .map(|name| name.trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|source| LoadError::Csv {
            path: path.to_path_buf(),
            source,
        })?;
        rows.push(record.iter().map(|cell| cell.to_string()).collect());
    }
    Ok(Dataset::new(columns, rows)?)
}
