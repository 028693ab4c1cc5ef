//! Delimited export of prediction tables.

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::PredictionTable;

/// Errors that may occur while writing a prediction export.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to create export file {path}: {source}")]
    Create {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to write export file {path}: {source}")]
    Write { path: PathBuf, source: csv::Error },
    #[error("failed to flush export file {path}: {source}")]
    Flush {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Write the table as CSV with a header row.
///
/// Column order: `score`, `coordinate`, then `allele_id` when the table
/// carries it, then the additional columns in their caller-specified order.
pub fn write_predictions(path: &Path, table: &PredictionTable) -> Result<(), ExportError> {
    let file = File::create(path).map_err(|source| ExportError::Create {
        path: path.to_path_buf(),
        source,
    })?;
    let mut writer = csv::Writer::from_writer(BufWriter::new(file));

    let mut header: Vec<&str> = vec!["score", "coordinate"];
    if table.include_allele_id {
        header.push("allele_id");
    }
    for name in &table.additional_columns {
        header.push(name.as_str());
    }
    writer
        .write_record(&header)
        .map_err(|source| ExportError::Write {
            path: path.to_path_buf(),
            source,
        })?;

    for row in &table.rows {
        let mut record = Vec::with_capacity(header.len());
        record.push(row.score.to_string());
        record.push(row.coordinate.clone());
        if table.include_allele_id {
            record.push(row.allele_id.clone().unwrap_or_default());
        }
        record.extend(row.additional.iter().cloned());
        writer
            .write_record(&record)
            .map_err(|source| ExportError::Write {
                path: path.to_path_buf(),
                source,
            })?;
    }
    writer.flush().map_err(|source| ExportError::Flush {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(())
}
