//! Tabular variant dataset model.
//!
//! A [`Dataset`] is an immutable table of variant records sharing one header.
//! Column lookup is by name, never by position; the name-to-index map is built
//! once at construction and reused for every access.

pub mod loader;
pub mod schema;
pub mod view;

use std::collections::HashMap;

use thiserror::Error;

/// Column holding the clinical significance label.
pub const LABEL_COLUMN: &str = "significance";
/// Column holding the genomic coordinate of a variant.
pub const COORDINATE_COLUMN: &str = "coordinate";
/// Optional column holding the allele identifier.
pub const ALLELE_ID_COLUMN: &str = "allele_id";

/// Structural errors in a raw table.
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("table has no header columns")]
    EmptyHeader,
    #[error("duplicate column name `{name}`")]
    DuplicateColumn { name: String },
    #[error("row {row} has {actual} cells but the header has {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        actual: usize,
    },
}

/// An immutable table of variant records.
#[derive(Debug, Clone)]
pub struct Dataset {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
    index_by_name: HashMap<String, usize>,
}

impl Dataset {
    /// Build a dataset from a header and rows. Every row must match the header width.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<String>>) -> Result<Self, DatasetError> {
        if columns.is_empty() {
            return Err(DatasetError::EmptyHeader);
        }
        let mut index_by_name = HashMap::with_capacity(columns.len());
        for (idx, name) in columns.iter().enumerate() {
            if index_by_name.insert(name.clone(), idx).is_some() {
                return Err(DatasetError::DuplicateColumn { name: name.clone() });
            }
        }
        for (row_idx, row) in rows.iter().enumerate() {
            if row.len() != columns.len() {
                return Err(DatasetError::RaggedRow {
                    row: row_idx,
                    expected: columns.len(),
                    actual: row.len(),
                });
            }
        }
        Ok(Self {
            columns,
            rows,
            index_by_name,
        })
    }

    /// Header names in table order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    /// Index of a column by exact name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.index_by_name.get(name).copied()
    }

    /// Raw cell value. Indices must come from this dataset's header.
    pub fn value(&self, row: usize, column: usize) -> &str {
        &self.rows[row][column]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn lookup_is_by_name_not_position() {
        let dataset = Dataset::new(
            header(&["coordinate", "significance", "organism_a"]),
            vec![vec!["1:100".into(), "Benign".into(), "0.5".into()]],
        )
        .unwrap();
        assert_eq!(dataset.column_index("organism_a"), Some(2));
        assert_eq!(dataset.column_index("missing"), None);
        assert_eq!(dataset.value(0, 1), "Benign");
    }

    #[test]
    fn duplicate_column_is_rejected() {
        let result = Dataset::new(header(&["a", "a"]), Vec::new());
        assert!(matches!(result, Err(DatasetError::DuplicateColumn { .. })));
    }

    #[test]
    fn ragged_row_is_rejected() {
        let result = Dataset::new(header(&["a", "b"]), vec![vec!["1".into()]]);
        assert!(matches!(
            result,
            Err(DatasetError::RaggedRow {
                row: 0,
                expected: 2,
                actual: 1
            })
        ));
    }

    #[test]
    fn empty_header_is_rejected() {
        assert!(matches!(
            Dataset::new(Vec::new(), Vec::new()),
            Err(DatasetError::EmptyHeader)
        ));
    }
}
