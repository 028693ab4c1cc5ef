//! Reference-list configuration.
//!
//! The organism reference lists live outside the pipeline; their locations are
//! an explicit configuration value threaded into schema resolution rather than
//! a process-wide constant.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Locations of the two organism reference lists.
///
/// Config keys (TOML): `short_code_list`, `long_name_list`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferenceConfig {
    /// File listing organism short codes, one per line.
    pub short_code_list: PathBuf,
    /// File listing long-form organism names, one per line.
    pub long_name_list: PathBuf,
}

/// Errors that may occur while loading a [`ReferenceConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

impl ReferenceConfig {
    /// Load the configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}
