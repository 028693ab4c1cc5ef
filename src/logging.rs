//! Logging setup for pipeline runs.
//!
//! Installs a global tracing subscriber writing to stdout and, when a log
//! directory is supplied, a timestamped per-run log file. Log files are kept
//! to a bounded count to avoid unbounded growth.

use std::{
    fs::{self, OpenOptions},
    path::{Path, PathBuf},
    sync::OnceLock,
    time::SystemTime,
};

use time::{OffsetDateTime, format_description::FormatItem, macros::format_description};
use tracing_appender::{non_blocking::WorkerGuard, rolling};
use tracing_subscriber::{EnvFilter, Registry, fmt, prelude::*};

/// Maximum number of log files to retain.
const MAX_LOG_FILES: usize = 10;
const LOG_FILE_PREFIX: &str = "pathovar";

static LOG_GUARD: OnceLock<Option<WorkerGuard>> = OnceLock::new();

/// Errors that may occur while initializing logging.
#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("Failed to prepare log directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to read log directory {path}: {source}")]
    ReadDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to remove old log file {path}: {source}")]
    RemoveFile {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to format log filename time: {0}")]
    FormatTime(time::error::Format),
    #[error("Failed to install global tracing subscriber: {0}")]
    SetGlobal(tracing::subscriber::SetGlobalDefaultError),
    #[error("Failed to create log file at {path}: {source}")]
    CreateLogFile {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Initialize tracing to write to stdout and, when `log_dir` is given, a
/// per-run log file inside it.
///
/// Subsequent calls are no-ops. Failures are returned so callers can degrade
/// gracefully without aborting the run.
pub fn init(log_dir: Option<&Path>) -> Result<(), LoggingError> {
    if LOG_GUARD.get().is_some() {
        return Ok(());
    }

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let stdout_layer = fmt::layer().with_writer(std::io::stdout);

    match log_dir {
        None => {
            let subscriber = Registry::default().with(env_filter).with(stdout_layer);
            tracing::subscriber::set_global_default(subscriber).map_err(LoggingError::SetGlobal)?;
            let _ = LOG_GUARD.set(None);
        }
        Some(dir) => {
            fs::create_dir_all(dir).map_err(|source| LoggingError::CreateDir {
                path: dir.to_path_buf(),
                source,
            })?;
            let log_file_name = format_log_file_name(OffsetDateTime::now_utc())?;
            let log_path = dir.join(&log_file_name);
            ensure_file_exists(&log_path)?;

            let file_appender = rolling::never(dir, log_file_name);
            let (file_writer, guard) = tracing_appender::non_blocking(file_appender);
            prune_old_logs(dir, MAX_LOG_FILES)?;

            let file_layer = fmt::layer().with_ansi(false).with_writer(file_writer);
            let subscriber = Registry::default()
                .with(env_filter)
                .with(stdout_layer)
                .with(file_layer);
            tracing::subscriber::set_global_default(subscriber).map_err(LoggingError::SetGlobal)?;
            let _ = LOG_GUARD.set(Some(guard));
            tracing::info!("Logging initialized; log file at {}", log_path.display());
        }
    }
    Ok(())
}

fn ensure_file_exists(path: &Path) -> Result<(), LoggingError> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map(|_| ())
        .map_err(|source| LoggingError::CreateLogFile {
            path: path.to_path_buf(),
            source,
        })
}

fn prune_old_logs(dir: &Path, max_files: usize) -> Result<(), LoggingError> {
    let mut entries = fs::read_dir(dir)
        .map_err(|source| LoggingError::ReadDir {
            path: dir.to_path_buf(),
            source,
        })?
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().map(|ft| ft.is_file()).unwrap_or(false))
        .filter(|entry| entry.path().extension().and_then(|ext| ext.to_str()) == Some("log"))
        .map(|entry| {
            let modified = entry
                .metadata()
                .and_then(|meta| meta.modified())
                .unwrap_or(SystemTime::UNIX_EPOCH);
            (modified, entry.path())
        })
        .collect::<Vec<_>>();

    entries.sort_by_key(|(modified, _)| *modified);
    while entries.len() > max_files {
        if let Some((_, path)) = entries.first() {
            fs::remove_file(path).map_err(|source| LoggingError::RemoveFile {
                path: path.to_path_buf(),
                source,
            })?;
        }
        entries.remove(0);
    }
    Ok(())
}

fn format_log_file_name(now: OffsetDateTime) -> Result<String, LoggingError> {
    const NAME_FORMAT: &[FormatItem<'_>] =
        format_description!("[year]-[month]-[day]_[hour]-[minute]-[second]");
    let name = now.format(NAME_FORMAT).map_err(LoggingError::FormatTime)?;
    Ok(format!("{LOG_FILE_PREFIX}_{name}.log"))
}
