#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! On-disk storage for processed reports.
//!
//! Every file is written to a uniquely named temporary file in its target
//! directory and then renamed over the destination, so readers (and a
//! concurrent run for the same date) never observe a partial file.

pub mod archive;
pub mod csv_export;
pub mod manifest;
pub mod paths;

use std::io::Write as _;
use std::path::{Path, PathBuf};

use crime_report_models::ReportDocumentRecord;

pub use paths::{DataPaths, OutputKey};

/// Errors raised while reading or writing stored files.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("JSON error for {}: {source}", path.display())]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl StoreError {
    pub(crate) fn io(path: &Path) -> impl FnOnce(std::io::Error) -> Self + '_ {
        move |source| Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Result of [`write_report`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The report was written to this path.
    Written(PathBuf),
    /// The report had no statistics and an existing file was left in place.
    KeptExisting(PathBuf),
}

impl WriteOutcome {
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::Written(path) | Self::KeptExisting(path) => path,
        }
    }
}

/// Atomically replaces `path` with `contents`.
///
/// # Errors
///
/// Returns [`StoreError::Io`] if the directory cannot be created or the
/// file cannot be written or renamed.
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), StoreError> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    paths::ensure_dir(dir).map_err(StoreError::io(dir))?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(StoreError::io(dir))?;
    tmp.write_all(contents).map_err(StoreError::io(tmp.path()))?;
    tmp.as_file().sync_all().map_err(StoreError::io(path))?;
    tmp.persist(path).map_err(|e| StoreError::Io {
        path: path.to_path_buf(),
        source: e.error,
    })?;
    Ok(())
}

/// Writes `record` as pretty-printed JSON to `dir/<key>.json`.
///
/// A record with no statistics does not replace an existing file for the
/// same key unless `force` is set.
///
/// # Errors
///
/// Returns [`StoreError`] if serialization or the write fails.
pub fn write_report(
    dir: &Path,
    key: &OutputKey,
    record: &ReportDocumentRecord,
    force: bool,
) -> Result<WriteOutcome, StoreError> {
    let path = paths::json_path(dir, key);

    if record.crime_statistics.is_empty() && path.exists() && !force {
        log::warn!(
            "Extraction is empty; keeping existing {} (use --force to overwrite)",
            path.display()
        );
        return Ok(WriteOutcome::KeptExisting(path));
    }

    let mut json = serde_json::to_string_pretty(record).map_err(|source| StoreError::Json {
        path: path.clone(),
        source,
    })?;
    json.push('\n');

    write_atomic(&path, json.as_bytes())?;
    log::info!("Saved report to {}", path.display());
    Ok(WriteOutcome::Written(path))
}

/// Reads a stored report.
///
/// # Errors
///
/// Returns [`StoreError`] if the file cannot be read or parsed.
pub fn read_report(path: &Path) -> Result<ReportDocumentRecord, StoreError> {
    let contents = std::fs::read_to_string(path).map_err(StoreError::io(path))?;
    serde_json::from_str(&contents).map_err(|source| StoreError::Json {
        path: path.to_path_buf(),
        source,
    })
}
