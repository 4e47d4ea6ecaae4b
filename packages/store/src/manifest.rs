//! `manifest.json`: the list of available report dates for the dashboard.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::StoreError;
use crate::paths::dated_json_name;

pub const MANIFEST_FILE: &str = "manifest.json";

/// Available report files, newest first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub files: Vec<String>,
    pub latest: Option<String>,
    pub count: usize,
}

impl Manifest {
    #[must_use]
    pub fn from_files(mut files: Vec<String>) -> Self {
        files.sort_unstable_by(|a, b| b.cmp(a));
        files.dedup();
        Self {
            latest: files.first().cloned(),
            count: files.len(),
            files,
        }
    }
}

/// Lists the `YYYYMMDD.json` files in `dir`.
///
/// # Errors
///
/// Returns [`StoreError::Io`] if the directory cannot be read.
pub fn dated_report_files(dir: &Path) -> Result<Vec<PathBuf>, StoreError> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(StoreError::io(dir))? {
        let entry = entry.map_err(StoreError::io(dir))?;
        let name = entry.file_name();
        if name.to_str().and_then(dated_json_name).is_some() && entry.path().is_file() {
            files.push(entry.path());
        }
    }
    files.sort();
    Ok(files)
}

/// Builds the manifest for the reports in `dir` without writing it.
///
/// # Errors
///
/// Returns [`StoreError::Io`] if the directory cannot be read.
pub fn build_manifest(dir: &Path) -> Result<Manifest, StoreError> {
    let files = dated_report_files(dir)?
        .iter()
        .filter_map(|p| p.file_name())
        .map(|n| n.to_string_lossy().into_owned())
        .collect();
    Ok(Manifest::from_files(files))
}

/// Regenerates `dir/manifest.json`.
///
/// # Errors
///
/// Returns [`StoreError`] if the directory cannot be read or the manifest
/// cannot be written.
pub fn update_manifest(dir: &Path) -> Result<Manifest, StoreError> {
    let manifest = build_manifest(dir)?;
    let path = dir.join(MANIFEST_FILE);

    if manifest.count == 0 {
        log::warn!("No report files found in {}", dir.display());
    }

    let mut json = serde_json::to_string_pretty(&manifest).map_err(|source| StoreError::Json {
        path: path.clone(),
        source,
    })?;
    json.push('\n');
    crate::write_atomic(&path, json.as_bytes())?;

    log::info!(
        "Updated manifest with {} file(s), latest {}",
        manifest.count,
        manifest.latest.as_deref().unwrap_or("none")
    );
    Ok(manifest)
}
