#![allow(clippy::module_name_repetitions)]
//! Data directory layout and output file naming.
//!
//! Reports are keyed by their report date (`20260208.json`,
//! `20260208.pdf`). A report whose date could not be resolved is written
//! as `undated-<pdf stem>.json` so it never shadows a dated file.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::Deserialize;

/// Prefix for reports without a resolved date.
pub const UNDATED_PREFIX: &str = "undated-";

/// Directories the pipeline reads and writes.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DataPaths {
    /// Dated JSON reports and `manifest.json`.
    pub json_dir: PathBuf,
    /// Archived source PDFs.
    pub pdf_dir: PathBuf,
    /// CSV exports.
    pub csv_dir: PathBuf,
}

impl Default for DataPaths {
    fn default() -> Self {
        let data = Path::new("data");
        Self {
            json_dir: data.join("json"),
            pdf_dir: data.join("pdf"),
            csv_dir: data.join("csv"),
        }
    }
}

/// The name a report's output files are stored under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputKey {
    /// `YYYYMMDD`
    Dated(NaiveDate),
    /// `undated-<stem>`
    Undated(String),
}

impl OutputKey {
    /// Picks the key for a report: the explicit date if given, else the
    /// extracted report date, else an undated key built from `source_stem`.
    #[must_use]
    pub fn for_report(
        override_date: Option<NaiveDate>,
        report_date: Option<NaiveDate>,
        source_stem: &str,
    ) -> Self {
        override_date
            .or(report_date)
            .map_or_else(|| Self::Undated(source_stem.to_owned()), Self::Dated)
    }

    /// File name without extension.
    #[must_use]
    pub fn file_stem(&self) -> String {
        match self {
            Self::Dated(date) => crime_report_models::file_key(*date),
            Self::Undated(stem) => format!("{UNDATED_PREFIX}{stem}"),
        }
    }

    #[must_use]
    pub const fn is_dated(&self) -> bool {
        matches!(self, Self::Dated(_))
    }
}

/// Returns `dir/<key>.json`.
#[must_use]
pub fn json_path(dir: &Path, key: &OutputKey) -> PathBuf {
    dir.join(format!("{}.json", key.file_stem()))
}

/// Returns `dir/<key>.pdf`.
#[must_use]
pub fn pdf_path(dir: &Path, key: &OutputKey) -> PathBuf {
    dir.join(format!("{}.pdf", key.file_stem()))
}

/// Parses the date out of a `YYYYMMDD.json` file name.
#[must_use]
pub fn dated_json_name(file_name: &str) -> Option<NaiveDate> {
    let stem = file_name.strip_suffix(".json")?;
    if stem.len() != 8 || !stem.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    NaiveDate::parse_from_str(stem, "%Y%m%d").ok()
}

/// Ensures a directory exists, creating it if necessary.
///
/// # Errors
///
/// Returns an I/O error if the directory cannot be created.
pub fn ensure_dir(path: &Path) -> std::io::Result<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feb_8() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 2, 8).unwrap()
    }

    #[test]
    fn override_date_wins() {
        let other = NaiveDate::from_ymd_opt(2026, 2, 9).unwrap();
        let key = OutputKey::for_report(Some(other), Some(feb_8()), "download");
        assert_eq!(key.file_stem(), "20260209");
    }

    #[test]
    fn undated_reports_get_prefixed_stem() {
        let key = OutputKey::for_report(None, None, "crime_report");
        assert!(!key.is_dated());
        assert_eq!(
            json_path(Path::new("out"), &key),
            Path::new("out").join("undated-crime_report.json")
        );
    }

    #[test]
    fn dated_paths() {
        let key = OutputKey::Dated(feb_8());
        assert_eq!(json_path(Path::new("j"), &key), Path::new("j").join("20260208.json"));
        assert_eq!(pdf_path(Path::new("p"), &key), Path::new("p").join("20260208.pdf"));
    }

    #[test]
    fn recognizes_dated_json_names() {
        assert_eq!(dated_json_name("20260208.json"), Some(feb_8()));
        assert_eq!(dated_json_name("20261308.json"), None);
        assert_eq!(dated_json_name("manifest.json"), None);
        assert_eq!(dated_json_name("undated-x.json"), None);
        assert_eq!(dated_json_name("20260208.csv"), None);
    }

    #[test]
    fn ensure_dir_creates_nested_directories() {
        let root = tempfile::tempdir().unwrap();
        let nested = root.path().join("data").join("json");
        ensure_dir(&nested).unwrap();
        assert!(nested.is_dir());
        ensure_dir(&nested).unwrap();
    }
}
