//! CSV export of stored reports for spreadsheet use.
//!
//! Each offense row becomes one CSV row carrying the report's date and
//! date text. Nested values are flattened with `.`-joined keys and lists
//! are joined with `", "`. Columns are the union over all rows: the key
//! columns first, then everything else sorted.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::manifest::MANIFEST_FILE;
use crate::{StoreError, write_atomic};

const REPORT_KEY_COLUMNS: &[&str] = &["report_date", "offense_type"];
const COMBINED_KEY_COLUMNS: &[&str] = &["report_date", "offense_type", "source_file"];

/// File name of the combined export.
pub const COMBINED_FILE: &str = "combined.csv";

type CsvRow = BTreeMap<String, String>;

/// Totals for a multi-file export.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExportSummary {
    /// CSV files written.
    pub files: usize,
    /// JSON reports skipped because they had no statistics.
    pub skipped: usize,
    /// Data rows written.
    pub rows: usize,
}

/// Lists every report JSON file in `dir` (dated or not), sorted by name.
///
/// # Errors
///
/// Returns [`StoreError::Io`] if the directory cannot be read.
pub fn report_json_files(dir: &Path) -> Result<Vec<PathBuf>, StoreError> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(StoreError::io(dir))? {
        let path = entry.map_err(StoreError::io(dir))?.path();
        let is_json = path.extension().is_some_and(|ext| ext == "json");
        let is_manifest = path.file_name().is_some_and(|name| name == MANIFEST_FILE);
        if is_json && !is_manifest && path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Converts one JSON report to CSV.
///
/// Returns the number of rows written. A report without statistics is
/// skipped with a warning, writes nothing, and returns `0`.
///
/// # Errors
///
/// Returns [`StoreError`] if the report cannot be read or the CSV cannot be
/// written.
pub fn export_report(json_path: &Path, csv_path: &Path) -> Result<usize, StoreError> {
    let document = read_json(json_path)?;
    let rows = report_rows(&document, None);
    if rows.is_empty() {
        log::warn!("No crime statistics found in {}", json_path.display());
        return Ok(0);
    }

    write_rows(&rows, REPORT_KEY_COLUMNS, csv_path)?;
    log::info!(
        "Converted {} to {} ({} rows)",
        json_path.display(),
        csv_path.display(),
        rows.len()
    );
    Ok(rows.len())
}

/// Converts every report in `json_dir` to `csv_dir/<stem>.csv`.
///
/// # Errors
///
/// Returns [`StoreError`] on the first report that fails to convert.
pub fn export_dir(json_dir: &Path, csv_dir: &Path) -> Result<ExportSummary, StoreError> {
    let mut summary = ExportSummary::default();
    let files = report_json_files(json_dir)?;
    if files.is_empty() {
        log::warn!("No JSON reports found in {}", json_dir.display());
    }

    for json_path in files {
        let stem = json_path
            .file_stem()
            .map_or_else(|| "report".into(), |s| s.to_string_lossy());
        let csv_path = csv_dir.join(format!("{stem}.csv"));
        match export_report(&json_path, &csv_path)? {
            0 => summary.skipped += 1,
            rows => {
                summary.files += 1;
                summary.rows += rows;
            }
        }
    }

    log::info!(
        "Converted {} report(s) to CSV, skipped {}",
        summary.files,
        summary.skipped
    );
    Ok(summary)
}

/// Combines every report in `json_dir` into one CSV with a `source_file`
/// column naming the JSON file each row came from.
///
/// Returns the number of rows written; nothing is written when no report
/// has statistics.
///
/// # Errors
///
/// Returns [`StoreError`] if a report cannot be read or the CSV cannot be
/// written.
pub fn export_combined(json_dir: &Path, output: &Path) -> Result<usize, StoreError> {
    let mut rows = Vec::new();
    let files = report_json_files(json_dir)?;

    for json_path in &files {
        let name = json_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let document = read_json(json_path)?;
        let report = report_rows(&document, Some(&name));
        if report.is_empty() {
            log::warn!("No crime statistics found in {}", json_path.display());
        }
        rows.extend(report);
    }

    if rows.is_empty() {
        log::warn!("No crime statistics found in any report in {}", json_dir.display());
        return Ok(0);
    }

    write_rows(&rows, COMBINED_KEY_COLUMNS, output)?;
    log::info!(
        "Combined {} report(s) into {} ({} rows)",
        files.len(),
        output.display(),
        rows.len()
    );
    Ok(rows.len())
}

fn read_json(path: &Path) -> Result<Value, StoreError> {
    let contents = std::fs::read_to_string(path).map_err(StoreError::io(path))?;
    serde_json::from_str(&contents).map_err(|source| StoreError::Json {
        path: path.to_path_buf(),
        source,
    })
}

fn report_rows(document: &Value, source_file: Option<&str>) -> Vec<CsvRow> {
    let Some(statistics) = document.get("crime_statistics").and_then(Value::as_array) else {
        return Vec::new();
    };

    statistics
        .iter()
        .map(|stat| {
            let mut row = CsvRow::new();
            for key in ["report_date", "extracted_date_text"] {
                row.insert(
                    key.to_owned(),
                    document.get(key).map(cell_text).unwrap_or_default(),
                );
            }
            if let Some(source_file) = source_file {
                row.insert("source_file".to_owned(), source_file.to_owned());
            }
            flatten("", stat, &mut row);
            row
        })
        .collect()
}

fn flatten(prefix: &str, value: &Value, row: &mut CsvRow) {
    match value {
        Value::Object(map) => {
            for (key, value) in map {
                let key = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}.{key}")
                };
                flatten(&key, value, row);
            }
        }
        other => {
            row.insert(prefix.to_owned(), cell_text(other));
        }
    }
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Array(items) => items.iter().map(cell_text).collect::<Vec<_>>().join(", "),
        other => other.to_string(),
    }
}

fn columns(rows: &[CsvRow], key_columns: &[&str]) -> Vec<String> {
    let all: BTreeSet<&str> = rows.iter().flat_map(|r| r.keys().map(String::as_str)).collect();
    key_columns
        .iter()
        .copied()
        .filter(|c| all.contains(c))
        .chain(all.iter().copied().filter(|c| !key_columns.contains(c)))
        .map(str::to_owned)
        .collect()
}

fn write_rows(rows: &[CsvRow], key_columns: &[&str], path: &Path) -> Result<(), StoreError> {
    let columns = columns(rows, key_columns);
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(&columns)?;
    for row in rows {
        writer.write_record(
            columns
                .iter()
                .map(|c| row.get(c).map_or("", String::as_str)),
        )?;
    }
    let bytes = writer.into_inner().map_err(|e| StoreError::Io {
        path: path.to_path_buf(),
        source: e.into_error(),
    })?;
    write_atomic(path, &bytes)
}
