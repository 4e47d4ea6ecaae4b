#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Extraction pipeline for the daily crime report.
//!
//! One opened [`ReportDocument`] goes in, one [`Extraction`] comes out:
//!
//! 1. [`date::extract_report_date`] resolves the report date from the first
//!    page's header.
//! 2. [`table::extract_table`] finds the offense table on every page.
//! 3. [`normalize::normalize_row`] types each row against the classified
//!    [`columns::ColumnLayout`].
//! 4. [`assemble::assemble`] builds the output document and its summary.
//!
//! Only a document that cannot be opened is an error. Everything else
//! degrades into warnings carried next to a best-effort document.

pub mod assemble;
pub mod columns;
pub mod config;
pub mod date;
pub mod normalize;
pub mod table;
pub mod warnings;

use std::path::Path;

use chrono::Datelike as _;
use crime_report_models::ReportDocumentRecord;
use crime_report_pdf::{PdfError, ReportDocument};

pub use config::{ConfigError, ExtractConfig, ExtractSettings};
pub use warnings::ExtractionWarning;

/// Fatal pipeline errors.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// The input could not be opened as a PDF.
    #[error(transparent)]
    DocumentOpen(#[from] PdfError),
}

/// The best-effort output document plus the structured warnings behind its
/// `parse_errors`.
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    pub record: ReportDocumentRecord,
    pub warnings: Vec<ExtractionWarning>,
}

impl Extraction {
    /// Number of offense rows in the document.
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.record.crime_statistics.len()
    }

    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }

    /// Returns `true` if the result should be flagged to an operator: it
    /// has warnings or fewer than `min_rows` rows.
    #[must_use]
    pub fn is_suspicious(&self, min_rows: usize) -> bool {
        !self.is_clean() || self.row_count() < min_rows
    }
}

/// Runs date, table, row, and record extraction over an opened document.
#[must_use]
pub fn extract_report(document: &ReportDocument, config: &ExtractConfig) -> Extraction {
    let date = date::extract_report_date(document.first_page().unwrap_or_default(), config);
    let report_year = date.as_ref().ok().map(|d| d.date.year());

    let table = table::extract_table(document.pages(), config);
    let layout = columns::ColumnLayout::new(&table.headers, report_year);
    let rows = table
        .rows
        .iter()
        .map(|row| normalize::normalize_row(row, &layout))
        .collect();

    let extraction = assemble::assemble(date, rows, document.file_name(), config);
    log::info!(
        "Extracted {} offense row(s) from {} page(s) with {} warning(s)",
        extraction.row_count(),
        document.page_count(),
        extraction.warnings.len()
    );
    extraction
}

/// Opens the PDF at `path` and extracts its report.
///
/// The document is released before this returns, on success or failure.
///
/// # Errors
///
/// Returns [`PipelineError::DocumentOpen`] if the file cannot be read or is
/// not a readable PDF.
pub fn process_pdf(path: &Path, config: &ExtractConfig) -> Result<Extraction, PipelineError> {
    log::info!("Processing {}", path.display());
    let document = ReportDocument::open(path)?;
    Ok(extract_report(&document, config))
}

/// Extracts the report from in-memory PDF bytes.
///
/// # Errors
///
/// Returns [`PipelineError::DocumentOpen`] if the bytes are not a readable
/// PDF.
pub fn process_pdf_bytes(
    bytes: &[u8],
    file_name: Option<&str>,
    config: &ExtractConfig,
) -> Result<Extraction, PipelineError> {
    let mut document = ReportDocument::from_bytes(bytes)?;
    if let Some(name) = file_name {
        document = document.with_file_name(name);
    }
    Ok(extract_report(&document, config))
}
