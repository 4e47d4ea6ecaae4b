#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! PDF loading for daily crime reports.
//!
//! The county publishes its daily report as a short PDF whose first page
//! carries the report date and whose body is a single offense-statistics
//! table, sometimes continued onto later pages. This crate opens the PDF
//! with pure-Rust text extraction ([`pdf_extract`]) and exposes the text of
//! each page through [`ReportDocument`]. The [`text_table`] module splits
//! the extracted lines into table cells.

pub mod text_table;

use std::path::{Path, PathBuf};

/// How far into the file the `%PDF-` marker may appear.
const PDF_MARKER_WINDOW: usize = 1024;

/// Errors raised while opening a PDF.
#[derive(Debug, thiserror::Error)]
pub enum PdfError {
    /// The file could not be read from disk.
    #[error("failed to read {}: {source}", path.display())]
    Read {
        /// Path that was being read.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The bytes are not a PDF or its text could not be extracted.
    #[error("not a readable PDF document: {0}")]
    Extraction(String),
}

/// An opened report: the extracted text of each page, in page order.
///
/// The source bytes are only held while [`ReportDocument::from_bytes`]
/// runs; once constructed the document owns plain strings and is released
/// when dropped.
#[derive(Debug, Clone)]
pub struct ReportDocument {
    pages: Vec<String>,
    file_name: Option<String>,
}

impl ReportDocument {
    /// Opens the PDF at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`PdfError::Read`] if the file cannot be read and
    /// [`PdfError::Extraction`] if it is not a readable PDF.
    pub fn open(path: &Path) -> Result<Self, PdfError> {
        let bytes = std::fs::read(path).map_err(|source| PdfError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        log::debug!("Read {} bytes from {}", bytes.len(), path.display());

        let mut document = Self::from_bytes(&bytes)?;
        document.file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned());
        Ok(document)
    }

    /// Extracts the per-page text of an in-memory PDF.
    ///
    /// # Errors
    ///
    /// Returns [`PdfError::Extraction`] if the bytes do not carry a PDF
    /// header, the text cannot be extracted, or the document has no pages.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, PdfError> {
        let window = &bytes[..bytes.len().min(PDF_MARKER_WINDOW)];
        if !window.windows(5).any(|w| w == b"%PDF-") {
            return Err(PdfError::Extraction("missing %PDF- header".to_string()));
        }

        // pdf-extract panics on some malformed content streams.
        let pages = std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem_by_pages(bytes))
            .map_err(|_| PdfError::Extraction("text extraction panicked".to_string()))?
            .map_err(|e| PdfError::Extraction(format!("failed to extract text from PDF: {e}")))?;

        if pages.is_empty() {
            return Err(PdfError::Extraction("document has no pages".to_string()));
        }

        log::debug!(
            "Extracted {} page(s), {} characters of text",
            pages.len(),
            pages.iter().map(String::len).sum::<usize>()
        );

        Ok(Self {
            pages,
            file_name: None,
        })
    }

    /// Builds a document from already-extracted page text.
    #[must_use]
    pub const fn from_pages(pages: Vec<String>) -> Self {
        Self {
            pages,
            file_name: None,
        }
    }

    /// Sets the file name reported for this document.
    #[must_use]
    pub fn with_file_name(mut self, name: &str) -> Self {
        self.file_name = Some(name.to_owned());
        self
    }

    /// Text of every page, in page order.
    #[must_use]
    pub fn pages(&self) -> &[String] {
        &self.pages
    }

    #[must_use]
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Text of the first page, if the document has any pages.
    #[must_use]
    pub fn first_page(&self) -> Option<&str> {
        self.pages.first().map(String::as_str)
    }

    /// File name (without directories) the document was opened from.
    #[must_use]
    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }
}
