//! Offense-table extraction from page text.
//!
//! Every page is scanned, even after the table has been found, because
//! long reports continue the table onto later pages. The first header line
//! fixes the column labels; header lines repeated on continuation pages
//! are skipped.

use crime_report_pdf::text_table::{
    collapse_whitespace, is_value_token, split_columns, split_label_values,
};

use crate::columns::{OFFENSE_HEADER, is_known_header, scan_header_line};
use crate::config::ExtractConfig;

/// One offense line's cells, untyped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawTableRow {
    /// 1-based page number the row was found on.
    pub page: usize,
    /// Cell text in column order; the first cell is the offense label.
    pub cells: Vec<String>,
}

impl RawTableRow {
    #[must_use]
    pub fn offense_type(&self) -> &str {
        self.cells.first().map_or("", String::as_str)
    }
}

/// The offense table: its column headers and data rows in page order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTable {
    /// Column labels, whitespace-collapsed. Empty if no header was found.
    pub headers: Vec<String>,
    pub rows: Vec<RawTableRow>,
}

impl RawTable {
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Extracts the offense table from the text of every page.
#[must_use]
pub fn extract_table(pages: &[String], config: &ExtractConfig) -> RawTable {
    let mut table = RawTable::default();

    for (page_index, text) in pages.iter().enumerate() {
        let page = page_index + 1;
        let before = table.rows.len();

        for line in text.lines() {
            if line.trim().is_empty() {
                continue;
            }

            if let Some(headers) = header_cells(line) {
                if table.headers.is_empty() {
                    log::debug!("Table header on page {page}: {headers:?}");
                    table.headers = headers;
                } else {
                    log::trace!("Skipping repeated header on page {page}");
                }
                continue;
            }

            if table.headers.is_empty() {
                continue;
            }

            let Some(cells) = row_cells(line, table.headers.len()) else {
                continue;
            };

            if is_structural(&cells[0], &table.headers, config) {
                log::trace!("Skipping structural row '{}' on page {page}", cells[0]);
                continue;
            }

            table.rows.push(RawTableRow { page, cells });
        }

        log::debug!("Page {page}: {} row(s)", table.rows.len() - before);
    }

    if table.headers.is_empty() {
        log::warn!("No offense table header found in {} page(s)", pages.len());
    }

    table
}

/// Returns the header cells if `line` is a table header line.
fn header_cells(line: &str) -> Option<Vec<String>> {
    let gap = split_columns(line);
    let known = gap.iter().skip(1).filter(|c| is_known_header(c)).count();

    let mut cells = if known >= 2 && known + 1 == gap.len() {
        gap
    } else if let Some(scanned) = scan_header_line(line) {
        scanned
    } else if known >= 2 {
        gap
    } else {
        return None;
    };

    if cells.first().is_some_and(|c| is_known_header(c)) {
        cells.insert(0, OFFENSE_HEADER.to_owned());
    }
    Some(cells.iter().map(|c| collapse_whitespace(c)).collect())
}

/// Splits a candidate data line into cells, or returns `None` if it does
/// not look like a table row.
fn row_cells(line: &str, width: usize) -> Option<Vec<String>> {
    let gap = split_columns(line);
    let cells = if gap.len() == width && !gap[0].is_empty() && !is_value_token(&gap[0]) {
        gap
    } else {
        split_label_values(line, width)?
    };

    let required = width.saturating_sub(1).div_ceil(2).max(1);
    let values = cells.iter().skip(1).filter(|c| is_value_token(c)).count();
    (values >= required).then_some(cells)
}

fn is_structural(label: &str, headers: &[String], config: &ExtractConfig) -> bool {
    let label = collapse_whitespace(label);
    label.is_empty()
        || config.is_structural_label(&label)
        || headers.iter().any(|h| h.eq_ignore_ascii_case(&label))
}
