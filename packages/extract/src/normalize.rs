//! Row normalization: raw cell strings to a typed [`StatisticRecord`].
//!
//! Each cell is resolved exactly once into a [`Cell`]. A cell that fails to
//! parse only blanks its own field; the rest of the row is kept and the
//! failure is reported alongside the record.

use crime_report_models::{DailyCount, StatisticRecord, YtdCount};

use crate::columns::{ColumnKind, ColumnLayout};
use crate::table::RawTableRow;

/// Placeholders printed for "not applicable" in change columns.
const PLACEHOLDERS: &[&str] = &["n/a", "na", "-", "--", "\u{2014}"];

/// A resolved table cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell<T> {
    Present(T),
    /// Empty cell, or a column missing from this row.
    Absent,
    /// Non-empty text that could not be parsed.
    Invalid(String),
}

impl<T> Cell<T> {
    /// The parsed value, if any.
    pub fn value(self) -> Option<T> {
        match self {
            Self::Present(value) => Some(value),
            Self::Absent | Self::Invalid(_) => None,
        }
    }
}

fn is_placeholder(raw: &str) -> bool {
    PLACEHOLDERS.iter().any(|p| raw.eq_ignore_ascii_case(p))
}

/// Strips thousands separators when they are well-formed (`1,234`).
fn strip_separators(digits: &str) -> Option<String> {
    if !digits.contains(',') {
        return Some(digits.to_owned());
    }
    let mut groups = digits.split(',');
    let head = groups.next()?;
    if head.is_empty() || head.len() > 3 {
        return None;
    }
    let mut out = head.to_owned();
    for group in groups {
        if group.len() != 3 {
            return None;
        }
        out.push_str(group);
    }
    Some(out)
}

fn parse_digits<T: std::str::FromStr>(digits: &str) -> Option<T> {
    let digits = strip_separators(digits)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Parses a non-negative count such as `12` or `1,234`.
#[must_use]
pub fn parse_count(raw: &str) -> Cell<u32> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Cell::Absent;
    }
    parse_digits(raw).map_or_else(|| Cell::Invalid(raw.to_owned()), Cell::Present)
}

/// Parses a signed difference such as `+3` or `-12`. `N/A`-style
/// placeholders are blank.
#[must_use]
pub fn parse_signed(raw: &str) -> Cell<i64> {
    let raw = raw.trim();
    if raw.is_empty() || is_placeholder(raw) {
        return Cell::Absent;
    }
    let (negative, digits) = match raw.as_bytes()[0] {
        b'-' => (true, &raw[1..]),
        b'+' => (false, &raw[1..]),
        _ => (false, raw),
    };
    match parse_digits::<i64>(digits.trim_start()) {
        Some(value) if negative => Cell::Present(-value),
        Some(value) => Cell::Present(value),
        None => Cell::Invalid(raw.to_owned()),
    }
}

/// Parses a percentage such as `+50%` or `-12.5%` into `50.0` / `-12.5`.
/// `N/A`-style placeholders are blank.
#[must_use]
pub fn parse_percent(raw: &str) -> Cell<f64> {
    let raw = raw.trim();
    if raw.is_empty() || is_placeholder(raw) {
        return Cell::Absent;
    }
    let number = raw.trim_end_matches('%').trim().trim_start_matches('+');
    let number = number.replace(',', "");
    match number.parse::<f64>() {
        Ok(value) if value.is_finite() => Cell::Present(value),
        _ => Cell::Invalid(raw.to_owned()),
    }
}

/// A row that could not be normalized, or a cell within it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RowNormalizationError {
    #[error("row on page {page} has no offense type")]
    MissingOffense { page: usize },

    #[error("{offense_type}: could not parse '{raw}' in column '{column}'")]
    InvalidCell {
        offense_type: String,
        column: String,
        raw: String,
    },

    #[error("{offense_type}: ignored {extra} cell(s) beyond the table's {columns} columns")]
    ExtraCells {
        offense_type: String,
        extra: usize,
        columns: usize,
    },

    #[error("{offense_type}: found {found} of {expected} cells; values may be in the wrong columns")]
    MissingCells {
        offense_type: String,
        found: usize,
        expected: usize,
    },
}

/// A normalized record plus the cell-level failures found in its row.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedRow {
    pub record: StatisticRecord,
    pub errors: Vec<RowNormalizationError>,
}

/// Maps one raw row onto the table's columns.
///
/// Cells are matched to columns by position. A row with fewer cells than
/// the header leaves its trailing columns blank and is reported as
/// [`RowNormalizationError::MissingCells`], since a gap anywhere in the row
/// shifts every later value. Cells beyond the header count are reported as
/// [`RowNormalizationError::ExtraCells`].
///
/// # Errors
///
/// Returns [`RowNormalizationError::MissingOffense`] if the first cell is
/// empty.
pub fn normalize_row(
    row: &RawTableRow,
    layout: &ColumnLayout,
) -> Result<NormalizedRow, RowNormalizationError> {
    let offense_type = row.offense_type().trim();
    if offense_type.is_empty() {
        return Err(RowNormalizationError::MissingOffense { page: row.page });
    }

    let mut record = StatisticRecord::new(offense_type);
    let mut errors = Vec::new();

    for (index, (label, kind)) in layout.columns().enumerate().skip(1) {
        let raw = row.cells.get(index).map_or("", String::as_str);
        let mut count = || check(parse_count(raw), offense_type, label, &mut errors);
        match kind {
            ColumnKind::Daily => record.daily_counts.push(DailyCount::new(label, count())),
            ColumnKind::SevenDayTotal => record.seven_day_total = Some(count()),
            ColumnKind::PrevSevenDayTotal => record.prev_seven_day_total = Some(count()),
            ColumnKind::YtdCurrent(year) => {
                record.ytd_current_year = Some(YtdCount::new(year, count()));
            }
            ColumnKind::YtdPrior(year) => {
                record.ytd_prior_year = Some(YtdCount::new(year, count()));
            }
            ColumnKind::Change => {
                record.change = Some(check(parse_signed(raw), offense_type, label, &mut errors));
            }
            ColumnKind::PercentChange => {
                record.percent_change =
                    Some(check(parse_percent(raw), offense_type, label, &mut errors));
            }
            ColumnKind::Offense | ColumnKind::Other => {}
        }
    }

    if row.cells.len() > layout.len() {
        errors.push(RowNormalizationError::ExtraCells {
            offense_type: offense_type.to_owned(),
            extra: row.cells.len() - layout.len(),
            columns: layout.len(),
        });
    } else if row.cells.len() < layout.len() {
        errors.push(RowNormalizationError::MissingCells {
            offense_type: offense_type.to_owned(),
            found: row.cells.len(),
            expected: layout.len(),
        });
    }

    Ok(NormalizedRow { record, errors })
}

fn check<T>(
    cell: Cell<T>,
    offense_type: &str,
    column: &str,
    errors: &mut Vec<RowNormalizationError>,
) -> Option<T> {
    if let Cell::Invalid(raw) = &cell {
        errors.push(RowNormalizationError::InvalidCell {
            offense_type: offense_type.to_owned(),
            column: column.to_owned(),
            raw: raw.clone(),
        });
    }
    cell.value()
}
