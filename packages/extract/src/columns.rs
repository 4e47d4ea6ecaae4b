//! Column header recognition.
//!
//! The daily report's table header looks like
//!
//! ```text
//! Offense | Mon 2/2 | ... | Sun 2/8 | 7-Day Totals | Prev. 7 1/26-2/1 | +/- | % Change | YTD 26 1/1-2/8 | YTD 25 1/1-2/8
//! ```
//!
//! Headers are classified once per table into a [`ColumnLayout`], which the
//! row normalizer then applies positionally to every row.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use crime_report_pdf::text_table::collapse_whitespace;
use regex::Regex;

/// Label used for the offense column when the header line omits one.
pub const OFFENSE_HEADER: &str = "Offense";

static DAILY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:mon|tue|wed|thu|fri|sat|sun)[a-z]*\.?,?\s+\d{1,2}/\d{1,2}(?:/\d{2,4})?$")
        .unwrap_or_else(|_| unreachable!())
});

static SEVEN_DAY_TOTAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^7\s*-?\s*days?\s*totals?$").unwrap_or_else(|_| unreachable!())
});

static PREV_SEVEN_DAY_TOTAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^prev(?:ious|\.)?\s*7(?:\b|\s*-?\s*day)").unwrap_or_else(|_| unreachable!())
});

static YTD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:ytd\s*'?(?P<year>\d{4}|\d{2})\b|(?P<year_first>\d{4})\s+ytd\b)")
        .unwrap_or_else(|_| unreachable!())
});

static CHANGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+\s*/\s*-$").unwrap_or_else(|_| unreachable!()));

static PERCENT_CHANGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:%|percent|pct\.?)\s*change$").unwrap_or_else(|_| unreachable!())
});

// Finds header cells inside a single-spaced header line.
static HEADER_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?i)(?:mon|tue|wed|thu|fri|sat|sun)[a-z]*\.?,?\s+\d{1,2}/\d{1,2}(?:/\d{2,4})?",
        r"|prev(?:ious|\.)?\s*7(?:\s*-?\s*days?)?(?:\s+totals?)?(?:\s+\d{1,2}/\d{1,2}\s*-\s*\d{1,2}/\d{1,2})?",
        r"|7\s*-?\s*days?\s*totals?",
        r"|ytd\s*'?(?:\d{4}|\d{2})(?:\s+\d{1,2}/\d{1,2}\s*-\s*\d{1,2}/\d{1,2})?",
        r"|\+\s*/\s*-",
        r"|(?:%|percent)\s*change",
    ))
    .unwrap_or_else(|_| unreachable!())
});

/// What a table column holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    /// The offense label (always the first column).
    Offense,
    /// One day's incident count, keyed by its header label.
    Daily,
    SevenDayTotal,
    PrevSevenDayTotal,
    /// Signed difference between the current and previous 7 days.
    Change,
    PercentChange,
    /// Year-to-date count for the report's year.
    YtdCurrent(i32),
    /// Year-to-date count for the year before the report's year.
    YtdPrior(i32),
    /// Unrecognized or duplicate column; ignored.
    Other,
}

/// A header's kind before year-to-date columns are resolved against the
/// report year.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HeaderKind {
    Daily,
    SevenDayTotal,
    PrevSevenDayTotal,
    Change,
    PercentChange,
    Ytd(i32),
}

fn header_kind(label: &str) -> Option<HeaderKind> {
    let label = label.trim();
    if DAILY.is_match(label) {
        Some(HeaderKind::Daily)
    } else if SEVEN_DAY_TOTAL.is_match(label) {
        Some(HeaderKind::SevenDayTotal)
    } else if PREV_SEVEN_DAY_TOTAL.is_match(label) {
        Some(HeaderKind::PrevSevenDayTotal)
    } else if CHANGE.is_match(label) {
        Some(HeaderKind::Change)
    } else if PERCENT_CHANGE.is_match(label) {
        Some(HeaderKind::PercentChange)
    } else {
        ytd_year(label).map(HeaderKind::Ytd)
    }
}

/// Extracts the year of a YTD header. Two-digit years are `2000 + YY`.
fn ytd_year(label: &str) -> Option<i32> {
    let caps = YTD.captures(label)?;
    let digits = caps.name("year").or_else(|| caps.name("year_first"))?;
    let year: i32 = digits.as_str().parse().ok()?;
    Some(if digits.len() == 2 { 2000 + year } else { year })
}

/// Returns `true` if `label` is a recognized data column header.
#[must_use]
pub fn is_known_header(label: &str) -> bool {
    header_kind(label).is_some()
}

/// Splits a single-spaced header line into header cells.
///
/// Text before the first recognized header becomes the offense column
/// label; unrecognized text between headers becomes its own cell. Returns
/// `None` if fewer than two headers are recognized.
#[must_use]
pub fn scan_header_line(line: &str) -> Option<Vec<String>> {
    let line = collapse_whitespace(line);
    let mut cells = Vec::new();
    let mut last_end = 0;
    let mut found = 0usize;

    for m in HEADER_TOKEN.find_iter(&line) {
        let between = line[last_end..m.start()].trim();
        if found == 0 {
            cells.push(if between.is_empty() {
                OFFENSE_HEADER.to_owned()
            } else {
                between.to_owned()
            });
        } else if !between.is_empty() {
            cells.push(between.to_owned());
        }
        cells.push(m.as_str().to_owned());
        last_end = m.end();
        found += 1;
    }

    if found < 2 {
        return None;
    }

    let trailing = line[last_end..].trim();
    if !trailing.is_empty() {
        cells.push(trailing.to_owned());
    }
    Some(cells)
}

/// The classified columns of one table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnLayout {
    headers: Vec<String>,
    kinds: Vec<ColumnKind>,
}

impl ColumnLayout {
    /// Classifies `headers`.
    ///
    /// The current YTD year is `report_year` when one of the headers carries
    /// it, otherwise the latest YTD year in the headers; the prior year is
    /// the one before it. Any other YTD column, and every repeat of an
    /// already-seen column, is [`ColumnKind::Other`].
    #[must_use]
    pub fn new(headers: &[String], report_year: Option<i32>) -> Self {
        let headers: Vec<String> = headers.iter().map(|h| collapse_whitespace(h)).collect();
        let raw: Vec<Option<HeaderKind>> = headers
            .iter()
            .skip(1)
            .map(|h| header_kind(h))
            .collect();

        let ytd_years: BTreeSet<i32> = raw
            .iter()
            .filter_map(|kind| match kind {
                Some(HeaderKind::Ytd(year)) => Some(*year),
                _ => None,
            })
            .collect();
        let current_year = report_year
            .filter(|year| ytd_years.contains(year))
            .or_else(|| ytd_years.last().copied());

        let mut kinds = Vec::with_capacity(headers.len());
        if !headers.is_empty() {
            kinds.push(ColumnKind::Offense);
        }

        let mut seen_daily = BTreeSet::new();
        let mut seen = Vec::new();
        for (label, kind) in headers.iter().skip(1).zip(raw) {
            let kind = match kind {
                Some(HeaderKind::Daily) if seen_daily.insert(label.to_lowercase()) => {
                    ColumnKind::Daily
                }
                Some(HeaderKind::Daily) | None => ColumnKind::Other,
                Some(HeaderKind::SevenDayTotal) => ColumnKind::SevenDayTotal,
                Some(HeaderKind::PrevSevenDayTotal) => ColumnKind::PrevSevenDayTotal,
                Some(HeaderKind::Change) => ColumnKind::Change,
                Some(HeaderKind::PercentChange) => ColumnKind::PercentChange,
                Some(HeaderKind::Ytd(year)) => match current_year {
                    Some(current) if year == current => ColumnKind::YtdCurrent(year),
                    Some(current) if year == current - 1 => ColumnKind::YtdPrior(year),
                    _ => ColumnKind::Other,
                },
            };

            let kind = if kind != ColumnKind::Daily && kind != ColumnKind::Other {
                if seen.contains(&kind) {
                    ColumnKind::Other
                } else {
                    seen.push(kind);
                    kind
                }
            } else {
                kind
            };

            if kind == ColumnKind::Other {
                log::warn!("Ignoring unrecognized or duplicate column '{label}'");
            }
            kinds.push(kind);
        }

        Self { headers, kinds }
    }

    #[must_use]
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    #[must_use]
    pub fn kinds(&self) -> &[ColumnKind] {
        &self.kinds
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.headers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }

    /// Iterates `(header label, kind)` pairs in column order.
    pub fn columns(&self) -> impl Iterator<Item = (&str, ColumnKind)> {
        self.headers
            .iter()
            .map(String::as_str)
            .zip(self.kinds.iter().copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout(headers: &[&str], report_year: Option<i32>) -> ColumnLayout {
        let headers: Vec<String> = headers.iter().map(|&h| h.to_owned()).collect();
        ColumnLayout::new(&headers, report_year)
    }

    #[test]
    fn recognizes_header_variants() {
        for label in [
            "Mon 2/2",
            "Monday 2/2",
            "SUNDAY 2/8/2026",
            "7-Day Totals",
            "7 Day Total",
            "Prev. 7 1/26-2/1",
            "Previous 7 Days",
            "YTD 26 1/1-2/8",
            "YTD 2025",
            "+/-",
            "% Change",
        ] {
            assert!(is_known_header(label), "{label}");
        }
        for label in ["Offense", "Murder", "Total", "2/2", "Page 1 of 2"] {
            assert!(!is_known_header(label), "{label}");
        }
    }

    #[test]
    fn two_digit_ytd_years_are_in_this_century() {
        assert_eq!(ytd_year("YTD 26 1/1-2/8"), Some(2026));
        assert_eq!(ytd_year("YTD '25"), Some(2025));
        assert_eq!(ytd_year("2024 YTD"), Some(2024));
        assert_eq!(ytd_year("YTD"), None);
    }

    #[test]
    fn classifies_the_reference_table() {
        let layout = layout(
            &["Offense", "Mon 2/2", "Tue 2/3", "Wed 2/4", "7-Day Totals", "YTD 26 1/1-2/8"],
            None,
        );
        assert_eq!(
            layout.kinds(),
            [
                ColumnKind::Offense,
                ColumnKind::Daily,
                ColumnKind::Daily,
                ColumnKind::Daily,
                ColumnKind::SevenDayTotal,
                ColumnKind::YtdCurrent(2026),
            ]
        );
    }

    #[test]
    fn report_year_picks_current_and_prior() {
        let layout = layout(&["Offense", "YTD 24", "YTD 25", "YTD 26"], Some(2025));
        assert_eq!(
            layout.kinds()[1..],
            [
                ColumnKind::YtdPrior(2024),
                ColumnKind::YtdCurrent(2025),
                ColumnKind::Other,
            ]
        );
    }

    #[test]
    fn unmatched_report_year_falls_back_to_latest() {
        let layout = layout(&["Offense", "YTD 25", "YTD 26"], Some(2030));
        assert_eq!(
            layout.kinds()[1..],
            [ColumnKind::YtdPrior(2025), ColumnKind::YtdCurrent(2026)]
        );
    }

    #[test]
    fn duplicates_and_unknowns_are_ignored() {
        let layout = layout(
            &["Offense", "Mon 2/2", "Mon  2/2", "7-Day Totals", "7-Day Total", "Notes"],
            None,
        );
        assert_eq!(
            layout.kinds(),
            [
                ColumnKind::Offense,
                ColumnKind::Daily,
                ColumnKind::Other,
                ColumnKind::SevenDayTotal,
                ColumnKind::Other,
                ColumnKind::Other,
            ]
        );
        assert_eq!(layout.headers()[2], "Mon 2/2");
    }

    #[test]
    fn scans_single_spaced_header_line() {
        let cells = scan_header_line(
            "Offense Mon 2/2 Tue 2/3 7-Day Totals Prev. 7 1/26-2/1 +/- % Change YTD 26 1/1-2/8 YTD 25 1/1-2/8",
        )
        .unwrap();
        assert_eq!(
            cells,
            vec![
                "Offense",
                "Mon 2/2",
                "Tue 2/3",
                "7-Day Totals",
                "Prev. 7 1/26-2/1",
                "+/-",
                "% Change",
                "YTD 26 1/1-2/8",
                "YTD 25 1/1-2/8",
            ]
        );
    }

    #[test]
    fn scan_defaults_offense_label() {
        let cells = scan_header_line("Mon 2/2 Tue 2/3").unwrap();
        assert_eq!(cells, vec!["Offense", "Mon 2/2", "Tue 2/3"]);
    }

    #[test]
    fn scan_requires_two_headers() {
        assert_eq!(scan_header_line("Daily Crime Report Sunday 2/8"), None);
        assert_eq!(scan_header_line("Murder 0 1 2"), None);
    }
}
