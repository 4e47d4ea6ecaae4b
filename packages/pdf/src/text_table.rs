//! Cell splitting for table lines in extracted PDF text.
//!
//! Text extraction flattens a table into one line per row. Two layouts
//! show up in practice:
//! - **Gap-separated**: columns are separated by runs of two or more
//!   spaces, tabs, or `|` ([`split_columns`])
//! - **Single-spaced**: everything is separated by single spaces, so the
//!   row is read as a text label followed by a run of value tokens
//!   ([`split_label_values`])

use std::sync::LazyLock;

use regex::Regex;

static COLUMN_SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s{2,}|\t+|\s*\|\s*").unwrap_or_else(|_| unreachable!()));

// Counts (optionally signed, with thousands separators), percentages, and
// the placeholders the county prints for "not applicable".
static VALUE_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:[+-]?(?:\d{1,3}(?:,\d{3})+|\d+)(?:\.\d+)?%?|n/?a|-{1,2}|\u{2014})$")
        .unwrap_or_else(|_| unreachable!())
});

/// Splits a line at column gaps (two or more spaces, tabs, or `|`).
///
/// Leading and trailing empty cells produced by separators at the line
/// edges are dropped; cells are trimmed.
#[must_use]
pub fn split_columns(line: &str) -> Vec<String> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }

    let trimmed = trimmed.trim_matches('|').trim();
    COLUMN_SEPARATOR
        .split(trimmed)
        .map(|cell| cell.trim().to_owned())
        .collect()
}

/// Returns `true` if `token` looks like a table value: a count, a signed
/// count, a percentage, or an `N/A`-style placeholder.
#[must_use]
pub fn is_value_token(token: &str) -> bool {
    VALUE_TOKEN.is_match(token.trim())
}

/// Splits a single-spaced line into a text label followed by its trailing
/// run of value tokens.
///
/// `columns` is the expected cell count, label included. When the trailing
/// run is shorter than that, tokens containing a digit just before it (a
/// footnoted count such as `1*`) are split off the label as cells too, so
/// later values stay in their columns. Pass `0` when the width is unknown.
///
/// Returns `None` when the line has no label or no trailing values.
///
/// ```
/// use crime_report_pdf::text_table::split_label_values;
///
/// let cells = split_label_values("Theft From Auto 3 5 0 12 +4 50%", 7).unwrap();
/// assert_eq!(cells, vec!["Theft From Auto", "3", "5", "0", "12", "+4", "50%"]);
///
/// let cells = split_label_values("Murder 0 1* 0 1 9", 6).unwrap();
/// assert_eq!(cells, vec!["Murder", "0", "1*", "0", "1", "9"]);
/// ```
#[must_use]
pub fn split_label_values(line: &str, columns: usize) -> Option<Vec<String>> {
    let tokens: Vec<&str> = line.split_whitespace().collect();

    let mut values_start = tokens
        .iter()
        .rposition(|token| !is_value_token(token))
        .map_or(0, |last_label| last_label + 1);

    if values_start == 0 || values_start == tokens.len() {
        return None;
    }

    while values_start > 1
        && tokens.len() - values_start + 1 < columns
        && tokens[values_start - 1].bytes().any(|b| b.is_ascii_digit())
    {
        values_start -= 1;
    }

    let mut cells = Vec::with_capacity(tokens.len() - values_start + 1);
    cells.push(tokens[..values_start].join(" "));
    cells.extend(tokens[values_start..].iter().map(|&t| t.to_owned()));
    Some(cells)
}

/// Collapses internal whitespace runs (including line breaks) to single
/// spaces and trims the result.
#[must_use]
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
