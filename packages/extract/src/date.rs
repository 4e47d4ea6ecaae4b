//! Header date extraction.
//!
//! The report date is printed near the top of the first page, usually as
//! `Sunday, February 8, 2026`. Configured patterns are tried in priority
//! order against the leading header text; the first match that resolves to
//! a real calendar date wins. Every other pattern is still evaluated so that
//! a header carrying two different dates can be flagged instead of silently
//! resolved.

use chrono::NaiveDate;
use crime_report_pdf::text_table::collapse_whitespace;
use regex::{Captures, Regex};

use crate::config::{ConfigError, ExtractConfig};

const REQUIRED_GROUPS: [&str; 3] = ["month", "day", "year"];

const MONTH_NAMES: [&str; 12] = [
    "january",
    "february",
    "march",
    "april",
    "may",
    "june",
    "july",
    "august",
    "september",
    "october",
    "november",
    "december",
];

/// A compiled header date pattern.
#[derive(Debug, Clone)]
pub struct DatePattern {
    name: String,
    regex: Regex,
    has_date_group: bool,
}

impl DatePattern {
    /// Compiles a date pattern.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Pattern`] if the regex is invalid and
    /// [`ConfigError::MissingGroup`] if it lacks a `month`, `day`, or `year`
    /// named group.
    pub fn new(name: &str, pattern: &str) -> Result<Self, ConfigError> {
        let regex = Regex::new(pattern).map_err(|source| ConfigError::Pattern {
            name: name.to_owned(),
            source,
        })?;

        let groups: Vec<&str> = regex.capture_names().flatten().collect();
        if let Some(group) = REQUIRED_GROUPS.into_iter().find(|g| !groups.contains(g)) {
            return Err(ConfigError::MissingGroup {
                name: name.to_owned(),
                group,
            });
        }

        Ok(Self {
            name: name.to_owned(),
            has_date_group: groups.contains(&"date"),
            regex,
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the first match in `text` that resolves to a valid date.
    ///
    /// Matches that do not resolve (e.g. `February 30`) are logged and
    /// skipped.
    #[must_use]
    pub fn find(&self, text: &str) -> Option<DateCandidate> {
        self.regex.captures_iter(text).find_map(|caps| {
            let resolved = resolve(&caps);
            let matched = self.matched_text(&caps);
            if resolved.is_none() {
                log::debug!(
                    "Date pattern '{}' matched '{matched}' but it is not a valid date",
                    self.name
                );
            }
            resolved.map(|date| DateCandidate {
                pattern: self.name.clone(),
                date,
                text: matched.to_owned(),
            })
        })
    }

    fn matched_text<'t>(&self, caps: &Captures<'t>) -> &'t str {
        self.has_date_group
            .then(|| caps.name("date"))
            .flatten()
            .or_else(|| caps.get(0))
            .map_or("", |m| m.as_str())
    }
}

/// A date found by one pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateCandidate {
    /// Name of the pattern that produced this date.
    pub pattern: String,
    pub date: NaiveDate,
    /// The literal header text that matched.
    pub text: String,
}

/// The resolved report date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedDate {
    pub date: NaiveDate,
    /// The literal header text the date was resolved from.
    pub text: String,
    /// Name of the winning pattern.
    pub pattern: String,
    /// Lower-priority matches that resolved to a different date.
    pub conflicts: Vec<DateCandidate>,
}

impl ExtractedDate {
    #[must_use]
    pub fn is_ambiguous(&self) -> bool {
        !self.conflicts.is_empty()
    }
}

/// No configured pattern produced a valid date.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("could not extract report date from header text \"{snippet}\"")]
pub struct DateExtractionError {
    /// Leading portion of the scanned header, for diagnostics.
    pub snippet: String,
}

const SNIPPET_CHARS: usize = 80;

/// Resolves the report date from the text of the first page.
///
/// Only the first `header_chars` characters are scanned, with whitespace
/// runs collapsed so a date split across lines still matches.
///
/// # Errors
///
/// Returns [`DateExtractionError`] if no pattern matches a valid date.
pub fn extract_report_date(
    first_page: &str,
    config: &ExtractConfig,
) -> Result<ExtractedDate, DateExtractionError> {
    let leading: String = first_page.chars().take(config.header_chars()).collect();
    let header = collapse_whitespace(&leading);

    let mut candidates = config
        .date_patterns()
        .iter()
        .filter_map(|pattern| pattern.find(&header));

    let Some(winner) = candidates.next() else {
        return Err(DateExtractionError {
            snippet: header.chars().take(SNIPPET_CHARS).collect(),
        });
    };

    let conflicts: Vec<DateCandidate> = candidates.filter(|c| c.date != winner.date).collect();

    log::debug!(
        "Report date {} from '{}' (pattern '{}')",
        winner.date,
        winner.text,
        winner.pattern
    );

    Ok(ExtractedDate {
        date: winner.date,
        text: winner.text,
        pattern: winner.pattern,
        conflicts,
    })
}

fn resolve(caps: &Captures<'_>) -> Option<NaiveDate> {
    let month = month_number(caps.name("month")?.as_str())?;
    let day: u32 = caps.name("day")?.as_str().parse().ok()?;
    let year: i32 = caps.name("year")?.as_str().parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Resolves a month given as a number, a full name, or an abbreviation of
/// at least three letters (`Feb`, `Sept`).
fn month_number(text: &str) -> Option<u32> {
    if let Ok(number) = text.parse::<u32>() {
        return (1..=12).contains(&number).then_some(number);
    }

    let lower = text.trim_end_matches('.').to_lowercase();
    if lower.len() < 3 {
        return None;
    }
    MONTH_NAMES
        .iter()
        .position(|name| name.starts_with(&lower))
        .and_then(|index| u32::try_from(index + 1).ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn extract(text: &str) -> Result<ExtractedDate, DateExtractionError> {
        extract_report_date(text, &ExtractConfig::default())
    }

    #[test]
    fn resolves_weekday_month_day_year() {
        let found = extract("Sunday, February 8, 2026").unwrap();
        assert_eq!(found.date, date(2026, 2, 8));
        assert_eq!(found.text, "Sunday, February 8, 2026");
        assert_eq!(found.pattern, "weekday_month_day_year");
        assert!(!found.is_ambiguous());
    }

    #[test]
    fn resolves_date_split_across_lines() {
        let found = extract("Prince George's County Police\nDaily Crime Report\nSunday, February\n8, 2026\nOffense").unwrap();
        assert_eq!(found.date, date(2026, 2, 8));
        assert_eq!(found.text, "Sunday, February 8, 2026");
    }

    #[test]
    fn accepts_abbreviated_months() {
        assert_eq!(extract("Report for Feb. 8, 2026").unwrap().date, date(2026, 2, 8));
        assert_eq!(extract("Sept 30, 2025").unwrap().date, date(2025, 9, 30));
        assert_eq!(extract("Sat, dec 6, 2025").unwrap().date, date(2025, 12, 6));
    }

    #[test]
    fn labeled_numeric_keeps_only_the_date_text() {
        let found = extract("Daily Report Date: 2/8/2026").unwrap();
        assert_eq!(found.date, date(2026, 2, 8));
        assert_eq!(found.text, "2/8/2026");
        assert_eq!(found.pattern, "labeled_numeric");
    }

    #[test]
    fn priority_order_beats_text_position() {
        let found = extract("Printed 2/8/2026 for Sunday, February 8, 2026").unwrap();
        assert_eq!(found.pattern, "weekday_month_day_year");
        assert!(!found.is_ambiguous());
    }

    #[test]
    fn flags_patterns_that_disagree() {
        let found = extract("Generated 2/9/2026 Sunday, February 8, 2026").unwrap();
        assert_eq!(found.date, date(2026, 2, 8));
        assert_eq!(found.conflicts.len(), 1);
        assert_eq!(found.conflicts[0].date, date(2026, 2, 9));
        assert_eq!(found.conflicts[0].pattern, "numeric");
    }

    #[test]
    fn invalid_match_falls_through_to_next_pattern() {
        let found = extract("Monday, February 30, 2026 (as of 3/2/2026)").unwrap();
        assert_eq!(found.date, date(2026, 3, 2));
        assert_eq!(found.pattern, "numeric");
    }

    #[test]
    fn only_scans_leading_header() {
        let mut text = "x".repeat(600);
        text.push_str(" Sunday, February 8, 2026");
        let err = extract(&text).unwrap_err();
        assert_eq!(err.snippet.len(), SNIPPET_CHARS);
    }

    #[test]
    fn no_date_is_an_error() {
        let err = extract("Daily Crime Report\nOffense Mon 2/2").unwrap_err();
        assert!(err.to_string().contains("Daily Crime Report"));
    }

    #[test]
    fn month_lookup() {
        assert_eq!(month_number("February"), Some(2));
        assert_eq!(month_number("FEB"), Some(2));
        assert_eq!(month_number("Sept."), Some(9));
        assert_eq!(month_number("12"), Some(12));
        assert_eq!(month_number("13"), None);
        assert_eq!(month_number("Ma"), None);
        assert_eq!(month_number("Report"), None);
        assert_eq!(month_number("Marching"), None);
    }
}
