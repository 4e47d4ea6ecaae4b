#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Record types for the daily crime report pipeline.
//!
//! A processed PDF becomes exactly one [`ReportDocumentRecord`], written to
//! disk as `YYYYMMDD.json` and consumed read-only by the dashboard. The
//! per-offense rows are [`StatisticRecord`]s whose JSON keys follow the
//! source table's column headers (see [`statistic`]).

pub mod statistic;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

pub use statistic::{DailyCount, StatisticRecord, YtdCount};

/// Version of the JSON document layout. Bumped on field removal or rename;
/// additive fields keep the current version.
pub const SCHEMA_VERSION: u32 = 1;

const fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

/// Summary category an offense label can be classified into.
///
/// Classification is static configuration: each category owns a fixed set
/// of offense labels, matched case-insensitively against the table's
/// offense column.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum CrimeCategory {
    /// Crimes against persons (murder, rape, robbery, assault, shootings)
    Violent,
    /// Crimes against property (burglary, theft, stolen autos, arson)
    Property,
}

/// Derived counts over the statistics of one report.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSummary {
    /// Number of statistic records, including partially normalized ones.
    pub total_offense_types: usize,
    /// Number of records whose offense label is in the violent set.
    pub violent_crime_count: usize,
    /// Number of records whose offense label is in the property set.
    pub property_crime_count: usize,
    /// The offense labels counted in `violent_crime_count`, in table order.
    #[serde(default)]
    pub violent_crimes: Vec<String>,
    /// The offense labels counted in `property_crime_count`, in table order.
    #[serde(default)]
    pub property_crimes: Vec<String>,
}

/// The output document for one processed PDF.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportDocumentRecord {
    /// Layout version of this document.
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    /// The calendar date the report covers, `None` when no header date
    /// could be resolved.
    pub report_date: Option<NaiveDate>,
    /// The literal header text the report date was resolved from.
    pub extracted_date_text: Option<String>,
    /// File name (not path) of the processed PDF.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_file: Option<String>,
    /// One record per offense row, in source table order.
    pub crime_statistics: Vec<StatisticRecord>,
    /// Derived counts.
    pub summary: ReportSummary,
    /// Human-readable descriptions of everything that failed normalization.
    pub parse_errors: Vec<String>,
}

impl ReportDocumentRecord {
    /// Creates an empty document with no date and no statistics.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            report_date: None,
            extracted_date_text: None,
            source_file: None,
            crime_statistics: Vec::new(),
            summary: ReportSummary {
                total_offense_types: 0,
                violent_crime_count: 0,
                property_crime_count: 0,
                violent_crimes: Vec::new(),
                property_crimes: Vec::new(),
            },
            parse_errors: Vec::new(),
        }
    }

    /// Returns `true` if nothing failed during extraction.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.parse_errors.is_empty()
    }
}

/// Formats a report date as the `YYYYMMDD` output file key.
#[must_use]
pub fn file_key(date: NaiveDate) -> String {
    date.format("%Y%m%d").to_string()
}

#[cfg(test)]
mod tests {
    use std::str::FromStr as _;

    use super::*;

    fn sample_document() -> ReportDocumentRecord {
        let mut murder = StatisticRecord::new("Murder");
        murder.daily_counts.push(DailyCount::new("Mon 2/2", Some(0)));
        murder.daily_counts.push(DailyCount::new("Tue 2/3", Some(1)));
        murder.seven_day_total = Some(Some(1));
        murder.ytd_current_year = Some(YtdCount::new(2026, Some(9)));
        murder.ytd_prior_year = Some(YtdCount::new(2025, None));

        ReportDocumentRecord {
            report_date: NaiveDate::from_ymd_opt(2026, 2, 8),
            extracted_date_text: Some("Sunday, February 8, 2026".to_string()),
            source_file: Some("20260208.pdf".to_string()),
            crime_statistics: vec![murder],
            summary: ReportSummary {
                total_offense_types: 1,
                violent_crime_count: 1,
                property_crime_count: 0,
                violent_crimes: vec!["Murder".to_string()],
                property_crimes: Vec::new(),
            },
            parse_errors: vec!["Rape: could not parse 'N/A' in column 'Mon 2/2'".to_string()],
            ..ReportDocumentRecord::empty()
        }
    }

    #[test]
    fn document_round_trips_through_json() {
        let doc = sample_document();
        let json = serde_json::to_string_pretty(&doc).unwrap();
        let back: ReportDocumentRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, doc);
    }

    #[test]
    fn report_date_serializes_as_iso_date() {
        let value = serde_json::to_value(sample_document()).unwrap();
        assert_eq!(value["report_date"], "2026-02-08");
        assert_eq!(value["schema_version"], 1);
    }

    #[test]
    fn missing_report_date_serializes_as_null() {
        let value = serde_json::to_value(ReportDocumentRecord::empty()).unwrap();
        assert!(value["report_date"].is_null());
        assert_eq!(value["summary"]["total_offense_types"], 0);
        assert!(value.get("source_file").is_none());
    }

    #[test]
    fn file_key_is_compact_date() {
        let date = NaiveDate::from_ymd_opt(2026, 2, 8).unwrap();
        assert_eq!(file_key(date), "20260208");
    }

    #[test]
    fn category_string_roundtrip() {
        for category in [CrimeCategory::Violent, CrimeCategory::Property] {
            let s = category.to_string();
            assert_eq!(CrimeCategory::from_str(&s).unwrap(), category);
        }
        assert_eq!(CrimeCategory::Violent.as_ref(), "VIOLENT");
    }
}
