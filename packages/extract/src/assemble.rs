//! Record assembly: date result + normalized rows to one output document.

use crime_report_models::{CrimeCategory, ReportDocumentRecord, ReportSummary, StatisticRecord};

use crate::Extraction;
use crate::config::ExtractConfig;
use crate::date::{DateCandidate, DateExtractionError, ExtractedDate};
use crate::normalize::{NormalizedRow, RowNormalizationError};
use crate::warnings::ExtractionWarning;

/// Computes summary counts by classifying each offense label.
#[must_use]
pub fn summarize(statistics: &[StatisticRecord], config: &ExtractConfig) -> ReportSummary {
    let mut summary = ReportSummary {
        total_offense_types: statistics.len(),
        ..ReportSummary::default()
    };

    for stat in statistics {
        match config.category_of(&stat.offense_type) {
            Some(CrimeCategory::Violent) => summary.violent_crimes.push(stat.offense_type.clone()),
            Some(CrimeCategory::Property) => {
                summary.property_crimes.push(stat.offense_type.clone());
            }
            None => {}
        }
    }

    summary.violent_crime_count = summary.violent_crimes.len();
    summary.property_crime_count = summary.property_crimes.len();
    summary
}

/// Builds the output document. Never fails: every problem becomes a
/// warning and a `parse_errors` entry.
///
/// Warnings are ordered date first, then row problems in row order, then
/// 7-day mismatches, then the empty-extraction warning.
#[must_use]
pub fn assemble(
    date: Result<ExtractedDate, DateExtractionError>,
    rows: Vec<Result<NormalizedRow, RowNormalizationError>>,
    source_file: Option<&str>,
    config: &ExtractConfig,
) -> Extraction {
    let mut warnings = Vec::new();
    let mut record = ReportDocumentRecord::empty();
    record.source_file = source_file.map(str::to_owned);

    match date {
        Ok(extracted) => {
            let chosen = DateCandidate {
                pattern: extracted.pattern,
                date: extracted.date,
                text: extracted.text.clone(),
            };
            record.report_date = Some(extracted.date);
            record.extracted_date_text = Some(extracted.text);
            warnings.extend(
                extracted
                    .conflicts
                    .into_iter()
                    .map(|other| ExtractionWarning::AmbiguousDate {
                        chosen: chosen.clone(),
                        other,
                    }),
            );
        }
        Err(e) => warnings.push(e.into()),
    }

    for row in rows {
        match row {
            Ok(normalized) => {
                warnings.extend(normalized.errors.into_iter().map(ExtractionWarning::from));
                record.crime_statistics.push(normalized.record);
            }
            Err(e) => warnings.push(e.into()),
        }
    }

    warnings.extend(record.crime_statistics.iter().filter_map(|stat| {
        stat.seven_day_mismatch()
            .map(|(sum, total)| ExtractionWarning::SevenDayMismatch {
                offense_type: stat.offense_type.clone(),
                sum,
                total,
            })
    }));

    if record.crime_statistics.is_empty() {
        warnings.push(ExtractionWarning::EmptyExtraction);
    }

    for warning in &warnings {
        if matches!(warning, ExtractionWarning::EmptyExtraction) {
            log::error!("{warning}");
        } else {
            log::warn!("{warning}");
        }
    }

    record.summary = summarize(&record.crime_statistics, config);
    record.parse_errors = warnings.iter().map(ToString::to_string).collect();

    Extraction { record, warnings }
}
