//! Non-fatal data-quality findings.
//!
//! Each warning renders, through `Display`, into one `parse_errors` entry of
//! the output document.

use crate::date::{DateCandidate, DateExtractionError};
use crate::normalize::RowNormalizationError;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExtractionWarning {
    #[error(transparent)]
    DateNotFound(#[from] DateExtractionError),

    #[error(
        "ambiguous report date: using {} from \"{}\" ({}), but \"{}\" ({}) reads as {}",
        .chosen.date, .chosen.text, .chosen.pattern, .other.text, .other.pattern, .other.date
    )]
    AmbiguousDate {
        chosen: DateCandidate,
        other: DateCandidate,
    },

    #[error(transparent)]
    Row(#[from] RowNormalizationError),

    #[error("{offense_type}: daily counts sum to {sum} but 7-day total is {total}")]
    SevenDayMismatch {
        offense_type: String,
        sum: u32,
        total: u32,
    },

    #[error("no offense rows were extracted; the report layout may have changed")]
    EmptyExtraction,
}
