//! Per-offense statistic rows.
//!
//! A [`StatisticRecord`] serializes to a flat JSON object whose keys mirror
//! the source table:
//!
//! ```json
//! { "offense_type": "Murder", "Mon 2/2": 0, "Tue 2/3": 1, "Wed 2/4": null,
//!   "seven_day_total": 2, "ytd_2026": 9 }
//! ```
//!
//! Daily columns keep their header label as the key. A field whose column
//! was not in the table is omitted entirely, while a column that was present
//! but held an empty or unparseable cell serializes as `null`.

use std::fmt;

use serde::de::{self, MapAccess, Visitor};
use serde::ser::SerializeMap as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// JSON key for the offense label.
pub const OFFENSE_TYPE_KEY: &str = "offense_type";
/// JSON key for the 7-day total column.
pub const SEVEN_DAY_TOTAL_KEY: &str = "seven_day_total";
/// JSON key for the previous 7-day total column.
pub const PREV_SEVEN_DAY_TOTAL_KEY: &str = "prev_seven_day_total";
/// JSON key for the `+/-` column.
pub const CHANGE_KEY: &str = "change";
/// JSON key for the `% Change` column.
pub const PERCENT_CHANGE_KEY: &str = "percent_change";

const YTD_KEY_PREFIX: &str = "ytd_";

/// One daily column value, keyed by the column header label
/// (e.g. `"Monday 2/2"`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyCount {
    /// Column header label, whitespace-collapsed.
    pub label: String,
    /// Incident count, `None` when the cell was empty or invalid.
    pub count: Option<u32>,
}

impl DailyCount {
    #[must_use]
    pub fn new(label: impl Into<String>, count: Option<u32>) -> Self {
        Self {
            label: label.into(),
            count,
        }
    }
}

/// A year-to-date column value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YtdCount {
    /// Four-digit calendar year the cumulative count covers.
    pub year: i32,
    /// Cumulative count, `None` when the cell was empty or invalid.
    pub count: Option<u32>,
}

impl YtdCount {
    #[must_use]
    pub const fn new(year: i32, count: Option<u32>) -> Self {
        Self { year, count }
    }

    /// Returns the JSON key for this column (`ytd_2026`).
    #[must_use]
    pub fn key(&self) -> String {
        format!("{YTD_KEY_PREFIX}{}", self.year)
    }
}

/// Normalized statistics for one offense row.
///
/// Optional fields use two levels of `Option`: the outer level says whether
/// the column exists in the source table, the inner level whether the cell
/// held a usable value.
#[derive(Debug, Clone, PartialEq)]
pub struct StatisticRecord {
    /// Offense label exactly as printed, trimmed.
    pub offense_type: String,
    /// Daily columns in table order.
    pub daily_counts: Vec<DailyCount>,
    /// "7-Day Totals" column.
    pub seven_day_total: Option<Option<u32>>,
    /// "Prev. 7 ..." column.
    pub prev_seven_day_total: Option<Option<u32>>,
    /// "+/-" column.
    pub change: Option<Option<i64>>,
    /// "% Change" column, with the sign and percent sign stripped.
    pub percent_change: Option<Option<f64>>,
    /// Year-to-date column for the report's year.
    pub ytd_current_year: Option<YtdCount>,
    /// Year-to-date column for the year before the report's year.
    pub ytd_prior_year: Option<YtdCount>,
}

impl StatisticRecord {
    /// Creates a record with the given offense label and no columns.
    #[must_use]
    pub fn new(offense_type: impl Into<String>) -> Self {
        Self {
            offense_type: offense_type.into(),
            daily_counts: Vec::new(),
            seven_day_total: None,
            prev_seven_day_total: None,
            change: None,
            percent_change: None,
            ytd_current_year: None,
            ytd_prior_year: None,
        }
    }

    /// Sum of the daily counts, or `None` if there are no daily columns or
    /// any of them is missing a value.
    #[must_use]
    pub fn daily_total(&self) -> Option<u32> {
        if self.daily_counts.is_empty() {
            return None;
        }
        self.daily_counts
            .iter()
            .try_fold(0u32, |acc, day| day.count.map(|c| acc.saturating_add(c)))
    }

    /// Returns `(daily_sum, seven_day_total)` when every daily count and the
    /// 7-day total are present but disagree.
    #[must_use]
    pub fn seven_day_mismatch(&self) -> Option<(u32, u32)> {
        let sum = self.daily_total()?;
        let total = self.seven_day_total.flatten()?;
        (sum != total).then_some((sum, total))
    }
}

impl Serialize for StatisticRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry(OFFENSE_TYPE_KEY, &self.offense_type)?;
        for day in &self.daily_counts {
            map.serialize_entry(&day.label, &day.count)?;
        }
        if let Some(total) = &self.seven_day_total {
            map.serialize_entry(SEVEN_DAY_TOTAL_KEY, total)?;
        }
        if let Some(total) = &self.prev_seven_day_total {
            map.serialize_entry(PREV_SEVEN_DAY_TOTAL_KEY, total)?;
        }
        if let Some(change) = &self.change {
            map.serialize_entry(CHANGE_KEY, change)?;
        }
        if let Some(percent) = &self.percent_change {
            map.serialize_entry(PERCENT_CHANGE_KEY, percent)?;
        }
        for ytd in [&self.ytd_current_year, &self.ytd_prior_year]
            .into_iter()
            .flatten()
        {
            map.serialize_entry(&ytd.key(), &ytd.count)?;
        }
        map.end()
    }
}

/// Parses the year out of a `ytd_YYYY` key.
fn ytd_year(key: &str) -> Option<i32> {
    let digits = key.strip_prefix(YTD_KEY_PREFIX)?;
    if digits.len() != 4 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

struct StatisticRecordVisitor;

impl<'de> Visitor<'de> for StatisticRecordVisitor {
    type Value = StatisticRecord;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a crime statistic object")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut offense_type: Option<String> = None;
        let mut record = StatisticRecord::new(String::new());
        let mut ytd: Vec<YtdCount> = Vec::new();

        // Any key that is not a known field or a `ytd_YYYY` key is a daily
        // column; document order is kept so daily columns stay in table order.
        while let Some(key) = access.next_key::<String>()? {
            if key == OFFENSE_TYPE_KEY {
                offense_type = Some(access.next_value()?);
            } else if key == SEVEN_DAY_TOTAL_KEY {
                record.seven_day_total = Some(access.next_value()?);
            } else if key == PREV_SEVEN_DAY_TOTAL_KEY {
                record.prev_seven_day_total = Some(access.next_value()?);
            } else if key == CHANGE_KEY {
                record.change = Some(access.next_value()?);
            } else if key == PERCENT_CHANGE_KEY {
                record.percent_change = Some(access.next_value()?);
            } else if let Some(year) = ytd_year(&key) {
                ytd.push(YtdCount::new(year, access.next_value()?));
            } else {
                record.daily_counts.push(DailyCount {
                    label: key,
                    count: access.next_value()?,
                });
            }
        }

        record.offense_type =
            offense_type.ok_or_else(|| de::Error::missing_field(OFFENSE_TYPE_KEY))?;

        ytd.sort_by_key(|y| y.year);
        match ytd.as_slice() {
            [] => {}
            [current] => record.ytd_current_year = Some(*current),
            [prior, current] => {
                record.ytd_prior_year = Some(*prior);
                record.ytd_current_year = Some(*current);
            }
            _ => {
                return Err(de::Error::custom(format!(
                    "expected at most two year-to-date columns, found {}",
                    ytd.len()
                )));
            }
        }

        Ok(record)
    }
}

impl<'de> Deserialize<'de> for StatisticRecord {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(StatisticRecordVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn murder() -> StatisticRecord {
        let mut record = StatisticRecord::new("Murder");
        record.daily_counts = vec![
            DailyCount::new("Mon 2/2", Some(0)),
            DailyCount::new("Tue 2/3", Some(1)),
            DailyCount::new("Wed 2/4", None),
        ];
        record.seven_day_total = Some(Some(2));
        record.ytd_current_year = Some(YtdCount::new(2026, Some(9)));
        record
    }

    #[test]
    fn serializes_to_flat_object() {
        let value = serde_json::to_value(murder()).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "offense_type": "Murder",
                "Mon 2/2": 0,
                "Tue 2/3": 1,
                "Wed 2/4": null,
                "seven_day_total": 2,
                "ytd_2026": 9
            })
        );
    }

    #[test]
    fn serialization_keeps_table_column_order() {
        let json = serde_json::to_string(&murder()).unwrap();
        assert_eq!(
            json,
            r#"{"offense_type":"Murder","Mon 2/2":0,"Tue 2/3":1,"Wed 2/4":null,"seven_day_total":2,"ytd_2026":9}"#
        );
    }

    #[test]
    fn round_trips_with_every_column() {
        let mut record = murder();
        record.prev_seven_day_total = Some(None);
        record.change = Some(Some(-3));
        record.percent_change = Some(Some(-42.5));
        record.ytd_prior_year = Some(YtdCount::new(2025, Some(11)));

        let json = serde_json::to_string(&record).unwrap();
        let back: StatisticRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn assigns_later_ytd_year_as_current() {
        let record: StatisticRecord = serde_json::from_str(
            r#"{"offense_type":"Robbery","ytd_2026":4,"ytd_2025":7}"#,
        )
        .unwrap();
        assert_eq!(record.ytd_current_year, Some(YtdCount::new(2026, Some(4))));
        assert_eq!(record.ytd_prior_year, Some(YtdCount::new(2025, Some(7))));
        assert!(record.daily_counts.is_empty());
    }

    #[test]
    fn rejects_missing_offense_type() {
        let result = serde_json::from_str::<StatisticRecord>(r#"{"Mon 2/2": 1}"#);
        assert!(result.is_err());
    }

    #[test]
    fn daily_total_requires_every_day() {
        let record = murder();
        assert_eq!(record.daily_total(), None);

        let mut complete = murder();
        complete.daily_counts[2].count = Some(4);
        assert_eq!(complete.daily_total(), Some(5));
        assert_eq!(complete.seven_day_mismatch(), Some((5, 2)));

        complete.seven_day_total = Some(Some(5));
        assert_eq!(complete.seven_day_mismatch(), None);
    }

    #[test]
    fn no_daily_columns_means_no_mismatch() {
        let mut record = StatisticRecord::new("Arson");
        record.seven_day_total = Some(Some(3));
        assert_eq!(record.seven_day_mismatch(), None);
    }
}
