//! Extraction configuration.
//!
//! [`ExtractSettings`] is the serializable form read from TOML; the
//! built-in defaults live in `config/extract.toml` and are baked into the
//! binary at compile time. [`ExtractConfig`] is the validated, immutable
//! value the pipeline runs against, with regexes compiled once.

use std::collections::{BTreeMap, BTreeSet};

use crime_report_models::CrimeCategory;
use serde::Deserialize;

use crate::date::DatePattern;

/// Built-in extraction settings.
pub const DEFAULT_EXTRACT_TOML: &str = include_str!("../config/extract.toml");

/// Errors raised while loading or validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The TOML could not be parsed into settings.
    #[error("invalid config: {0}")]
    Toml(#[from] toml::de::Error),

    /// A date pattern failed to compile.
    #[error("invalid date pattern '{name}': {source}")]
    Pattern {
        /// Name of the offending pattern.
        name: String,
        /// Regex compilation error.
        source: regex::Error,
    },

    /// A date pattern lacks a required named capture group.
    #[error("date pattern '{name}' has no '{group}' capture group")]
    MissingGroup {
        /// Name of the offending pattern.
        name: String,
        /// The missing group.
        group: &'static str,
    },

    /// No date patterns were configured.
    #[error("at least one date pattern is required")]
    NoDatePatterns,

    /// An offense label was assigned to more than one summary category.
    #[error("offense '{0}' is listed as both violent and property")]
    OverlappingCategory(String),
}

/// One configured header date pattern, before compilation.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DatePatternSettings {
    /// Short identifier used in logs and ambiguity warnings.
    pub name: String,
    /// Regex with `month`, `day`, and `year` named groups.
    pub pattern: String,
}

/// Serializable extraction settings.
///
/// Missing keys fall back to the built-in values, so a config file only
/// needs to list what it changes.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ExtractSettings {
    /// Characters of first-page text scanned for the report date.
    #[serde(default = "builtin::header_chars")]
    pub header_chars: usize,
    /// Row count below which a report is flagged to the operator.
    #[serde(default = "builtin::min_rows")]
    pub min_rows: usize,
    /// Offense-column labels that mark header or divider rows.
    #[serde(default = "builtin::structural_labels")]
    pub structural_labels: Vec<String>,
    /// Offense labels counted as violent crime.
    #[serde(default = "builtin::violent_offenses")]
    pub violent_offenses: Vec<String>,
    /// Offense labels counted as property crime.
    #[serde(default = "builtin::property_offenses")]
    pub property_offenses: Vec<String>,
    /// Header date patterns in priority order.
    #[serde(default = "builtin::date_patterns")]
    pub date_patterns: Vec<DatePatternSettings>,
}

impl Default for ExtractSettings {
    fn default() -> Self {
        builtin::SETTINGS.clone()
    }
}

/// Field defaults read from the embedded `extract.toml`, which lists every
/// key.
mod builtin {
    use std::sync::LazyLock;

    use super::{DEFAULT_EXTRACT_TOML, DatePatternSettings, ExtractSettings};

    pub static SETTINGS: LazyLock<ExtractSettings> = LazyLock::new(|| {
        toml::de::from_str(DEFAULT_EXTRACT_TOML)
            .unwrap_or_else(|e| unreachable!("built-in extract.toml is invalid: {e}"))
    });

    pub fn header_chars() -> usize {
        SETTINGS.header_chars
    }

    pub fn min_rows() -> usize {
        SETTINGS.min_rows
    }

    pub fn structural_labels() -> Vec<String> {
        SETTINGS.structural_labels.clone()
    }

    pub fn violent_offenses() -> Vec<String> {
        SETTINGS.violent_offenses.clone()
    }

    pub fn property_offenses() -> Vec<String> {
        SETTINGS.property_offenses.clone()
    }

    pub fn date_patterns() -> Vec<DatePatternSettings> {
        SETTINGS.date_patterns.clone()
    }
}

/// Validated, immutable extraction configuration.
#[derive(Debug, Clone)]
pub struct ExtractConfig {
    header_chars: usize,
    min_rows: usize,
    structural_labels: BTreeSet<String>,
    categories: BTreeMap<String, CrimeCategory>,
    date_patterns: Vec<DatePattern>,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self::from_settings(&ExtractSettings::default())
            .unwrap_or_else(|e| unreachable!("built-in extract.toml is invalid: {e}"))
    }
}

impl ExtractConfig {
    /// Validates `settings` and compiles its date patterns.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a date pattern is invalid, no patterns are
    /// configured, or an offense label is in both category sets.
    pub fn from_settings(settings: &ExtractSettings) -> Result<Self, ConfigError> {
        if settings.date_patterns.is_empty() {
            return Err(ConfigError::NoDatePatterns);
        }

        let date_patterns = settings
            .date_patterns
            .iter()
            .map(|p| DatePattern::new(&p.name, &p.pattern))
            .collect::<Result<Vec<_>, _>>()?;

        let mut categories = BTreeMap::new();
        for (labels, category) in [
            (&settings.violent_offenses, CrimeCategory::Violent),
            (&settings.property_offenses, CrimeCategory::Property),
        ] {
            for label in labels {
                let key = label_key(label);
                if let Some(existing) = categories.insert(key, category)
                    && existing != category
                {
                    return Err(ConfigError::OverlappingCategory(label.clone()));
                }
            }
        }

        Ok(Self {
            header_chars: settings.header_chars,
            min_rows: settings.min_rows,
            structural_labels: settings
                .structural_labels
                .iter()
                .map(|l| label_key(l))
                .collect(),
            categories,
            date_patterns,
        })
    }

    /// Parses and validates settings from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the TOML is malformed or fails validation.
    pub fn from_toml_str(toml_str: &str) -> Result<Self, ConfigError> {
        let settings: ExtractSettings = toml::de::from_str(toml_str)?;
        Self::from_settings(&settings)
    }

    #[must_use]
    pub const fn header_chars(&self) -> usize {
        self.header_chars
    }

    #[must_use]
    pub const fn min_rows(&self) -> usize {
        self.min_rows
    }

    /// Header date patterns in priority order.
    #[must_use]
    pub fn date_patterns(&self) -> &[DatePattern] {
        &self.date_patterns
    }

    /// Returns the summary category of an offense label, if it has one.
    #[must_use]
    pub fn category_of(&self, offense_type: &str) -> Option<CrimeCategory> {
        self.categories.get(&label_key(offense_type)).copied()
    }

    /// Returns `true` if `label` marks a header or divider row.
    #[must_use]
    pub fn is_structural_label(&self, label: &str) -> bool {
        self.structural_labels.contains(&label_key(label))
    }
}

/// Case- and spacing-insensitive lookup key for an offense label.
fn label_key(label: &str) -> String {
    crime_report_pdf::text_table::collapse_whitespace(label).to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_settings_are_valid() {
        let config = ExtractConfig::default();
        assert_eq!(config.header_chars(), 500);
        assert_eq!(config.min_rows(), 5);
        assert_eq!(config.date_patterns().len(), 4);
        assert_eq!(config.date_patterns()[0].name(), "weekday_month_day_year");
    }

    #[test]
    fn classifies_offenses_case_insensitively() {
        let config = ExtractConfig::default();
        assert_eq!(config.category_of("MURDER"), Some(CrimeCategory::Violent));
        assert_eq!(
            config.category_of("theft  from auto"),
            Some(CrimeCategory::Property)
        );
        assert_eq!(config.category_of("Violent Crime Total"), None);
        assert_eq!(config.category_of("Murders"), None);
    }

    #[test]
    fn partial_override_keeps_defaults() {
        let config = ExtractConfig::from_toml_str(
            r#"
            min_rows = 12
            violent_offenses = ["Homicide"]
            "#,
        )
        .unwrap();
        assert_eq!(config.min_rows(), 12);
        assert_eq!(config.header_chars(), 500);
        assert_eq!(config.category_of("Homicide"), Some(CrimeCategory::Violent));
        assert_eq!(config.category_of("Murder"), None);
        assert_eq!(config.category_of("Burglary"), Some(CrimeCategory::Property));
    }

    #[test]
    fn rejects_overlapping_categories() {
        let err = ExtractConfig::from_toml_str(
            r#"
            violent_offenses = ["Robbery"]
            property_offenses = ["robbery"]
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::OverlappingCategory(label) if label == "robbery"));
    }

    #[test]
    fn rejects_pattern_without_groups() {
        let err = ExtractConfig::from_toml_str(
            r#"
            [[date_patterns]]
            name = "bare"
            pattern = '\d{4}'
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::MissingGroup { group: "month", .. }));
    }

    #[test]
    fn rejects_invalid_regex() {
        let err = ExtractConfig::from_toml_str(
            r#"
            [[date_patterns]]
            name = "broken"
            pattern = '(?P<month>'
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Pattern { .. }));
    }

    #[test]
    fn recognizes_structural_labels() {
        let config = ExtractConfig::default();
        assert!(config.is_structural_label("OFFENSE"));
        assert!(config.is_structural_label(" Offense  Type "));
        assert!(!config.is_structural_label("Murder"));
    }
}
