//! The `crime_report.toml` file: extraction, download, and data directory
//! settings in one place.

use std::path::{Path, PathBuf};

use crime_report_extract::{ConfigError, ExtractConfig, ExtractSettings};
use crime_report_fetch::FetchConfig;
use crime_report_store::DataPaths;
use serde::Deserialize;

/// Configuration used when no `--config` file is given.
pub const DEFAULT_CONFIG_TOML: &str = include_str!("../config/crime_report.toml");

#[derive(Debug, thiserror::Error)]
pub enum AppConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Toml(#[from] toml::de::Error),

    #[error(transparent)]
    Extract(#[from] ConfigError),
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub extract: ExtractSettings,
    pub fetch: FetchConfig,
    pub paths: DataPaths,
}

impl AppConfig {
    /// Reads `path`, or the built-in configuration when `path` is `None`.
    ///
    /// The extraction settings are validated here so a bad pattern fails
    /// before any work starts.
    ///
    /// # Errors
    ///
    /// Returns [`AppConfigError`] if the file cannot be read, parsed, or
    /// validated.
    pub fn load(path: Option<&Path>) -> Result<Self, AppConfigError> {
        let config = match path {
            Some(path) => {
                let contents =
                    std::fs::read_to_string(path).map_err(|source| AppConfigError::Read {
                        path: path.to_path_buf(),
                        source,
                    })?;
                log::debug!("Loaded config from {}", path.display());
                Self::from_toml_str(&contents)?
            }
            None => Self::from_toml_str(DEFAULT_CONFIG_TOML)?,
        };
        config.extract_config()?;
        Ok(config)
    }

    /// # Errors
    ///
    /// Returns [`AppConfigError::Toml`] if the TOML is malformed.
    pub fn from_toml_str(toml_str: &str) -> Result<Self, AppConfigError> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Compiles the `[extract]` settings.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a date pattern is invalid or the offense
    /// categories overlap.
    pub fn extract_config(&self) -> Result<ExtractConfig, ConfigError> {
        ExtractConfig::from_settings(&self.extract)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_config_matches_defaults() {
        let config = AppConfig::load(None).unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.paths.json_dir, Path::new("data/json"));
        assert_eq!(config.fetch.max_retries, 3);
        assert_eq!(config.extract.min_rows, 5);
        assert_eq!(config.extract.date_patterns.len(), 4);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let config = AppConfig::from_toml_str(
            r#"
            [paths]
            json_dir = "out/json"

            [extract]
            min_rows = 10
            "#,
        )
        .unwrap();
        assert_eq!(config.paths.json_dir, Path::new("out/json"));
        assert_eq!(config.paths.pdf_dir, Path::new("data/pdf"));
        assert_eq!(config.extract.min_rows, 10);
        assert_eq!(config.extract.header_chars, 500);
        assert_eq!(config.fetch, FetchConfig::default());
    }

    #[test]
    fn invalid_pattern_fails_at_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("crime_report.toml");
        std::fs::write(
            &path,
            "[[extract.date_patterns]]\nname = \"broken\"\npattern = '(?P<month>'\n",
        )
        .unwrap();

        let err = AppConfig::load(Some(&path)).unwrap_err();
        assert!(matches!(err, AppConfigError::Extract(ConfigError::Pattern { .. })));
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let err = AppConfig::load(Some(Path::new("/nonexistent/crime_report.toml"))).unwrap_err();
        assert!(matches!(err, AppConfigError::Read { .. }));
    }
}
