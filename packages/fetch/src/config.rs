use std::collections::BTreeMap;
use std::time::Duration;

use serde::Deserialize;

/// Where the county publishes the current day's report.
pub const DEFAULT_URL: &str = "https://dailycrime.princegeorgescountymd.gov/";

/// Browser-like User-Agent sent with every request.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/121.0.0.0 Safari/537.36";

/// Download settings, read from the `[fetch]` table of the config file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub url: String,
    /// Retries after the first attempt for transient failures.
    pub max_retries: u32,
    /// Base backoff delay; retry `n` waits `retry_delay_secs * 2^(n-1)`.
    pub retry_delay_secs: u64,
    /// Per-request timeout.
    pub timeout_secs: u64,
    pub user_agent: String,
    /// Extra request headers.
    pub headers: BTreeMap<String, String>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        let headers = [
            (
                "Accept",
                "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
            ),
            ("Accept-Language", "en-US,en;q=0.5"),
            ("Upgrade-Insecure-Requests", "1"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_owned(), v.to_owned()))
        .collect();

        Self {
            url: DEFAULT_URL.to_owned(),
            max_retries: 3,
            retry_delay_secs: 60,
            timeout_secs: 30,
            user_agent: DEFAULT_USER_AGENT.to_owned(),
            headers,
        }
    }
}

impl FetchConfig {
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Delay before retry number `retry` (1-based).
    #[must_use]
    pub fn backoff_delay(&self, retry: u32) -> Duration {
        let factor = 1u64.checked_shl(retry.saturating_sub(1)).unwrap_or(u64::MAX);
        Duration::from_secs(self.retry_delay_secs.saturating_mul(factor))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles() {
        let config = FetchConfig::default();
        assert_eq!(config.backoff_delay(1), Duration::from_secs(60));
        assert_eq!(config.backoff_delay(2), Duration::from_secs(120));
        assert_eq!(config.backoff_delay(3), Duration::from_secs(240));
        assert_eq!(config.backoff_delay(100), Duration::from_secs(u64::MAX));
    }

    #[test]
    fn partial_table_keeps_defaults() {
        let config: FetchConfig = toml::from_str("max_retries = 1\nretry_delay_secs = 5\n").unwrap();
        assert_eq!(config.max_retries, 1);
        assert_eq!(config.backoff_delay(2), Duration::from_secs(10));
        assert_eq!(config.url, DEFAULT_URL);
        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert!(config.headers.contains_key("Accept-Language"));
    }
}
