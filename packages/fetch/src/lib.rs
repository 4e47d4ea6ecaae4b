#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Download of the daily crime report PDF.
//!
//! [`download_pdf`] retries transient failures (connection errors,
//! timeouts, HTTP 429, HTTP 5xx) with exponential backoff. Other HTTP
//! errors are permanent and fail immediately.

pub mod config;
pub mod progress;

use reqwest::StatusCode;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};

pub use config::FetchConfig;
pub use progress::{NullProgress, ProgressCallback, null_progress};

/// Errors raised while downloading.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// The HTTP client could not be built.
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    /// A configured header name or value is invalid.
    #[error("invalid request header '{0}'")]
    InvalidHeader(String),

    /// The request failed before a complete response was received.
    #[error("request to {url} failed: {source}")]
    Http {
        url: String,
        source: reqwest::Error,
    },

    /// The server answered with a non-success status.
    #[error("HTTP {status} from {url}")]
    Status { url: String, status: StatusCode },
}

impl FetchError {
    /// Returns `true` if the failure is likely transient and worth retrying.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http { source, .. } => {
                source.is_timeout() || source.is_connect() || source.is_body() || source.is_request()
            }
            Self::Status { status, .. } => is_retryable_status(*status),
            Self::Client(_) | Self::InvalidHeader(_) => false,
        }
    }
}

/// 429 and 5xx are retried; every other error status is permanent.
#[must_use]
pub fn is_retryable_status(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

/// Returns `true` if a `Content-Type` value plausibly carries a PDF.
#[must_use]
pub fn looks_like_pdf(content_type: &str) -> bool {
    let content_type = content_type.to_ascii_lowercase();
    content_type.contains("pdf") || content_type.contains("application/octet-stream")
}

fn build_client(config: &FetchConfig) -> Result<reqwest::Client, FetchError> {
    let mut headers = HeaderMap::new();
    for (name, value) in &config.headers {
        let header_name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| FetchError::InvalidHeader(name.clone()))?;
        let header_value =
            HeaderValue::from_str(value).map_err(|_| FetchError::InvalidHeader(name.clone()))?;
        headers.insert(header_name, header_value);
    }

    reqwest::Client::builder()
        .user_agent(&config.user_agent)
        .default_headers(headers)
        .timeout(config.timeout())
        .build()
        .map_err(FetchError::Client)
}

/// Downloads the PDF at `url`, returning its bytes.
///
/// Up to `config.max_retries` retries are made for transient failures,
/// waiting [`FetchConfig::backoff_delay`] before each. A response whose
/// `Content-Type` does not look like a PDF is only warned about; the
/// document loader decides whether the bytes are usable.
///
/// # Errors
///
/// Returns [`FetchError`] on a permanent failure or once retries are
/// exhausted.
pub async fn download_pdf(
    url: &str,
    config: &FetchConfig,
    progress: &dyn ProgressCallback,
) -> Result<Vec<u8>, FetchError> {
    let client = build_client(config)?;
    let attempts = config.max_retries.saturating_add(1);
    let mut retry = 0;

    loop {
        if retry > 0 {
            let delay = config.backoff_delay(retry);
            log::warn!("Retry {retry}/{} in {delay:?}...", config.max_retries);
            tokio::time::sleep(delay).await;
        }

        log::info!("Downloading {url} (attempt {}/{attempts})", retry + 1);
        match fetch_once(&client, url, progress).await {
            Ok(bytes) => {
                log::info!("Downloaded {} bytes from {url}", bytes.len());
                return Ok(bytes);
            }
            Err(e) if e.is_transient() && retry < config.max_retries => {
                log::warn!("Download attempt {} failed: {e}", retry + 1);
                retry += 1;
            }
            Err(e) => {
                progress.finish_and_clear();
                if e.is_transient() {
                    log::error!("Failed to download after {attempts} attempt(s): {e}");
                }
                return Err(e);
            }
        }
    }
}

async fn fetch_once(
    client: &reqwest::Client,
    url: &str,
    progress: &dyn ProgressCallback,
) -> Result<Vec<u8>, FetchError> {
    let http_error = |source| FetchError::Http {
        url: url.to_owned(),
        source,
    };

    let mut response = client.get(url).send().await.map_err(http_error)?;

    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status {
            url: url.to_owned(),
            status,
        });
    }

    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if !looks_like_pdf(content_type) {
        log::warn!("Response content type is '{content_type}', may not be a PDF");
    }

    progress.set_message(format!("Downloading {url}"));
    progress.set_position(0);
    if let Some(total) = response.content_length() {
        progress.set_total(total);
    }

    let mut bytes = Vec::new();
    while let Some(chunk) = response.chunk().await.map_err(http_error)? {
        bytes.extend_from_slice(&chunk);
        progress.inc(u64::try_from(chunk.len()).unwrap_or(u64::MAX));
    }

    progress.finish(format!("Downloaded {} bytes", bytes.len()));
    Ok(bytes)
}
