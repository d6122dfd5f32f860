use std::time::Duration;

use reqwest::Url;

use crate::{RetryPolicy, UpstreamError, UpstreamResult};

pub const DEFAULT_BASE_URL: &str = "http://localhost:8112/api/v1/employee";

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Immutable outbound configuration, built once at startup.
#[derive(Clone, Debug)]
pub struct UpstreamSettings {
    pub base_url: Url,
    /// Applied to every attempt, not to the whole retry sequence.
    pub request_timeout: Duration,
    pub retry: RetryPolicy,
}

impl UpstreamSettings {
    pub fn new(base_url: &str) -> UpstreamResult<Self> {
        let base_url = parse_base_url(base_url)?;
        Ok(Self {
            base_url,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            retry: RetryPolicy::default(),
        })
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

fn parse_base_url(raw: &str) -> UpstreamResult<Url> {
    let url = Url::parse(raw.trim()).map_err(|err| UpstreamError::InvalidUrl(err.to_string()))?;
    if url.cannot_be_a_base() || !matches!(url.scheme(), "http" | "https") {
        return Err(UpstreamError::InvalidUrl(format!(
            "{url} is not an http(s) base url"
        )));
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_base_url_parses() {
        let settings = UpstreamSettings::new(DEFAULT_BASE_URL).unwrap();
        assert_eq!(settings.base_url.path(), "/api/v1/employee");
        assert_eq!(settings.request_timeout, Duration::from_secs(10));
        assert_eq!(settings.retry.max_retries, 3);
    }

    #[test]
    fn rejects_non_http_urls() {
        assert!(matches!(
            UpstreamSettings::new("mailto:hr@example.com"),
            Err(UpstreamError::InvalidUrl(_))
        ));
        assert!(matches!(
            UpstreamSettings::new("not a url"),
            Err(UpstreamError::InvalidUrl(_))
        ));
    }
}
