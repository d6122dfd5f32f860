use std::{fmt::Display, str::FromStr, time::Duration};

use anyhow::{Context, Result, anyhow};
use platform_obs::ObsConfig;
use platform_upstream::{DEFAULT_BASE_URL, RetryPolicy, UpstreamSettings};

pub const SERVICE_NAME: &str = "employee-api";

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub obs: ObsConfig,
    pub upstream: UpstreamSettings,
    pub cors_allowed_origins: Vec<String>,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut obs = ObsConfig::new(SERVICE_NAME).with_otlp_endpoint(lookup("OTLP_ENDPOINT"));
        if let Some(filter) = lookup("RUST_LOG").filter(|filter| !filter.trim().is_empty()) {
            obs = obs.with_filter(filter);
        }

        let base_url =
            lookup("EMPLOYEE_API_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let timeout_secs: u64 = parse_or(&lookup, "UPSTREAM_TIMEOUT_SECS", 10)?;
        let max_retries: u32 = parse_or(&lookup, "UPSTREAM_MAX_RETRIES", 3)?;
        let initial_backoff_ms: u64 = parse_or(&lookup, "UPSTREAM_INITIAL_BACKOFF_MS", 2_000)?;
        let max_backoff_ms: u64 = parse_or(&lookup, "UPSTREAM_MAX_BACKOFF_MS", 30_000)?;
        if timeout_secs == 0 {
            return Err(anyhow!("UPSTREAM_TIMEOUT_SECS must be greater than zero"));
        }

        let retry = RetryPolicy {
            max_retries,
            initial_backoff: Duration::from_millis(initial_backoff_ms),
            max_backoff: Duration::from_millis(max_backoff_ms.max(initial_backoff_ms)),
            ..RetryPolicy::default()
        };
        let upstream = UpstreamSettings::new(&base_url)
            .with_context(|| format!("invalid EMPLOYEE_API_BASE_URL {base_url}"))?
            .with_request_timeout(Duration::from_secs(timeout_secs))
            .with_retry(retry);

        let cors_allowed_origins = lookup("CORS_ALLOWED_ORIGINS")
            .unwrap_or_else(|| "http://localhost:5173".into())
            .split(',')
            .filter_map(|s| {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(trimmed.to_string())
                }
            })
            .collect::<Vec<_>>();

        Ok(Self {
            obs,
            upstream,
            cors_allowed_origins,
        })
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|err| anyhow!("invalid {key} {raw:?}: {err}")),
        None => Ok(default),
    }
}
