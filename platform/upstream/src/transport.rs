//! Single outbound calls with rate-limit retries.
//!
//! Every attempt is classified right after it completes into an [`Attempt`];
//! only [`Attempt::RateLimited`] feeds the backoff loop; everything else ends
//! the call on first occurrence.

use std::{future::Future, time::Duration};

use entity::Envelope;
use reqwest::{
    Client, Method, StatusCode, Url,
    header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderValue},
};
use serde::{Serialize, de::DeserializeOwned};
use tracing::{debug, warn};

use crate::{UpstreamError, UpstreamResult, UpstreamSettings};

/// Bounded exponential backoff applied between rate-limited attempts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub initial_backoff: Duration,
    pub multiplier: u32,
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_backoff: Duration::from_secs(2),
            multiplier: 2,
            max_backoff: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `retry` (0-based).
    pub fn delay_for(&self, retry: u32) -> Duration {
        let factor = self.multiplier.max(1).checked_pow(retry).unwrap_or(u32::MAX);
        self.initial_backoff
            .checked_mul(factor)
            .unwrap_or(self.max_backoff)
            .min(self.max_backoff)
    }
}

pub trait Sleeper: Send + Sync {
    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> + Send;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct TokioSleeper;

impl Sleeper for TokioSleeper {
    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> + Send {
        tokio::time::sleep(duration)
    }
}

/// Classified result of one outbound attempt.
#[derive(Debug)]
pub enum Attempt<T> {
    Ready(T),
    RateLimited,
    Failed(UpstreamError),
}

/// Drive `attempt` until it is ready, fails, or stays rate limited past
/// `policy.max_retries` retries.
pub async fn retry_rate_limited<T, F, Fut, S>(
    policy: &RetryPolicy,
    sleeper: &S,
    mut attempt: F,
) -> UpstreamResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Attempt<T>>,
    S: Sleeper,
{
    let mut retries = 0;
    loop {
        match attempt().await {
            Attempt::Ready(value) => return Ok(value),
            Attempt::Failed(err) => return Err(err),
            Attempt::RateLimited if retries >= policy.max_retries => {
                warn!(attempts = retries + 1, "upstream still rate limited; giving up");
                return Err(UpstreamError::RetriesExhausted {
                    attempts: retries + 1,
                });
            }
            Attempt::RateLimited => {
                let delay = policy.delay_for(retries);
                retries += 1;
                warn!(
                    retry = retries,
                    max_retries = policy.max_retries,
                    delay = ?delay,
                    "upstream rate limited; backing off"
                );
                sleeper.sleep(delay).await;
            }
        }
    }
}

/// Shared outbound client bound to the upstream base url.
#[derive(Clone, Debug)]
pub struct RetryingTransport<S = TokioSleeper> {
    client: Client,
    base_url: Url,
    policy: RetryPolicy,
    sleeper: S,
}

impl RetryingTransport<TokioSleeper> {
    pub fn new(settings: &UpstreamSettings) -> UpstreamResult<Self> {
        Self::with_sleeper(settings, TokioSleeper)
    }
}

impl<S: Sleeper> RetryingTransport<S> {
    pub fn with_sleeper(settings: &UpstreamSettings, sleeper: S) -> UpstreamResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .timeout(settings.request_timeout)
            .default_headers(headers)
            .build()
            .map_err(|err| UpstreamError::Unavailable(format!("building http client: {err}")))?;
        Ok(Self {
            client,
            base_url: settings.base_url.clone(),
            policy: settings.retry.clone(),
            sleeper,
        })
    }

    /// `{base}` or `{base}/{segment}`, with the segment percent-encoded.
    pub fn endpoint(&self, segment: Option<&str>) -> UpstreamResult<Url> {
        let mut url = self.base_url.clone();
        if let Some(segment) = segment {
            url.path_segments_mut()
                .map_err(|()| UpstreamError::InvalidUrl(self.base_url.to_string()))?
                .pop_if_empty()
                .push(segment);
        }
        Ok(url)
    }

    pub async fn execute<T, B>(
        &self,
        method: Method,
        segment: Option<&str>,
        body: Option<&B>,
    ) -> UpstreamResult<Envelope<T>>
    where
        T: DeserializeOwned + Send,
        B: Serialize + Sync + ?Sized,
    {
        let url = self.endpoint(segment)?;
        retry_rate_limited(&self.policy, &self.sleeper, || {
            self.attempt::<T, B>(method.clone(), url.clone(), body)
        })
        .await
    }

    async fn attempt<T, B>(&self, method: Method, url: Url, body: Option<&B>) -> Attempt<Envelope<T>>
    where
        T: DeserializeOwned + Send,
        B: Serialize + Sync + ?Sized,
    {
        debug!(%method, %url, "calling upstream");
        let mut request = self.client.request(method, url);
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = match request.send().await {
            Ok(response) => response,
            Err(err) => return Attempt::Failed(map_transport_error(err)),
        };
        let status = response.status();
        match response.bytes().await {
            Ok(body) => classify(status, body.as_ref()),
            Err(err) => Attempt::Failed(map_transport_error(err)),
        }
    }
}

/// Map a finished response onto an [`Attempt`].
pub fn classify<T: DeserializeOwned>(status: StatusCode, body: &[u8]) -> Attempt<Envelope<T>> {
    if status == StatusCode::TOO_MANY_REQUESTS {
        return Attempt::RateLimited;
    }
    if !status.is_success() {
        return Attempt::Failed(map_status_error(status, body));
    }
    match Envelope::decode(body) {
        Ok(envelope) => Attempt::Ready(envelope),
        Err(err) => Attempt::Failed(err.into()),
    }
}

fn map_transport_error(error: reqwest::Error) -> UpstreamError {
    if error.is_timeout() {
        UpstreamError::Unavailable(format!("timed out: {error}"))
    } else {
        UpstreamError::from(error)
    }
}

fn map_status_error(status: StatusCode, body: &[u8]) -> UpstreamError {
    let detail = Envelope::<serde_json::Value>::decode(body)
        .ok()
        .and_then(|envelope| envelope.error)
        .unwrap_or_else(|| body_preview(body));
    let message = if detail.is_empty() {
        format!("status {}", status.as_u16())
    } else {
        format!("status {}: {}", status.as_u16(), detail)
    };

    match status {
        StatusCode::NOT_FOUND => UpstreamError::NotFound,
        _ if status.is_client_error() => UpstreamError::Validation(message),
        _ => UpstreamError::Unavailable(message),
    }
}

fn body_preview(body: &[u8]) -> String {
    const PREVIEW_CHAR_LIMIT: usize = 160;

    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let preview = compact.chars().take(PREVIEW_CHAR_LIMIT).collect::<String>();
    if compact.chars().count() > PREVIEW_CHAR_LIMIT {
        format!("{preview}...")
    } else {
        preview
    }
}
