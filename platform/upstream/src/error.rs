use entity::CodecError;
use thiserror::Error;

pub type UpstreamResult<T> = Result<T, UpstreamError>;

#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("upstream unavailable: {0}")]
    Unavailable(String),
    #[error("undecodable upstream response: {0}")]
    Decode(String),
    #[error("resource not found upstream")]
    NotFound,
    #[error("still rate limited after {attempts} attempts")]
    RetriesExhausted { attempts: u32 },
    #[error("upstream rejected the request: {0}")]
    Validation(String),
    #[error("invalid upstream url: {0}")]
    InvalidUrl(String),
}

impl UpstreamError {
    pub fn is_retries_exhausted(&self) -> bool {
        matches!(self, UpstreamError::RetriesExhausted { .. })
    }
}

impl From<CodecError> for UpstreamError {
    fn from(value: CodecError) -> Self {
        Self::Decode(value.to_string())
    }
}

impl From<reqwest::Error> for UpstreamError {
    fn from(value: reqwest::Error) -> Self {
        if value.is_decode() {
            Self::Decode(value.to_string())
        } else {
            Self::Unavailable(value.to_string())
        }
    }
}
