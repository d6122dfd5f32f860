//! The `{ data, status, error }` wrapper the upstream puts around every
//! response payload.
//!
//! Decoding never invents data: a body without `data` yields `data: None`, and
//! it is up to the caller to decide whether that means "empty".

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("malformed upstream envelope: {0}")]
    Malformed(#[from] serde_json::Error),
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Envelope<T> {
    #[serde(default = "Option::default")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T: DeserializeOwned> Envelope<T> {
    pub fn decode(body: &[u8]) -> Result<Self, CodecError> {
        Ok(serde_json::from_slice(body)?)
    }
}

impl<T> Envelope<T> {
    /// Successful envelope, as the upstream would send it.
    pub fn success(data: T) -> Self {
        Self {
            data: Some(data),
            status: Some("Successfully processed request.".to_string()),
            error: None,
        }
    }

    /// Error envelope carrying no payload.
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            data: None,
            status: Some("Failed to process request.".to_string()),
            error: Some(error.into()),
        }
    }

    pub fn into_data(self) -> Option<T> {
        self.data
    }
}
