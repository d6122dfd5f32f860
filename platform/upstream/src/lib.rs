//! Outbound access to the upstream employee service.
//!
//! [`transport`] issues single HTTP calls and retries rate-limited ones with
//! exponential backoff; [`gateway`] turns those calls into one operation per
//! upstream endpoint and applies the read/write failure policies.

mod error;
pub mod gateway;
mod settings;
pub mod transport;

pub use error::{UpstreamError, UpstreamResult};
pub use gateway::{EmployeeGateway, HttpEmployeeGateway};
pub use settings::{DEFAULT_BASE_URL, UpstreamSettings};
pub use transport::{Attempt, RetryPolicy, RetryingTransport, Sleeper, TokioSleeper};
