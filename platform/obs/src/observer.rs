use std::fmt;

use tracing::{error, info};

/// Side-channel notified around each upstream operation.
///
/// Implementations must not influence the operation: they see the name, the
/// arguments and the outcome, nothing they return is consulted.
pub trait OperationObserver: Send + Sync {
    fn before(&self, operation: &'static str, args: &dyn fmt::Debug);
    fn after(&self, operation: &'static str, outcome: &dyn fmt::Display);
    fn on_error(&self, operation: &'static str, error: &dyn fmt::Display);
}

/// Logs operation lifecycle events through `tracing`.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingObserver;

impl OperationObserver for TracingObserver {
    fn before(&self, operation: &'static str, args: &dyn fmt::Debug) {
        info!(operation, args = ?args, "operation started");
    }

    fn after(&self, operation: &'static str, outcome: &dyn fmt::Display) {
        info!(operation, outcome = %outcome, "operation completed");
    }

    fn on_error(&self, operation: &'static str, error: &dyn fmt::Display) {
        error!(operation, error = %error, "operation failed");
    }
}
