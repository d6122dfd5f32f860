//! Delete by identifier against a name-keyed upstream.
//!
//! The identifier is first resolved to a name, then the name is deleted. The
//! name may change upstream between the two calls; nothing here guards that.

use std::fmt;

use platform_upstream::EmployeeGateway;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum DeleteFailure {
    #[error("delete returned false")]
    Rejected,
    #[error("retries exhausted")]
    RetriesExhausted,
    #[error("{0}")]
    Unexpected(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DeleteOutcome {
    Succeeded { id: String },
    NotFound { id: String },
    Failed { id: String, reason: DeleteFailure },
}

impl DeleteOutcome {
    pub fn id(&self) -> &str {
        match self {
            DeleteOutcome::Succeeded { id }
            | DeleteOutcome::NotFound { id }
            | DeleteOutcome::Failed { id, .. } => id,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, DeleteOutcome::Succeeded { .. })
    }
}

impl fmt::Display for DeleteOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeleteOutcome::Succeeded { id } => {
                write!(f, "Successfully deleted employee with ID: {id}")
            }
            DeleteOutcome::NotFound { id } => write!(f, "Employee not found with ID: {id}"),
            DeleteOutcome::Failed { id, reason } => match reason {
                DeleteFailure::Rejected => write!(f, "Failed to delete employee with ID: {id}"),
                DeleteFailure::RetriesExhausted => {
                    write!(f, "Failed to delete employee after multiple retries: {id}")
                }
                DeleteFailure::Unexpected(message) => write!(f, "Unexpected error: {message}"),
            },
        }
    }
}

enum Stage {
    ResolvingIdentifier,
    SubmittingDelete { name: String },
}

/// Resolve `id` to a name and delete by that name. Never fails; every path
/// ends in a [`DeleteOutcome`].
pub async fn delete_employee<G: EmployeeGateway>(gateway: &G, id: &str) -> DeleteOutcome {
    let mut stage = Stage::ResolvingIdentifier;
    loop {
        stage = match stage {
            Stage::ResolvingIdentifier => {
                debug!(%id, "resolving employee name");
                let name = gateway
                    .get_by_id(id)
                    .await
                    .and_then(|employee| employee.delete_key().map(str::to_string));
                match name {
                    Some(name) => Stage::SubmittingDelete { name },
                    None => {
                        info!(%id, "employee to delete not found");
                        return DeleteOutcome::NotFound { id: id.to_string() };
                    }
                }
            }
            Stage::SubmittingDelete { name } => {
                debug!(%id, %name, "submitting delete");
                return submitted(id, gateway.delete_by_name(&name).await);
            }
        };
    }
}

fn submitted(id: &str, result: platform_upstream::UpstreamResult<bool>) -> DeleteOutcome {
    let id = id.to_string();
    match result {
        Ok(true) => DeleteOutcome::Succeeded { id },
        Ok(false) => {
            warn!(%id, "upstream declined delete");
            DeleteOutcome::Failed {
                id,
                reason: DeleteFailure::Rejected,
            }
        }
        Err(err) if err.is_retries_exhausted() => {
            warn!(%id, error = %err, "delete gave up while rate limited");
            DeleteOutcome::Failed {
                id,
                reason: DeleteFailure::RetriesExhausted,
            }
        }
        Err(err) => {
            warn!(%id, error = %err, "delete failed");
            DeleteOutcome::Failed {
                id,
                reason: DeleteFailure::Unexpected(err.to_string()),
            }
        }
    }
}
