//! HR module: employee reads, aggregates and the delete workflow, all served
//! from an [`EmployeeGateway`](platform_upstream::EmployeeGateway).

pub mod aggregate;
pub mod delete;
mod service;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use delete::{DeleteFailure, DeleteOutcome, delete_employee};
pub use service::EmployeeService;
