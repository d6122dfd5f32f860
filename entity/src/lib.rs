//! Wire types shared by the upstream gateway, the HR product layer and the
//! HTTP surface.

pub mod employee;
pub mod envelope;

pub use employee::{CreateEmployeeRequest, DeleteEmployeeRequest, Employee};
pub use envelope::{CodecError, Envelope};
