#![forbid(unsafe_code)]

pub mod access;
pub mod car;
pub mod common;
pub mod invocation;

pub use common::{ContractViolation, MonotonicTimeNs, SchemaVersion, Validate};
