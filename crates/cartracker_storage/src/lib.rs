#![forbid(unsafe_code)]

pub mod memory;
pub mod repo;
pub mod stub;
