#![forbid(unsafe_code)]

pub mod chaincode;
pub mod config;
pub mod identity;
pub mod runtime;
