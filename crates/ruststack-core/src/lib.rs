//! Core types, configuration, and request identifiers for RustStack.
//!
//! This crate provides the building blocks shared by the protocol crates:
//! account and region identifiers, the environment-driven configuration,
//! and the generator behind every `RequestId` a response carries.

mod config;
mod error;
mod request_id;
mod types;

pub use config::RustStackConfig;
pub use error::{RustStackError, RustStackResult};
pub use request_id::{AmznRequestIdGenerator, REQUEST_ID_LENGTH, RequestIdGenerator};
pub use types::{AccountId, AwsRegion};
