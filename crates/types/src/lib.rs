//! Shared types for ssmdotenv
//!
//! This crate contains the parameter model and the error taxonomy used by the
//! configuration, parameter store and facade crates.

pub mod error;
pub mod parameter;
pub mod utils;

// Re-export commonly used types
pub use error::{ConfigError, Result, SsmDotenvError, StoreError};
pub use parameter::Parameter;
