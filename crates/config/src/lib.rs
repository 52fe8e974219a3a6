//! Configuration management for ssmdotenv
//!
//! This crate handles parsing, validation, and management of the loader
//! settings from YAML files and `SSMDOTENV_*` environment variables.

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::ConfigLoader;
pub use schema::*;
pub use validation::*;
