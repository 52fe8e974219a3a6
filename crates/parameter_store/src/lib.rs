//! Parameter store clients for ssmdotenv
//!
//! This crate defines the small capability interface the loader needs from a
//! remote parameter store, the AWS Systems Manager implementation of it, and
//! an in-memory store for tests.

pub mod aws;
pub mod connector;
pub mod memory;
pub mod store;

pub use aws::*;
pub use connector::*;
pub use memory::*;
pub use store::*;
