//! Error types for ssmdotenv

use thiserror::Error;

/// Main error type for ssmdotenv
#[derive(Error, Debug)]
pub enum SsmDotenvError {
    /// Configuration related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Parameter store communication errors
    #[error("Parameter store error: {operation}: {message}")]
    Store { operation: String, message: String },

    /// Parameter store could not be constructed
    #[error("Parameter store unavailable: {0}")]
    StoreUnavailable(String),

    /// Not found errors
    #[error("Resource not found: {resource}")]
    NotFound { resource: String },
}

/// Result type alias for ssmdotenv operations
pub type Result<T> = std::result::Result<T, SsmDotenvError>;

/// Parameter store specific errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The requested parameter does not exist
    #[error("Parameter not found: {name}")]
    NotFound { name: String },

    /// Request failed (transport, throttling, access denied, ...)
    #[error("{operation} failed for {target}: {message}")]
    Request {
        operation: String,
        target: String,
        message: String,
    },

    /// The response could not be interpreted
    #[error("Invalid response from {operation}: {message}")]
    InvalidResponse { operation: String, message: String },

    /// Client construction failed
    #[error("Parameter store unavailable: {0}")]
    Unavailable(String),
}

/// Configuration specific errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// File not found
    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },

    /// Validation error
    #[error("Configuration validation error: {field}: {message}")]
    ValidationError { field: String, message: String },
}

impl From<StoreError> for SsmDotenvError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { name } => SsmDotenvError::NotFound { resource: name },
            StoreError::Request {
                operation,
                target,
                message,
            } => SsmDotenvError::Store {
                operation,
                message: format!("{}: {}", target, message),
            },
            StoreError::InvalidResponse { operation, message } => {
                SsmDotenvError::Store { operation, message }
            }
            StoreError::Unavailable(reason) => SsmDotenvError::StoreUnavailable(reason),
        }
    }
}

impl From<ConfigError> for SsmDotenvError {
    fn from(err: ConfigError) -> Self {
        SsmDotenvError::Config(err.to_string())
    }
}
