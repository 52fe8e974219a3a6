//! Configuration schema definitions

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Region used when `AWS_REGION` is unset or empty
pub const DEFAULT_REGION: &str = "eu-west-3";

/// Environment variable consulted for the AWS region
pub const REGION_ENV_VAR: &str = "AWS_REGION";

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Emit log lines for loader activity
    #[serde(default = "default_false")]
    pub verbose: bool,
    /// Prefix prepended to single-parameter lookups
    #[serde(default)]
    pub prefix: String,
    /// Region used when `AWS_REGION` is not set
    #[serde(default = "default_region")]
    pub default_region: String,
    /// Dotenv file to load; `.env` in the working directory when unset
    #[serde(default)]
    pub dotenv_path: Option<PathBuf>,
    /// Endpoint override for the parameter store
    #[serde(default)]
    pub endpoint_url: Option<String>,
    /// Resolve credentials once while constructing the client
    #[serde(default = "default_true")]
    pub verify_credentials: bool,
    /// What to do when a page fetch fails during a bulk load
    #[serde(default)]
    pub on_path_error: PathErrorPolicy,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Behaviour of a bulk load after a page fetch fails
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathErrorPolicy {
    /// Stop the whole load; later paths are not attempted
    #[default]
    Abort,
    /// Abandon the failing path and continue with the next one
    SkipPath,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (json, pretty)
    #[serde(default = "default_log_format")]
    pub format: String,
}

// Default value functions
fn default_true() -> bool {
    true
}

fn default_false() -> bool {
    false
}

fn default_region() -> String {
    DEFAULT_REGION.to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

impl Settings {
    /// Region from `AWS_REGION`, falling back to `default_region`
    pub fn resolve_region(&self) -> String {
        types::utils::non_empty_var(REGION_ENV_VAR).unwrap_or_else(|| self.default_region.clone())
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            verbose: default_false(),
            prefix: String::new(),
            default_region: default_region(),
            dotenv_path: None,
            endpoint_url: None,
            verify_credentials: default_true(),
            on_path_error: PathErrorPolicy::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}
