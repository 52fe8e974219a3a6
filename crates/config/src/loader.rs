//! Configuration loader implementation

use crate::schema::Settings;
use crate::validation::ConfigValidator;
use anyhow::{Context, Result};
use figment::{
    providers::{Env, Format, Serialized, Yaml},
    Figment,
};
use std::path::Path;
use types::{ConfigError, SsmDotenvError};

/// Prefix for environment variables that configure the loader itself
pub const ENV_PREFIX: &str = "SSMDOTENV_";

/// Environment variable naming an optional YAML settings file
pub const CONFIG_PATH_ENV_VAR: &str = "SSMDOTENV_CONFIG";

/// Configuration loader that handles YAML files and environment variables
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from file and environment variables
    pub fn load<P: AsRef<Path>>(config_path: P) -> Result<Settings> {
        let config_path = config_path.as_ref();

        // Check if config file exists
        if !config_path.exists() {
            return Err(SsmDotenvError::from(ConfigError::FileNotFound {
                path: config_path.display().to_string(),
            })
            .into());
        }

        let settings: Settings = Self::base()
            .merge(Yaml::file(config_path))
            .merge(Self::env_provider())
            .extract()
            .context("Failed to parse configuration")?;

        Self::validate(&settings)?;

        Ok(settings)
    }

    /// Load configuration from defaults and `SSMDOTENV_*` variables.
    ///
    /// When `SSMDOTENV_CONFIG` names a file, it is layered between the
    /// defaults and the environment.
    pub fn from_env() -> Result<Settings> {
        if let Some(path) = types::utils::non_empty_var(CONFIG_PATH_ENV_VAR) {
            return Self::load(path);
        }

        let settings: Settings = Self::base()
            .merge(Self::env_provider())
            .extract()
            .context("Failed to parse configuration from environment")?;

        Self::validate(&settings)?;
        Ok(settings)
    }

    /// Load configuration from string (for testing)
    pub fn load_from_str(yaml_content: &str) -> Result<Settings> {
        let settings: Settings = Self::base()
            .merge(Yaml::string(yaml_content))
            .extract()
            .context("Failed to parse configuration from string")?;

        Self::validate(&settings)?;
        Ok(settings)
    }

    /// Get default configuration
    pub fn default() -> Settings {
        Settings::default()
    }

    /// Create example configuration file
    pub fn create_example<P: AsRef<Path>>(path: P) -> Result<()> {
        let settings = Self::default();
        let yaml_content = serde_yaml::to_string(&settings)
            .context("Failed to serialize default configuration")?;

        std::fs::write(path.as_ref(), yaml_content)
            .context("Failed to write example configuration file")?;

        Ok(())
    }

    fn base() -> Figment {
        Figment::from(Serialized::defaults(Settings::default()))
    }

    fn env_provider() -> Env {
        // SSMDOTENV_LOGGING__LEVEL -> logging.level
        Env::prefixed(ENV_PREFIX)
            .ignore(&["CONFIG"])
            .split("__")
    }

    /// Reject settings with validation errors; warnings are left to the caller
    fn validate(settings: &Settings) -> Result<()> {
        let report = ConfigValidator::validate(settings)?;

        if let Some(issue) = report.errors.first() {
            return Err(SsmDotenvError::from(ConfigError::ValidationError {
                field: issue.field.clone(),
                message: issue.message.clone(),
            })
            .into());
        }

        Ok(())
    }
}
