//! Configuration validation utilities

use crate::schema::Settings;
use types::Result;

/// Configuration validator
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate complete configuration
    pub fn validate(settings: &Settings) -> Result<ValidationReport> {
        let mut report = ValidationReport::new();

        Self::validate_prefix(settings, &mut report);
        Self::validate_region(settings, &mut report);
        Self::validate_endpoint(settings, &mut report);
        Self::validate_dotenv(settings, &mut report);
        Self::validate_logging(settings, &mut report);

        Ok(report)
    }

    fn validate_prefix(settings: &Settings, report: &mut ValidationReport) {
        if settings.prefix.is_empty() {
            return;
        }

        if !settings.prefix.starts_with('/') {
            report.add_warning(
                "prefix",
                &format!("Prefix '{}' does not start with '/', hierarchical names will not match", settings.prefix),
            );
        }

        if settings.prefix.chars().any(char::is_whitespace) {
            report.add_error("prefix", "Prefix cannot contain whitespace");
        }
    }

    fn validate_region(settings: &Settings, report: &mut ValidationReport) {
        if settings.default_region.trim().is_empty() {
            report.add_error("default_region", "Default region cannot be empty");
        } else if !settings
            .default_region
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        {
            report.add_warning(
                "default_region",
                &format!("Unusual region name '{}'", settings.default_region),
            );
        }
    }

    fn validate_endpoint(settings: &Settings, report: &mut ValidationReport) {
        if let Some(ref url) = settings.endpoint_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                report.add_error("endpoint_url", "Endpoint URL must start with http:// or https://");
            } else if url.starts_with("http://") {
                report.add_warning("endpoint_url", "Endpoint URL does not use HTTPS");
            }
        }
    }

    fn validate_dotenv(settings: &Settings, report: &mut ValidationReport) {
        if let Some(ref path) = settings.dotenv_path {
            if path.as_os_str().is_empty() {
                report.add_error("dotenv_path", "Dotenv path cannot be empty");
            } else if !path.exists() {
                report.add_warning(
                    "dotenv_path",
                    &format!("Dotenv file {} does not exist", path.display()),
                );
            }
        }
    }

    fn validate_logging(settings: &Settings, report: &mut ValidationReport) {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&settings.logging.level.as_str()) {
            report.add_error("logging.level", &format!("Invalid log level: {}. Valid levels: {:?}", settings.logging.level, valid_levels));
        }

        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&settings.logging.format.as_str()) {
            report.add_error("logging.format", &format!("Invalid log format: {}. Valid formats: {:?}", settings.logging.format, valid_formats));
        }
    }
}

/// Validation report containing errors and warnings
#[derive(Debug, Clone)]
pub struct ValidationReport {
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
}

/// A validation issue (error or warning)
#[derive(Debug, Clone)]
pub struct ValidationIssue {
    pub field: String,
    pub message: String,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self {
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn add_error(&mut self, field: &str, message: &str) {
        self.errors.push(ValidationIssue {
            field: field.to_string(),
            message: message.to_string(),
        });
    }

    pub fn add_warning(&mut self, field: &str, message: &str) {
        self.warnings.push(ValidationIssue {
            field: field.to_string(),
            message: message.to_string(),
        });
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    pub fn is_valid(&self) -> bool {
        !self.has_errors()
    }

    pub fn summary(&self) -> String {
        format!("Validation: {} errors, {} warnings", self.errors.len(), self.warnings.len())
    }
}

impl Default for ValidationReport {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::PathErrorPolicy;

    #[test]
    fn test_default_settings_are_valid() {
        let report = ConfigValidator::validate(&Settings::default()).unwrap();
        assert!(report.is_valid());
        assert!(!report.has_warnings());
    }

    #[test]
    fn test_prefix_without_leading_slash_warns() {
        let settings = Settings {
            prefix: "svc/".to_string(),
            ..Settings::default()
        };
        let report = ConfigValidator::validate(&settings).unwrap();
        assert!(report.is_valid());
        assert_eq!(report.warnings[0].field, "prefix");
    }

    #[test]
    fn test_invalid_settings() {
        let settings = Settings {
            prefix: "/my svc/".to_string(),
            default_region: "  ".to_string(),
            endpoint_url: Some("localhost:4566".to_string()),
            on_path_error: PathErrorPolicy::SkipPath,
            ..Settings::default()
        };
        let report = ConfigValidator::validate(&settings).unwrap();
        let fields: Vec<_> = report.errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["prefix", "default_region", "endpoint_url"]);
        assert_eq!(report.summary(), "Validation: 3 errors, 0 warnings");
    }

    #[test]
    fn test_missing_dotenv_file_warns() {
        let settings = Settings {
            dotenv_path: Some("/definitely/not/here/.env".into()),
            ..Settings::default()
        };
        let report = ConfigValidator::validate(&settings).unwrap();
        assert!(report.is_valid());
        assert_eq!(report.warnings[0].field, "dotenv_path");
    }

    #[test]
    fn test_invalid_logging() {
        let mut settings = Settings::default();
        settings.logging.level = "loud".to_string();
        settings.logging.format = "xml".to_string();
        let report = ConfigValidator::validate(&settings).unwrap();
        assert_eq!(report.errors.len(), 2);
    }
}
