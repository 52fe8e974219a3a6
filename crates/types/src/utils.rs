//! Utility functions and helpers

use std::env;

/// Read a variable from the process environment, treating empty as unset
pub fn non_empty_var(key: &str) -> Option<String> {
    if key.is_empty() || key.contains('=') || key.contains('\0') {
        return None;
    }

    env::var_os(key)
        .filter(|value| !value.is_empty())
        .map(|value| value.to_string_lossy().into_owned())
}

/// Whether a variable is currently unset or empty in the process environment
pub fn is_unset(key: &str) -> bool {
    non_empty_var(key).is_none()
}

/// Validate that a string can be used as an environment variable name
pub fn is_valid_env_key(key: &str) -> bool {
    !key.is_empty() && !key.contains('=') && !key.contains('\0')
}

/// Validate that a string can be stored as an environment variable value
pub fn is_valid_env_value(value: &str) -> bool {
    !value.contains('\0')
}

/// Join a lookup prefix and a parameter name
pub fn prefixed_name(prefix: &str, name: &str) -> String {
    format!("{}{}", prefix, name)
}

/// Pick the first default, or an empty string when none is given
pub fn or_default(default: Option<&str>) -> String {
    default.unwrap_or_default().to_string()
}
