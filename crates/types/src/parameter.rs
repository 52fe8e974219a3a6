//! Parameter store entries

use serde::{Deserialize, Serialize};

/// A decrypted parameter as returned by the store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    /// Fully-qualified name, including the hierarchy path
    pub name: String,
    /// Decrypted value
    pub value: String,
}

impl Parameter {
    /// Create a new parameter
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Name relative to `path`, or `None` when the parameter lives elsewhere
    pub fn relative_name(&self, path: &str) -> Option<&str> {
        self.name.strip_prefix(path)
    }
}
