//! Bulk load results

use std::path::PathBuf;
use types::StoreError;

/// What happened to the dotenv file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DotenvOutcome {
    /// The file was found and applied
    Loaded(PathBuf),
    /// No file was found
    NotFound,
    /// The file exists but could not be read or parsed
    Failed(String),
}

/// Result of loading one parameter path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathOutcome {
    /// Path as given by the caller
    pub path: String,
    /// Variables written to the environment
    pub loaded: Vec<String>,
    /// Variables left alone because they already had a value
    pub skipped_existing: Vec<String>,
    /// Parameters that could not be turned into a variable
    pub skipped_invalid: Vec<String>,
    /// Page error that ended the listing
    pub error: Option<StoreError>,
}

impl PathOutcome {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            loaded: Vec::new(),
            skipped_existing: Vec::new(),
            skipped_invalid: Vec::new(),
            error: None,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.error.is_none()
    }
}

/// Summary of a bulk load
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadReport {
    /// Dotenv file outcome
    pub dotenv: DotenvOutcome,
    /// Reason the store could not be used, if any
    pub store_unavailable: Option<String>,
    /// One entry per attempted path, in the order given
    pub paths: Vec<PathOutcome>,
    /// A page error stopped the load before every path was attempted
    pub aborted: bool,
}

impl LoadReport {
    pub fn new(dotenv: DotenvOutcome) -> Self {
        Self {
            dotenv,
            store_unavailable: None,
            paths: Vec::new(),
            aborted: false,
        }
    }

    /// Total number of variables written
    pub fn loaded_count(&self) -> usize {
        self.paths.iter().map(|p| p.loaded.len()).sum()
    }

    /// Outcome for `path`, if it was attempted
    pub fn path(&self, path: &str) -> Option<&PathOutcome> {
        self.paths.iter().find(|p| p.path == path)
    }

    /// Whether every path completed without error
    pub fn is_complete(&self) -> bool {
        self.store_unavailable.is_none() && !self.aborted && self.paths.iter().all(PathOutcome::is_complete)
    }
}
