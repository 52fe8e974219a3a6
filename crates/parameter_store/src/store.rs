//! Parameter store capability traits

use async_trait::async_trait;
use config::Settings;
use std::sync::Arc;
use types::{Parameter, StoreError};

/// Result of a parameter store call
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Remote parameter store.
///
/// Both operations always request decrypted values. Listing by path is
/// recursive and returns a fresh page sequence on every call.
#[async_trait]
pub trait ParameterStore: Send + Sync {
    /// Fetch a single parameter by its fully-qualified name
    async fn get_parameter(&self, name: &str) -> StoreResult<Parameter>;

    /// Start paging through every parameter below `path`
    fn parameters_by_path<'a>(&'a self, path: &str) -> Box<dyn ParameterPages + 'a>;

    /// Get the name of the store implementation
    fn name(&self) -> &str;
}

/// Lazy, ordered sequence of parameter pages.
///
/// Returns `None` once the store reports no further pages. A failed page
/// ends the sequence.
#[async_trait]
pub trait ParameterPages: Send {
    /// Fetch the next page
    async fn next_page(&mut self) -> Option<StoreResult<Vec<Parameter>>>;
}

/// Builds a parameter store from settings.
///
/// Called at most once per facade, on first remote access.
#[async_trait]
pub trait StoreConnector: Send + Sync {
    /// Construct the store, or explain why it is unavailable
    async fn connect(&self, settings: &Settings) -> StoreResult<Arc<dyn ParameterStore>>;
}

/// Connector that hands out an already constructed store
#[derive(Clone)]
pub struct StaticConnector {
    store: Arc<dyn ParameterStore>,
}

impl StaticConnector {
    /// Wrap an existing store
    pub fn new(store: Arc<dyn ParameterStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl StoreConnector for StaticConnector {
    async fn connect(&self, _settings: &Settings) -> StoreResult<Arc<dyn ParameterStore>> {
        Ok(Arc::clone(&self.store))
    }
}

/// Connector that always fails, for environments without a store
#[derive(Debug, Clone)]
pub struct UnavailableConnector {
    reason: String,
}

impl UnavailableConnector {
    /// Create a connector failing with `reason`
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl StoreConnector for UnavailableConnector {
    async fn connect(&self, _settings: &Settings) -> StoreResult<Arc<dyn ParameterStore>> {
        Err(StoreError::Unavailable(self.reason.clone()))
    }
}
