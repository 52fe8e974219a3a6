//! Parameter store availability

use parameter_store::ParameterStore;
use std::fmt;
use std::sync::Arc;

/// Outcome of constructing the parameter store, computed once per loader
#[derive(Clone)]
pub enum StoreState {
    /// The store is ready for use
    Ready(Arc<dyn ParameterStore>),
    /// Construction failed; remote lookups fall back to defaults
    Unavailable(String),
}

impl StoreState {
    /// Whether the store can be used
    pub fn is_ready(&self) -> bool {
        matches!(self, StoreState::Ready(_))
    }

    /// The store, when ready
    pub fn store(&self) -> Option<&Arc<dyn ParameterStore>> {
        match self {
            StoreState::Ready(store) => Some(store),
            StoreState::Unavailable(_) => None,
        }
    }

    /// Why the store is unavailable
    pub fn unavailable_reason(&self) -> Option<&str> {
        match self {
            StoreState::Ready(_) => None,
            StoreState::Unavailable(reason) => Some(reason),
        }
    }
}

impl fmt::Debug for StoreState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreState::Ready(store) => f.debug_tuple("Ready").field(&store.name()).finish(),
            StoreState::Unavailable(reason) => f.debug_tuple("Unavailable").field(reason).finish(),
        }
    }
}
