//! In-memory parameter store

use crate::store::{ParameterPages, ParameterStore, StoreResult};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::sync::Mutex;
use types::{Parameter, StoreError};

/// Largest page the real service returns
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Parameter store kept in memory, with injectable failures.
///
/// Listing by path matches every name starting with the path and returns the
/// results in name order.
#[derive(Debug)]
pub struct InMemoryParameterStore {
    parameters: BTreeMap<String, String>,
    page_size: usize,
    failing_names: HashSet<String>,
    failing_pages: HashMap<String, usize>,
    get_requests: Mutex<Vec<String>>,
    path_requests: Mutex<Vec<String>>,
}

impl InMemoryParameterStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            parameters: BTreeMap::new(),
            page_size: DEFAULT_PAGE_SIZE,
            failing_names: HashSet::new(),
            failing_pages: HashMap::new(),
            get_requests: Mutex::new(Vec::new()),
            path_requests: Mutex::new(Vec::new()),
        }
    }

    /// Add a parameter
    pub fn with_parameter(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.insert(name.into(), value.into());
        self
    }

    /// Set the number of parameters per page (minimum 1)
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Make single lookups of `name` fail with a request error
    pub fn failing_name(mut self, name: impl Into<String>) -> Self {
        self.failing_names.insert(name.into());
        self
    }

    /// Make the page at `index` (zero-based) fail when listing `path`
    pub fn failing_page(mut self, path: impl Into<String>, index: usize) -> Self {
        self.failing_pages.insert(path.into(), index);
        self
    }

    /// Names requested through `get_parameter`, in call order
    pub fn get_requests(&self) -> Vec<String> {
        self.get_requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    /// Paths requested through `parameters_by_path`, in call order
    pub fn path_requests(&self) -> Vec<String> {
        self.path_requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    fn record(log: &Mutex<Vec<String>>, entry: &str) {
        if let Ok(mut log) = log.lock() {
            log.push(entry.to_string());
        }
    }
}

impl Default for InMemoryParameterStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ParameterStore for InMemoryParameterStore {
    async fn get_parameter(&self, name: &str) -> StoreResult<Parameter> {
        Self::record(&self.get_requests, name);

        if self.failing_names.contains(name) {
            return Err(StoreError::Request {
                operation: "GetParameter".to_string(),
                target: name.to_string(),
                message: "injected failure".to_string(),
            });
        }

        self.parameters
            .get(name)
            .map(|value| Parameter::new(name, value.as_str()))
            .ok_or_else(|| StoreError::NotFound {
                name: name.to_string(),
            })
    }

    fn parameters_by_path<'a>(&'a self, path: &str) -> Box<dyn ParameterPages + 'a> {
        Self::record(&self.path_requests, path);

        let matching: Vec<Parameter> = self
            .parameters
            .range(path.to_string()..)
            .take_while(|(name, _)| name.starts_with(path))
            .map(|(name, value)| Parameter::new(name.as_str(), value.as_str()))
            .collect();

        // The service answers an empty listing with a single empty page
        let mut pages: VecDeque<Vec<Parameter>> = matching
            .chunks(self.page_size)
            .map(<[Parameter]>::to_vec)
            .collect();
        if pages.is_empty() {
            pages.push_back(Vec::new());
        }

        Box::new(InMemoryPages {
            path: path.to_string(),
            pages,
            index: 0,
            fail_at: self.failing_pages.get(path).copied(),
            finished: false,
        })
    }

    fn name(&self) -> &str {
        "in-memory"
    }
}

struct InMemoryPages {
    path: String,
    pages: VecDeque<Vec<Parameter>>,
    index: usize,
    fail_at: Option<usize>,
    finished: bool,
}

#[async_trait]
impl ParameterPages for InMemoryPages {
    async fn next_page(&mut self) -> Option<StoreResult<Vec<Parameter>>> {
        if self.finished {
            return None;
        }

        if self.fail_at == Some(self.index) {
            self.finished = true;
            return Some(Err(StoreError::Request {
                operation: "GetParametersByPath".to_string(),
                target: self.path.clone(),
                message: format!("injected failure on page {}", self.index),
            }));
        }

        let page = self.pages.pop_front()?;
        self.index += 1;
        Some(Ok(page))
    }
}
