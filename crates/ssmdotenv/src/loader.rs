//! Layered loader facade

use crate::report::{DotenvOutcome, LoadReport, PathOutcome};
use crate::state::StoreState;
use config::{ConfigLoader, PathErrorPolicy, Settings};
use parameter_store::{AwsConnector, ParameterStore, StaticConnector, StoreConnector};
use std::env as process_env;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::OnceCell;
use types::utils::{
    is_unset, is_valid_env_key, is_valid_env_value, non_empty_var, or_default, prefixed_name,
};
use types::{Parameter, SsmDotenvError};

/// Dotenv file looked up in the working directory when no path is configured
const DOTENV_FILE: &str = ".env";

/// Log only when the loader is verbose
macro_rules! verbose {
    ($settings:expr, $level:ident, $($arg:tt)+) => {
        if $settings.verbose {
            tracing::$level!($($arg)+);
        }
    };
}

/// Value of `key` from the process environment, or `default` (empty when
/// `None`) when the variable is unset or empty
pub fn env(key: &str, default: Option<&str>) -> String {
    non_empty_var(key).unwrap_or_else(|| or_default(default))
}

/// Loads configuration from a dotenv file and the parameter store
pub struct SsmDotenv {
    settings: Settings,
    connector: Arc<dyn StoreConnector>,
    store: OnceCell<StoreState>,
}

impl SsmDotenv {
    /// Loader with default settings, connecting to AWS on first use
    pub fn new() -> Self {
        Self::with_settings(Settings::default())
    }

    /// Loader with explicit settings, connecting to AWS on first use
    pub fn with_settings(settings: Settings) -> Self {
        Self::builder().settings(settings).build()
    }

    /// Loader configured from `SSMDOTENV_*` variables
    pub fn from_env() -> anyhow::Result<Self> {
        let settings = ConfigLoader::from_env()?;
        Ok(Self::with_settings(settings))
    }

    pub fn builder() -> SsmDotenvBuilder {
        SsmDotenvBuilder::new()
    }

    /// Enable or disable loader log lines
    pub fn set_verbose(&mut self, verbose: bool) {
        self.settings.verbose = verbose;
    }

    /// Set the prefix prepended to single-parameter lookups
    pub fn set_prefix(&mut self, prefix: impl Into<String>) {
        self.settings.prefix = prefix.into();
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Construct the parameter store on first call and return the cached
    /// outcome afterwards. A failed construction is never retried.
    pub async fn store_state(&self) -> &StoreState {
        self.store
            .get_or_init(|| async {
                match self.connector.connect(&self.settings).await {
                    Ok(store) => {
                        verbose!(self.settings, debug, store = store.name(), "Parameter store ready");
                        StoreState::Ready(store)
                    }
                    Err(err) => {
                        verbose!(self.settings, warn, error = %err, "Can't create parameter store client");
                        StoreState::Unavailable(err.to_string())
                    }
                }
            })
            .await
    }

    /// Load the dotenv file, then every parameter below each path.
    ///
    /// Variables that already hold a non-empty value are never overwritten.
    /// Paths are processed in order; the parameter name with the path
    /// stripped becomes the variable name. Nothing is surfaced as an error:
    /// failures are logged when verbose and recorded in the report.
    pub async fn load<I, S>(&self, paths: I) -> LoadReport
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let paths: Vec<String> = paths.into_iter().map(|p| p.as_ref().to_string()).collect();
        let mut report = LoadReport::new(self.load_dotenv());

        let store = match self.store_state().await {
            StoreState::Ready(store) => Arc::clone(store),
            StoreState::Unavailable(reason) => {
                report.store_unavailable = Some(reason.clone());
                return report;
            }
        };

        for path in &paths {
            let outcome = self.load_path(store.as_ref(), path).await;
            let failed = !outcome.is_complete();
            report.paths.push(outcome);

            if failed && self.settings.on_path_error == PathErrorPolicy::Abort {
                report.aborted = report.paths.len() < paths.len();
                break;
            }
        }

        report
    }

    /// Fetch `prefix + name` from the store.
    ///
    /// Returns `default` (empty when `None`) when the store is unavailable or
    /// the lookup fails. Never touches the process environment.
    pub async fn get_parameter(&self, name: &str, default: Option<&str>) -> String {
        match self.try_get_parameter(name).await {
            Ok(value) => value,
            Err(_) => or_default(default),
        }
    }

    /// Like [`get_parameter`](Self::get_parameter), but reports why no value
    /// was returned
    pub async fn try_get_parameter(&self, name: &str) -> types::Result<String> {
        let store = match self.store_state().await {
            StoreState::Ready(store) => store,
            StoreState::Unavailable(reason) => {
                return Err(SsmDotenvError::StoreUnavailable(reason.clone()));
            }
        };

        let full_name = prefixed_name(&self.settings.prefix, name);

        match store.get_parameter(&full_name).await {
            Ok(parameter) => Ok(parameter.value),
            Err(err) => {
                verbose!(self.settings, warn, name = %full_name, error = %err, "Unable to get parameter");
                Err(err.into())
            }
        }
    }

    /// Value of `key` from the process environment, or `default`
    pub fn env(&self, key: &str, default: Option<&str>) -> String {
        env(key, default)
    }

    fn load_dotenv(&self) -> DotenvOutcome {
        let result = match self.settings.dotenv_path {
            Some(ref path) => dotenv::from_path(path).map(|_| path.clone()),
            None => {
                // Only the working directory; parent directories are not searched
                let path = process_env::current_dir()
                    .map(|dir| dir.join(DOTENV_FILE))
                    .unwrap_or_else(|_| PathBuf::from(DOTENV_FILE));
                dotenv::from_path(&path).map(|_| path)
            }
        };

        match result {
            Ok(path) => {
                verbose!(self.settings, info, path = %path.display(), "Loaded .env file");
                DotenvOutcome::Loaded(path)
            }
            Err(err) if err.not_found() => {
                verbose!(self.settings, info, ".env file not found");
                DotenvOutcome::NotFound
            }
            Err(err) => {
                verbose!(self.settings, warn, error = %err, "Could not load .env file");
                DotenvOutcome::Failed(err.to_string())
            }
        }
    }

    async fn load_path(&self, store: &dyn ParameterStore, path: &str) -> PathOutcome {
        let mut outcome = PathOutcome::new(path);
        let mut pages = store.parameters_by_path(path);

        while let Some(page) = pages.next_page().await {
            match page {
                Ok(parameters) => {
                    for parameter in parameters {
                        self.apply_parameter(path, parameter, &mut outcome);
                    }
                }
                Err(err) => {
                    verbose!(self.settings, warn, path = %path, error = %err, "Error getting parameters");
                    outcome.error = Some(err);
                    break;
                }
            }
        }

        if outcome.is_complete() && outcome.loaded.is_empty() {
            verbose!(self.settings, info, path = %path, "No parameters loaded from SSM for path");
        }

        outcome
    }

    fn apply_parameter(&self, path: &str, parameter: Parameter, outcome: &mut PathOutcome) {
        let key = parameter
            .relative_name(path)
            .filter(|key| is_valid_env_key(key) && is_valid_env_value(&parameter.value));

        let Some(key) = key else {
            verbose!(self.settings, warn, path = %path, name = %parameter.name, "Skipping parameter that cannot be stored as a variable");
            outcome.skipped_invalid.push(parameter.name.clone());
            return;
        };

        if !is_unset(key) {
            outcome.skipped_existing.push(key.to_string());
            return;
        }

        verbose!(self.settings, info, name = %key, "Loaded parameter");
        process_env::set_var(key, &parameter.value);
        outcome.loaded.push(key.to_string());
    }
}

impl Default for SsmDotenv {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for [`SsmDotenv`]
pub struct SsmDotenvBuilder {
    settings: Settings,
    connector: Option<Arc<dyn StoreConnector>>,
}

impl SsmDotenvBuilder {
    pub fn new() -> Self {
        Self {
            settings: Settings::default(),
            connector: None,
        }
    }

    /// Replace all settings
    pub fn settings(mut self, settings: Settings) -> Self {
        self.settings = settings;
        self
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.settings.verbose = verbose;
        self
    }

    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.settings.prefix = prefix.into();
        self
    }

    pub fn dotenv_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.settings.dotenv_path = Some(path.into());
        self
    }

    pub fn on_path_error(mut self, policy: PathErrorPolicy) -> Self {
        self.settings.on_path_error = policy;
        self
    }

    /// Use a custom connector instead of AWS
    pub fn connector(mut self, connector: impl StoreConnector + 'static) -> Self {
        self.connector = Some(Arc::new(connector));
        self
    }

    /// Use an already constructed store
    pub fn store(self, store: Arc<dyn ParameterStore>) -> Self {
        self.connector(StaticConnector::new(store))
    }

    pub fn build(self) -> SsmDotenv {
        SsmDotenv {
            settings: self.settings,
            connector: self
                .connector
                .unwrap_or_else(|| Arc::new(AwsConnector::new())),
            store: OnceCell::new(),
        }
    }
}

impl Default for SsmDotenvBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parameter_store::{InMemoryParameterStore, StoreResult, UnavailableConnector};
    use std::io::Write;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::NamedTempFile;
    use types::StoreError;

    // Every test uses its own variable names; tests share the process environment.

    fn builder() -> SsmDotenvBuilder {
        SsmDotenv::builder().dotenv_path("/nonexistent/ssmdotenv-tests/.env")
    }

    fn loader_with(store: &Arc<InMemoryParameterStore>) -> SsmDotenv {
        builder().store(store.clone()).build()
    }

    struct CountingConnector {
        inner: Arc<dyn StoreConnector>,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl StoreConnector for CountingConnector {
        async fn connect(&self, settings: &Settings) -> StoreResult<Arc<dyn ParameterStore>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::task::yield_now().await;
            self.inner.connect(settings).await
        }
    }

    #[test]
    fn test_env_value_and_defaults() {
        process_env::set_var("SSMD_ENV_SET", "v");
        process_env::set_var("SSMD_ENV_EMPTY", "");

        assert_eq!(env("SSMD_ENV_UNSET", None), "");
        assert_eq!(env("SSMD_ENV_UNSET", Some("d")), "d");
        assert_eq!(env("SSMD_ENV_SET", Some("d")), "v");
        assert_eq!(env("SSMD_ENV_EMPTY", Some("d")), "d");

        let loader = builder().connector(UnavailableConnector::new("offline")).build();
        assert_eq!(loader.env("SSMD_ENV_SET", None), "v");
    }

    #[tokio::test]
    async fn test_get_parameter_without_store_returns_default() {
        let loader = builder()
            .connector(UnavailableConnector::new("no credentials"))
            .build();

        assert_eq!(loader.get_parameter("token", None).await, "");
        assert_eq!(loader.get_parameter("token", Some("fallback")).await, "fallback");
        assert_eq!(
            loader.store_state().await.unavailable_reason(),
            Some("Parameter store unavailable: no credentials")
        );
        assert!(matches!(
            loader.try_get_parameter("token").await,
            Err(SsmDotenvError::StoreUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_get_parameter_uses_prefix() {
        let store = Arc::new(InMemoryParameterStore::new().with_parameter("/svc/token", "s3cret"));
        let loader = builder().prefix("/svc/").store(store.clone()).build();

        assert_eq!(loader.get_parameter("token", Some("unused")).await, "s3cret");
        assert_eq!(store.get_requests(), vec!["/svc/token"]);
    }

    #[tokio::test]
    async fn test_get_parameter_failure_returns_default() {
        let store = Arc::new(
            InMemoryParameterStore::new()
                .with_parameter("/svc/broken", "never")
                .failing_name("/svc/broken"),
        );
        let mut loader = loader_with(&store);
        loader.set_prefix("/svc/");

        assert_eq!(loader.get_parameter("broken", Some("d")).await, "d");
        assert_eq!(loader.get_parameter("missing", None).await, "");
        assert!(matches!(
            loader.try_get_parameter("missing").await,
            Err(SsmDotenvError::NotFound { ref resource }) if resource == "/svc/missing"
        ));
    }

    #[tokio::test]
    async fn test_get_parameter_does_not_touch_environment() {
        let store = Arc::new(InMemoryParameterStore::new().with_parameter("SSMD_GET_NO_ENV", "remote"));
        let loader = loader_with(&store);

        assert_eq!(loader.get_parameter("SSMD_GET_NO_ENV", None).await, "remote");
        assert!(process_env::var_os("SSMD_GET_NO_ENV").is_none());
    }

    #[tokio::test]
    async fn test_load_sets_unset_variables() {
        let store = Arc::new(
            InMemoryParameterStore::new()
                .with_parameter("/load-basic/SSMD_BASIC_FOO", "1")
                .with_parameter("/load-basic/SSMD_BASIC_BAR", "2"),
        );
        let loader = loader_with(&store);

        let report = loader.load(["/load-basic/"]).await;

        assert_eq!(process_env::var("SSMD_BASIC_FOO").unwrap(), "1");
        assert_eq!(process_env::var("SSMD_BASIC_BAR").unwrap(), "2");
        assert_eq!(report.loaded_count(), 2);
        assert!(report.is_complete());
        assert_eq!(report.dotenv, DotenvOutcome::NotFound);
    }

    #[tokio::test]
    async fn test_load_never_overwrites_existing_values() {
        process_env::set_var("SSMD_KEEP_BAR", "existing");
        process_env::set_var("SSMD_KEEP_EMPTY", "");

        let store = Arc::new(
            InMemoryParameterStore::new()
                .with_parameter("/load-keep/SSMD_KEEP_FOO", "1")
                .with_parameter("/load-keep/SSMD_KEEP_BAR", "2")
                .with_parameter("/load-keep/SSMD_KEEP_EMPTY", "filled"),
        );
        let loader = loader_with(&store);

        let report = loader.load(["/load-keep/"]).await;

        assert_eq!(process_env::var("SSMD_KEEP_FOO").unwrap(), "1");
        assert_eq!(process_env::var("SSMD_KEEP_BAR").unwrap(), "existing");
        assert_eq!(process_env::var("SSMD_KEEP_EMPTY").unwrap(), "filled");

        let outcome = report.path("/load-keep/").unwrap();
        assert_eq!(outcome.skipped_existing, vec!["SSMD_KEEP_BAR"]);
        assert_eq!(outcome.loaded.len(), 2);
    }

    #[tokio::test]
    async fn test_load_walks_every_page_and_nested_names() {
        let store = Arc::new(
            InMemoryParameterStore::new()
                .with_parameter("/load-pages/SSMD_PAGES_A", "a")
                .with_parameter("/load-pages/SSMD_PAGES_B", "b")
                .with_parameter("/load-pages/SSMD_PAGES_C", "c")
                .with_parameter("/load-pages/nested/SSMD_PAGES_D", "d")
                .with_page_size(1),
        );
        let loader = loader_with(&store);

        let report = loader.load(["/load-pages/"]).await;

        assert_eq!(report.loaded_count(), 4);
        assert_eq!(process_env::var("SSMD_PAGES_C").unwrap(), "c");
        assert_eq!(process_env::var("nested/SSMD_PAGES_D").unwrap(), "d");
    }

    #[tokio::test]
    async fn test_first_path_wins_across_paths() {
        let store = Arc::new(
            InMemoryParameterStore::new()
                .with_parameter("/load-order/shared/SSMD_ORDER_X", "shared")
                .with_parameter("/load-order/service/SSMD_ORDER_X", "service"),
        );
        let loader = loader_with(&store);

        let report = loader
            .load(vec!["/load-order/service/".to_string(), "/load-order/shared/".to_string()])
            .await;

        assert_eq!(process_env::var("SSMD_ORDER_X").unwrap(), "service");
        assert_eq!(
            report.path("/load-order/shared/").unwrap().skipped_existing,
            vec!["SSMD_ORDER_X"]
        );
    }

    #[tokio::test]
    async fn test_page_error_aborts_remaining_paths() {
        let store = Arc::new(
            InMemoryParameterStore::new()
                .with_parameter("/abort-a/SSMD_ABORT_A1", "1")
                .with_parameter("/abort-a/SSMD_ABORT_A2", "2")
                .with_parameter("/abort-b/SSMD_ABORT_B", "b")
                .with_page_size(1)
                .failing_page("/abort-a/", 1),
        );
        let loader = loader_with(&store);

        let report = loader.load(["/abort-a/", "/abort-b/"]).await;

        // Writes made before the failure are kept
        assert_eq!(process_env::var("SSMD_ABORT_A1").unwrap(), "1");
        assert!(process_env::var_os("SSMD_ABORT_A2").is_none());
        assert!(process_env::var_os("SSMD_ABORT_B").is_none());

        assert!(report.aborted);
        assert!(!report.is_complete());
        assert_eq!(report.paths.len(), 1);
        assert!(matches!(
            report.paths[0].error,
            Some(StoreError::Request { .. })
        ));
        assert_eq!(store.path_requests(), vec!["/abort-a/"]);
    }

    #[tokio::test]
    async fn test_skip_path_policy_continues() {
        let store = Arc::new(
            InMemoryParameterStore::new()
                .with_parameter("/skip-a/SSMD_SKIP_A", "a")
                .with_parameter("/skip-b/SSMD_SKIP_B", "b")
                .failing_page("/skip-a/", 0),
        );
        let loader = builder()
            .on_path_error(PathErrorPolicy::SkipPath)
            .store(store.clone())
            .build();

        let report = loader.load(["/skip-a/", "/skip-b/"]).await;

        assert!(process_env::var_os("SSMD_SKIP_A").is_none());
        assert_eq!(process_env::var("SSMD_SKIP_B").unwrap(), "b");
        assert!(!report.aborted);
        assert!(!report.is_complete());
        assert!(report.path("/skip-b/").unwrap().is_complete());
    }

    #[tokio::test]
    async fn test_unusable_names_are_skipped() {
        let store = Arc::new(
            InMemoryParameterStore::new()
                .with_parameter("/invalid/", "empty name")
                .with_parameter("/invalid/SSMD_INVALID=X", "equals")
                .with_parameter("/invalid/SSMD_INVALID_NUL", "nul\0byte")
                .with_parameter("/invalid/SSMD_INVALID_OK", "ok"),
        );
        let loader = builder().verbose(true).store(store.clone()).build();

        let report = loader.load(["/invalid/"]).await;

        let outcome = report.path("/invalid/").unwrap();
        assert_eq!(outcome.loaded, vec!["SSMD_INVALID_OK"]);
        assert_eq!(outcome.skipped_invalid.len(), 3);
        assert!(process_env::var_os("SSMD_INVALID_NUL").is_none());
    }

    #[tokio::test]
    async fn test_empty_path_is_not_an_error() {
        let store = Arc::new(InMemoryParameterStore::new());
        let mut loader = loader_with(&store);
        loader.set_verbose(true);

        let report = loader.load(["/nothing-here/"]).await;

        assert!(report.is_complete());
        assert_eq!(report.loaded_count(), 0);
        assert!(loader.settings().verbose);
    }

    #[tokio::test]
    async fn test_load_without_store_still_reads_dotenv() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "SSMD_OFFLINE_LOCAL=from-file").unwrap();

        let loader = SsmDotenv::builder()
            .dotenv_path(file.path())
            .connector(UnavailableConnector::new("offline"))
            .build();

        let report = loader.load(["/offline/"]).await;

        assert_eq!(report.dotenv, DotenvOutcome::Loaded(file.path().to_path_buf()));
        assert_eq!(process_env::var("SSMD_OFFLINE_LOCAL").unwrap(), "from-file");
        assert!(report.store_unavailable.is_some());
        assert!(report.paths.is_empty());
    }

    #[tokio::test]
    async fn test_dotenv_values_take_precedence_over_remote() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "SSMD_DOTENV_PORT=8080").unwrap();

        let store = Arc::new(
            InMemoryParameterStore::new()
                .with_parameter("/dotenv-first/SSMD_DOTENV_PORT", "9090")
                .with_parameter("/dotenv-first/SSMD_DOTENV_HOST", "db.internal"),
        );
        let loader = SsmDotenv::builder()
            .dotenv_path(file.path())
            .store(store.clone())
            .build();

        loader.load(["/dotenv-first/"]).await;

        assert_eq!(process_env::var("SSMD_DOTENV_PORT").unwrap(), "8080");
        assert_eq!(process_env::var("SSMD_DOTENV_HOST").unwrap(), "db.internal");
    }

    /// Restores the working directory when dropped
    struct CurrentDirGuard(PathBuf);

    impl Drop for CurrentDirGuard {
        fn drop(&mut self) {
            let _ = process_env::set_current_dir(&self.0);
        }
    }

    // The only test that changes the working directory.
    #[tokio::test]
    async fn test_default_dotenv_is_read_from_working_directory_only() {
        let root = tempfile::tempdir().unwrap();
        let child = root.path().join("child");
        std::fs::create_dir(&child).unwrap();
        std::fs::write(root.path().join(".env"), "SSMD_CWD_PARENT=from-parent\n").unwrap();

        let _guard = CurrentDirGuard(process_env::current_dir().unwrap());
        process_env::set_current_dir(&child).unwrap();

        let loader = SsmDotenv::builder()
            .connector(UnavailableConnector::new("offline"))
            .build();

        let report = loader.load(Vec::<String>::new()).await;
        assert_eq!(report.dotenv, DotenvOutcome::NotFound);
        assert!(process_env::var_os("SSMD_CWD_PARENT").is_none());

        std::fs::write(child.join(".env"), "SSMD_CWD_CHILD=from-child\n").unwrap();

        let report = loader.load(Vec::<String>::new()).await;
        let expected = process_env::current_dir().unwrap().join(".env");
        assert_eq!(report.dotenv, DotenvOutcome::Loaded(expected));
        assert_eq!(process_env::var("SSMD_CWD_CHILD").unwrap(), "from-child");
        assert!(process_env::var_os("SSMD_CWD_PARENT").is_none());
    }

    #[tokio::test]
    async fn test_malformed_dotenv_is_not_fatal() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "SSMD_MALFORMED='unterminated").unwrap();

        let loader = SsmDotenv::builder()
            .dotenv_path(file.path())
            .connector(UnavailableConnector::new("offline"))
            .build();

        let report = loader.load(Vec::<String>::new()).await;
        assert!(matches!(report.dotenv, DotenvOutcome::Failed(_)));
    }

    #[tokio::test]
    async fn test_store_is_constructed_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let loader = builder()
            .connector(CountingConnector {
                inner: Arc::new(parameter_store::StaticConnector::new(Arc::new(
                    InMemoryParameterStore::new().with_parameter("/once/token", "t"),
                ))),
                calls: calls.clone(),
            })
            .build();

        let (a, b) = tokio::join!(
            loader.get_parameter("/once/token", None),
            loader.get_parameter("/once/token", None)
        );
        loader.load(["/once-nothing/"]).await;

        assert_eq!(a, "t");
        assert_eq!(b, "t");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_construction_is_not_retried() {
        let calls = Arc::new(AtomicUsize::new(0));
        let loader = builder()
            .connector(CountingConnector {
                inner: Arc::new(UnavailableConnector::new("bad region")),
                calls: calls.clone(),
            })
            .build();

        assert_eq!(loader.get_parameter("a", Some("x")).await, "x");
        assert_eq!(loader.get_parameter("b", Some("y")).await, "y");
        let report = loader.load(["/retry/"]).await;

        assert!(report.store_unavailable.is_some());
        assert!(!loader.store_state().await.is_ready());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
