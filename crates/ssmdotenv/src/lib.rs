//! Layered configuration from a dotenv file and AWS Systems Manager
//!
//! [`SsmDotenv`] loads a local `.env` file, then fills in every variable that
//! is still unset from Parameter Store paths. Local values always win: a
//! remote value is only written when the variable is unset or empty.
//!
//! ```no_run
//! # async fn run() {
//! let loader = ssmdotenv::SsmDotenv::builder()
//!     .verbose(true)
//!     .prefix("/my-service/")
//!     .build();
//!
//! loader.load(["/my-service/env/"]).await;
//!
//! let token = loader.get_parameter("token", None).await;
//! let port = ssmdotenv::env("PORT", Some("8080"));
//! # let _ = (token, port);
//! # }
//! ```

pub mod loader;
pub mod logging;
pub mod report;
pub mod state;

pub use loader::{env, SsmDotenv, SsmDotenvBuilder};
pub use logging::init_logging;
pub use report::{DotenvOutcome, LoadReport, PathOutcome};
pub use state::StoreState;

pub use config::{PathErrorPolicy, Settings};
pub use parameter_store::{ParameterPages, ParameterStore, StoreConnector};
pub use types::{Parameter, SsmDotenvError, StoreError};
