//! Lazy construction of the AWS parameter store

use crate::aws::AwsParameterStore;
use crate::store::{ParameterStore, StoreConnector, StoreResult};
use async_trait::async_trait;
use aws_config::{BehaviorVersion, ConfigLoader, Region};
use aws_credential_types::provider::ProvideCredentials;
use aws_sdk_ssm::error::DisplayErrorContext;
use config::Settings;
use std::sync::Arc;
use types::StoreError;

/// Connects to AWS Systems Manager using the default credential chain
#[derive(Debug, Clone, Default)]
pub struct AwsConnector;

impl AwsConnector {
    /// Create a new connector
    pub fn new() -> Self {
        Self
    }

    /// SDK config loader for the resolved region and optional endpoint override
    pub fn sdk_loader(settings: &Settings) -> ConfigLoader {
        let loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(settings.resolve_region()));

        match settings.endpoint_url {
            Some(ref url) => loader.endpoint_url(url),
            None => loader,
        }
    }
}

#[async_trait]
impl StoreConnector for AwsConnector {
    async fn connect(&self, settings: &Settings) -> StoreResult<Arc<dyn ParameterStore>> {
        let sdk_config = Self::sdk_loader(settings).load().await;

        if settings.verify_credentials {
            let provider = sdk_config.credentials_provider().ok_or_else(|| {
                StoreError::Unavailable("no credentials provider configured".to_string())
            })?;

            provider.provide_credentials().await.map_err(|e| {
                StoreError::Unavailable(format!(
                    "failed to resolve credentials: {}",
                    DisplayErrorContext(&e)
                ))
            })?;
        }

        tracing::debug!(
            region = ?sdk_config.region(),
            endpoint = ?settings.endpoint_url,
            "Parameter store client constructed"
        );

        Ok(Arc::new(AwsParameterStore::from_sdk_config(&sdk_config)))
    }
}
