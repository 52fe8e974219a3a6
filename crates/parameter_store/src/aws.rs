//! AWS Systems Manager Parameter Store client

use crate::store::{ParameterPages, ParameterStore, StoreResult};
use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_ssm::config::http::HttpResponse;
use aws_sdk_ssm::error::{DisplayErrorContext, SdkError};
use aws_sdk_ssm::operation::get_parameters_by_path::{
    GetParametersByPathError, GetParametersByPathOutput,
};
use aws_sdk_ssm::Client;
use aws_smithy_async::future::pagination_stream::PaginationStream;
use types::{Parameter, StoreError};

const GET_PARAMETER: &str = "GetParameter";
const GET_PARAMETERS_BY_PATH: &str = "GetParametersByPath";

/// Parameter store backed by the AWS SDK
#[derive(Debug, Clone)]
pub struct AwsParameterStore {
    client: Client,
}

impl AwsParameterStore {
    /// Wrap an existing SSM client
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Build a client from a loaded SDK configuration
    pub fn from_sdk_config(sdk_config: &SdkConfig) -> Self {
        Self::new(Client::new(sdk_config))
    }
}

#[async_trait]
impl ParameterStore for AwsParameterStore {
    async fn get_parameter(&self, name: &str) -> StoreResult<Parameter> {
        tracing::debug!(name = %name, "Fetching parameter");

        let output = self
            .client
            .get_parameter()
            .name(name)
            .with_decryption(true)
            .send()
            .await
            .map_err(|err| {
                let not_found = err
                    .as_service_error()
                    .is_some_and(|e| e.is_parameter_not_found());

                if not_found {
                    StoreError::NotFound {
                        name: name.to_string(),
                    }
                } else {
                    StoreError::Request {
                        operation: GET_PARAMETER.to_string(),
                        target: name.to_string(),
                        message: DisplayErrorContext(&err).to_string(),
                    }
                }
            })?;

        let parameter = output.parameter().ok_or_else(|| StoreError::InvalidResponse {
            operation: GET_PARAMETER.to_string(),
            message: format!("no parameter in response for {}", name),
        })?;

        convert_parameter(parameter, GET_PARAMETER)
    }

    fn parameters_by_path<'a>(&'a self, path: &str) -> Box<dyn ParameterPages + 'a> {
        let stream = self
            .client
            .get_parameters_by_path()
            .path(path)
            .recursive(true)
            .with_decryption(true)
            .into_paginator()
            .send();

        Box::new(AwsParameterPages {
            path: path.to_string(),
            stream,
            finished: false,
        })
    }

    fn name(&self) -> &str {
        "aws-ssm"
    }
}

type PageStream = PaginationStream<
    Result<GetParametersByPathOutput, SdkError<GetParametersByPathError, HttpResponse>>,
>;

/// Pages through `GetParametersByPath` using the SDK paginator.
///
/// The paginator ends the sequence on a missing, empty or repeated
/// `NextToken`, and after an error.
struct AwsParameterPages {
    path: String,
    stream: PageStream,
    finished: bool,
}

#[async_trait]
impl ParameterPages for AwsParameterPages {
    async fn next_page(&mut self) -> Option<StoreResult<Vec<Parameter>>> {
        if self.finished {
            return None;
        }

        let output = match self.stream.next().await? {
            Ok(output) => output,
            Err(err) => {
                self.finished = true;
                return Some(Err(StoreError::Request {
                    operation: GET_PARAMETERS_BY_PATH.to_string(),
                    target: self.path.clone(),
                    message: DisplayErrorContext(&err).to_string(),
                }));
            }
        };

        let page = output
            .parameters()
            .iter()
            .map(|p| convert_parameter(p, GET_PARAMETERS_BY_PATH))
            .collect::<StoreResult<Vec<_>>>();

        if page.is_err() {
            self.finished = true;
        }

        tracing::debug!(path = %self.path, "Fetched parameter page");
        Some(page)
    }
}

fn convert_parameter(
    parameter: &aws_sdk_ssm::types::Parameter,
    operation: &str,
) -> StoreResult<Parameter> {
    let name = parameter.name().ok_or_else(|| StoreError::InvalidResponse {
        operation: operation.to_string(),
        message: "parameter without a name".to_string(),
    })?;

    let value = parameter.value().ok_or_else(|| StoreError::InvalidResponse {
        operation: operation.to_string(),
        message: format!("parameter {} without a value", name),
    })?;

    Ok(Parameter::new(name, value))
}
