// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! CloudWatch Logs and SSM Parameter Store implementations of the backend seams.

use async_trait::async_trait;
use aws_config::{BehaviorVersion, SdkConfig};
use aws_sdk_cloudwatchlogs::error::DisplayErrorContext;
use aws_sdk_ssm::types::ParameterType;
use std::collections::HashMap;
use tracing::{debug, warn};

use crate::backend::{
    ExportTaskRequest, LogGroupDescriptor, LogGroupPage, LogsBackend, ParameterStore,
};
use crate::error::{BackendError, CreateExportTaskError};

/// Loads credentials and region from the standard AWS provider chain.
pub async fn load_sdk_config() -> SdkConfig {
    aws_config::load_defaults(BehaviorVersion::latest()).await
}

#[derive(Debug, Clone)]
pub struct CloudWatchLogsBackend {
    client: aws_sdk_cloudwatchlogs::Client,
}

impl CloudWatchLogsBackend {
    pub fn new(sdk_config: &SdkConfig) -> Self {
        Self {
            client: aws_sdk_cloudwatchlogs::Client::new(sdk_config),
        }
    }
}

#[async_trait]
impl LogsBackend for CloudWatchLogsBackend {
    async fn describe_log_groups(
        &self,
        next_token: Option<String>,
    ) -> Result<LogGroupPage, BackendError> {
        let response = self
            .client
            .describe_log_groups()
            .set_next_token(next_token)
            .send()
            .await
            .map_err(|e| BackendError::Service(DisplayErrorContext(&e).to_string()))?;

        let log_groups = response
            .log_groups()
            .iter()
            .filter_map(|group| {
                Some(LogGroupDescriptor {
                    name: group.log_group_name()?.to_string(),
                    arn: group.arn().map(str::to_string),
                })
            })
            .collect();

        Ok(LogGroupPage {
            log_groups,
            next_token: response.next_token().map(str::to_string),
        })
    }

    async fn list_tags(&self, resource_arn: &str) -> Result<HashMap<String, String>, BackendError> {
        let response = self
            .client
            .list_tags_for_resource()
            .resource_arn(resource_arn)
            .send()
            .await
            .map_err(|e| {
                if e.as_service_error()
                    .is_some_and(|e| e.is_resource_not_found_exception())
                {
                    BackendError::NotFound(resource_arn.to_string())
                } else {
                    BackendError::Service(DisplayErrorContext(&e).to_string())
                }
            })?;
        Ok(response.tags().cloned().unwrap_or_default())
    }

    async fn create_export_task(
        &self,
        request: &ExportTaskRequest,
    ) -> Result<String, CreateExportTaskError> {
        let response = self
            .client
            .create_export_task()
            .log_group_name(&request.log_group_name)
            .from(request.from)
            .to(request.to)
            .destination(&request.destination)
            .destination_prefix(&request.destination_prefix)
            .send()
            .await
            .map_err(|e| {
                let message = DisplayErrorContext(&e).to_string();
                if e.as_service_error()
                    .is_some_and(|e| e.is_limit_exceeded_exception())
                {
                    CreateExportTaskError::LimitExceeded(message)
                } else {
                    CreateExportTaskError::Other(message)
                }
            })?;
        debug!("CreateExportTask response: {response:?}");
        Ok(task_id_or_empty(&request.log_group_name, response.task_id()))
    }
}

fn task_id_or_empty(log_group: &str, task_id: Option<&str>) -> String {
    match task_id {
        Some(task_id) => task_id.to_string(),
        None => {
            warn!(log_group, "CreateExportTask succeeded without returning a task id");
            String::new()
        }
    }
}

#[derive(Debug, Clone)]
pub struct SsmParameterStore {
    client: aws_sdk_ssm::Client,
}

impl SsmParameterStore {
    pub fn new(sdk_config: &SdkConfig) -> Self {
        Self {
            client: aws_sdk_ssm::Client::new(sdk_config),
        }
    }
}

#[async_trait]
impl ParameterStore for SsmParameterStore {
    async fn get_parameter(&self, name: &str) -> Result<Option<String>, BackendError> {
        match self.client.get_parameter().name(name).send().await {
            Ok(response) => Ok(response
                .parameter()
                .and_then(|parameter| parameter.value())
                .map(str::to_string)),
            Err(e)
                if e.as_service_error()
                    .is_some_and(|e| e.is_parameter_not_found()) =>
            {
                Ok(None)
            }
            Err(e) => Err(BackendError::Service(
                aws_sdk_ssm::error::DisplayErrorContext(&e).to_string(),
            )),
        }
    }

    async fn put_parameter(&self, name: &str, value: &str) -> Result<(), BackendError> {
        self.client
            .put_parameter()
            .name(name)
            .value(value)
            .r#type(ParameterType::String)
            .overwrite(true)
            .send()
            .await
            .map_err(|e| {
                BackendError::Service(aws_sdk_ssm::error::DisplayErrorContext(&e).to_string())
            })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test;

    #[test]
    #[traced_test]
    fn test_missing_task_id_is_logged() {
        assert_eq!(task_id_or_empty("app/service-a", None), "");
        assert!(logs_contain("without returning a task id"));
    }

    #[test]
    #[traced_test]
    fn test_task_id_is_passed_through() {
        assert_eq!(task_id_or_empty("app/service-a", Some("task-1")), "task-1");
        assert!(!logs_contain("without returning a task id"));
    }
}
