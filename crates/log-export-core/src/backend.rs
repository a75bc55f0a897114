// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use std::collections::HashMap;

use crate::error::{BackendError, CreateExportTaskError};

/// A log group as returned by one page of the enumeration API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogGroupDescriptor {
    pub name: String,
    pub arn: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogGroupPage {
    pub log_groups: Vec<LogGroupDescriptor>,
    pub next_token: Option<String>,
}

/// One export task covering `[from, to)` in epoch milliseconds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportTaskRequest {
    pub log_group_name: String,
    pub from: i64,
    pub to: i64,
    pub destination: String,
    pub destination_prefix: String,
}

#[async_trait]
pub trait LogsBackend {
    /// Returns one page of log groups. Pass the previous page's token to continue.
    async fn describe_log_groups(
        &self,
        next_token: Option<String>,
    ) -> Result<LogGroupPage, BackendError>;

    /// Returns the tags of the resource identified by `resource_arn`.
    async fn list_tags(&self, resource_arn: &str) -> Result<HashMap<String, String>, BackendError>;

    /// Submits an export task and returns the backend task id. The task is not
    /// tracked to completion.
    async fn create_export_task(
        &self,
        request: &ExportTaskRequest,
    ) -> Result<String, CreateExportTaskError>;
}

#[async_trait]
pub trait ParameterStore {
    /// Returns `Ok(None)` when the parameter does not exist.
    async fn get_parameter(&self, name: &str) -> Result<Option<String>, BackendError>;

    /// Creates or overwrites a string parameter.
    async fn put_parameter(&self, name: &str, value: &str) -> Result<(), BackendError>;
}
