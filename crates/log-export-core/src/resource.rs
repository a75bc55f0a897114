// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Log group discovery.
//!
//! Every run starts from a fresh listing of the account's log groups. The
//! listing is accumulated page by page into a `Vec` before any log group is
//! filtered, and a single failed page aborts the whole run: a partial list is
//! never acted upon.

use tracing::{debug, error};

use crate::backend::{LogGroupDescriptor, LogsBackend};
use crate::config::ExportConfig;
use crate::error::ExportError;

/// A log group discovered during the current run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    pub name: String,
    /// ARN reported by the backend, possibly with a trailing `:*`.
    pub arn: Option<String>,
}

impl Resource {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            arn: None,
        }
    }

    pub fn with_arn(mut self, arn: impl Into<String>) -> Self {
        self.arn = Some(arn.into());
        self
    }
}

impl From<LogGroupDescriptor> for Resource {
    fn from(descriptor: LogGroupDescriptor) -> Self {
        Self {
            name: descriptor.name,
            arn: descriptor.arn,
        }
    }
}

/// Partition, region and account the orchestrator runs in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccountContext {
    pub partition: String,
    pub region: Option<String>,
    pub account_id: Option<String>,
}

impl AccountContext {
    pub fn from_config(config: &ExportConfig) -> Self {
        Self {
            partition: config.partition.clone(),
            region: config.region.clone(),
            account_id: config.account_id.clone(),
        }
    }

    /// Fully-qualified identifier used for tag lookups.
    ///
    /// The enumeration API reports log group ARNs with a `:*` suffix that the
    /// tagging API rejects, so it is stripped. Without a reported ARN the
    /// identifier is assembled from the ambient account context, which fails
    /// when region or account id are unknown.
    pub fn resource_arn(&self, resource: &Resource) -> Option<String> {
        if let Some(arn) = resource.arn.as_deref() {
            return Some(arn.strip_suffix(":*").unwrap_or(arn).to_string());
        }
        let region = self.region.as_deref()?;
        let account_id = self.account_id.as_deref()?;
        Some(format!(
            "arn:{}:logs:{region}:{account_id}:log-group:{}",
            self.partition, resource.name
        ))
    }
}

/// Lists every log group, following continuation tokens until exhausted.
pub async fn enumerate_resources(
    backend: &(dyn LogsBackend + Send + Sync),
) -> Result<Vec<Resource>, ExportError> {
    let mut resources = Vec::new();
    let mut next_token: Option<String> = None;
    let mut pages = 0usize;

    loop {
        let page = backend
            .describe_log_groups(next_token.take())
            .await
            .inspect_err(|e| {
                error!("Failed to describe log groups after {pages} pages: {e}");
            })?;
        pages += 1;
        resources.extend(page.log_groups.into_iter().map(Resource::from));

        match page.next_token.filter(|token| !token.is_empty()) {
            Some(token) => next_token = Some(token),
            None => break,
        }
    }

    debug!(
        "Discovered {} log groups across {pages} pages",
        resources.len()
    );
    Ok(resources)
}
