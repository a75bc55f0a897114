// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, warn};

use crate::backend::LogsBackend;
use crate::config::{EXPORT_TAG_KEY, EXPORT_TAG_VALUE};
use crate::pacer::Pacer;
use crate::resource::{AccountContext, Resource};

/// Decides whether a log group opted in to export through its tags.
///
/// Tag lookups are paced: the tagging API enforces an undocumented per-account
/// rate, so lookups are kept at least `lookup_interval` apart.
pub struct EligibilityFilter {
    backend: Arc<dyn LogsBackend + Send + Sync>,
    account: AccountContext,
    pacer: Pacer,
}

impl EligibilityFilter {
    pub fn new(
        backend: Arc<dyn LogsBackend + Send + Sync>,
        account: AccountContext,
        lookup_interval: Duration,
    ) -> Self {
        Self {
            backend,
            account,
            pacer: Pacer::new(lookup_interval),
        }
    }

    /// Returns true iff the log group carries `ExportToS3=true`. Lookup
    /// failures make the log group ineligible for this run only.
    pub async fn is_eligible(&mut self, resource: &Resource) -> bool {
        let Some(arn) = self.account.resource_arn(resource) else {
            warn!(
                log_group = %resource.name,
                "Skipping log group: no ARN reported and region or account id unknown"
            );
            return false;
        };

        self.pacer.wait().await;
        let tags = match self.backend.list_tags(&arn).await {
            Ok(tags) => tags,
            Err(e) => {
                error!(log_group = %resource.name, "Failed to list tags, skipping for this run: {e}");
                return false;
            }
        };
        debug!(log_group = %resource.name, "Tags: {tags:?}");

        let eligible = tags.get(EXPORT_TAG_KEY).map(String::as_str) == Some(EXPORT_TAG_VALUE);
        if !eligible {
            debug!(
                log_group = %resource.name,
                "Skipping log group: no {EXPORT_TAG_KEY}={EXPORT_TAG_VALUE} tag"
            );
        }
        eligible
    }
}
