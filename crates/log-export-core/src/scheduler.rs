// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

use crate::backend::{ExportTaskRequest, LogsBackend};
use crate::config::MIN_REEXPORT_INTERVAL_MS;
use crate::error::CreateExportTaskError;
use crate::resource::Resource;

/// Half-open export range `[from, to)` in epoch milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportWindow {
    pub from: i64,
    pub to: i64,
}

impl ExportWindow {
    /// Returns `None` unless `to > from`.
    pub fn new(from: i64, to: i64) -> Option<Self> {
        (to > from).then_some(Self { from, to })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Created(String),
    SkippedTooSoon,
    FailedRetryable,
    /// The account-wide export task limit is exhausted. Stop the run.
    FailedFatal,
}

/// Submits export tasks one at a time.
pub struct ExportScheduler {
    backend: Arc<dyn LogsBackend + Send + Sync>,
    destination: String,
    settle_delay: Duration,
}

impl ExportScheduler {
    pub fn new(
        backend: Arc<dyn LogsBackend + Send + Sync>,
        destination: String,
        settle_delay: Duration,
    ) -> Self {
        Self {
            backend,
            destination,
            settle_delay,
        }
    }

    pub async fn schedule_export(&self, resource: &Resource, watermark: i64, now: i64) -> Outcome {
        if now.saturating_sub(watermark) < MIN_REEXPORT_INTERVAL_MS {
            info!(
                log_group = %resource.name,
                watermark,
                "Skipped: log group was already exported in the last 24 hours"
            );
            return Outcome::SkippedTooSoon;
        }
        let Some(window) = ExportWindow::new(watermark, now) else {
            warn!(log_group = %resource.name, watermark, now, "Skipped: empty export window");
            return Outcome::SkippedTooSoon;
        };

        let request = ExportTaskRequest {
            log_group_name: resource.name.clone(),
            from: window.from,
            to: window.to,
            destination: self.destination.clone(),
            destination_prefix: destination_prefix(&resource.name).to_string(),
        };
        info!(
            log_group = %resource.name,
            from = window.from,
            to = window.to,
            "Exporting to {}/{}",
            request.destination,
            request.destination_prefix
        );

        match self.backend.create_export_task(&request).await {
            Ok(task_id) => {
                info!(log_group = %resource.name, task_id = %task_id, "Task created");
                // one export task at a time per account, give it a head start
                tokio::time::sleep(self.settle_delay).await;
                Outcome::Created(task_id)
            }
            Err(CreateExportTaskError::LimitExceeded(e)) => {
                warn!(
                    log_group = %resource.name,
                    "Export task limit reached, stopping this run: {e}"
                );
                Outcome::FailedFatal
            }
            Err(e) => {
                error!(log_group = %resource.name, "Error exporting: {e}");
                Outcome::FailedRetryable
            }
        }
    }
}

/// Object key prefix for a log group: its name without one leading and one trailing `/`.
pub fn destination_prefix(log_group_name: &str) -> &str {
    let name = log_group_name.strip_prefix('/').unwrap_or(log_group_name);
    name.strip_suffix('/').unwrap_or(name)
}
