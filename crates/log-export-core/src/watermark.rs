// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::sync::Arc;
use tracing::{debug, error};

use crate::backend::ParameterStore;
use crate::error::BackendError;
use crate::resource::Resource;

const PARAMETER_NAMESPACE: &str = "last-export-to-s3";

/// Per log group "exported up to, exclusive" timestamps in epoch milliseconds.
///
/// Writes are unconditional overwrites. Only one orchestrator may run at a
/// time: two overlapping runs would race on the same parameter.
pub struct WatermarkStore {
    store: Arc<dyn ParameterStore + Send + Sync>,
    prefix: String,
}

impl WatermarkStore {
    pub fn new(store: Arc<dyn ParameterStore + Send + Sync>, stage: Option<&str>) -> Self {
        let prefix = match stage {
            Some(stage) => format!("/logs/{stage}/{PARAMETER_NAMESPACE}"),
            None => format!("/logs/{PARAMETER_NAMESPACE}"),
        };
        Self {
            store,
            prefix: collapse_separators(&prefix),
        }
    }

    /// Parameter name holding the watermark of `resource`.
    pub fn key(&self, resource: &Resource) -> String {
        collapse_separators(&format!("{}/{}", self.prefix, resource.name))
    }

    /// Returns 0 when the log group was never exported or the lookup failed.
    pub async fn get_watermark(&self, resource: &Resource) -> i64 {
        let key = self.key(resource);
        match self.store.get_parameter(&key).await {
            Ok(Some(value)) => match value.trim().parse::<i64>() {
                Ok(watermark) if watermark >= 0 => watermark,
                Ok(_) => {
                    error!(log_group = %resource.name, "Invalid watermark {value:?} in {key}: negative timestamp");
                    0
                }
                Err(e) => {
                    error!(log_group = %resource.name, "Invalid watermark {value:?} in {key}: {e}");
                    0
                }
            },
            Ok(None) | Err(BackendError::NotFound(_)) => {
                debug!(log_group = %resource.name, "No watermark at {key}, never exported");
                0
            }
            Err(e) => {
                error!(log_group = %resource.name, "Error fetching watermark {key}: {e}");
                0
            }
        }
    }

    pub async fn set_watermark(&self, resource: &Resource, value: i64) -> Result<(), BackendError> {
        let key = self.key(resource);
        self.store.put_parameter(&key, &value.to_string()).await?;
        debug!(log_group = %resource.name, watermark = value, "Watermark updated: {key}");
        Ok(())
    }
}

fn collapse_separators(path: &str) -> String {
    let mut collapsed = String::with_capacity(path.len());
    for c in path.chars() {
        if c == '/' && collapsed.ends_with('/') {
            continue;
        }
        collapsed.push(c);
    }
    collapsed
}
