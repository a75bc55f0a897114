// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use crate::error::ExportError;
use std::env;
use std::time::Duration;
use tracing::warn;

const DEFAULT_TAG_LOOKUP_INTERVAL_SECS: u64 = 10;
const DEFAULT_SETTLE_DELAY_SECS: u64 = 5;
const DEFAULT_POST_RUN_COOLDOWN_SECS: u64 = 30;
const DEFAULT_PARTITION: &str = "aws";
const DEFAULT_LOG_LEVEL: &str = "info";
const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Log groups must never be exported more than once per rolling day.
pub const MIN_REEXPORT_INTERVAL_MS: i64 = 24 * 60 * 60 * 1000;

/// Tag a log group must carry, with exactly [`EXPORT_TAG_VALUE`], to be exported.
pub const EXPORT_TAG_KEY: &str = "ExportToS3";
pub const EXPORT_TAG_VALUE: &str = "true";

/// Configuration for one export run, read from the Lambda environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportConfig {
    /// Destination bucket for exported log data
    pub bucket_name: String,
    /// Deployment stage, namespaces the watermark parameters
    pub stage: Option<String>,
    /// Log level (e.g., trace, debug, info, warn, error)
    pub log_level: String,
    /// Used to build log group ARNs when the backend did not return one
    pub account_id: Option<String>,
    pub region: Option<String>,
    pub partition: String,
    /// Minimum spacing between successive tag lookups
    pub tag_lookup_interval: Duration,
    /// Pause after each successfully created export task
    pub settle_delay: Duration,
    /// Pause after a full pass over every log group
    pub post_run_cooldown: Duration,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            bucket_name: String::new(),
            stage: None,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            account_id: None,
            region: None,
            partition: DEFAULT_PARTITION.to_string(),
            tag_lookup_interval: Duration::from_secs(DEFAULT_TAG_LOOKUP_INTERVAL_SECS),
            settle_delay: Duration::from_secs(DEFAULT_SETTLE_DELAY_SECS),
            post_run_cooldown: Duration::from_secs(DEFAULT_POST_RUN_COOLDOWN_SECS),
        }
    }
}

impl ExportConfig {
    /// Create configuration from environment variables
    pub fn from_env() -> Result<Self, ExportError> {
        let bucket_name = env::var("CLOUDWATCH_BUCKET_NAME").unwrap_or_default();
        let stage = non_empty_var("STAGE");
        let log_level = Self::log_level_from_env();
        let account_id = non_empty_var("AWS_ACCOUNT_ID");
        let region = non_empty_var("AWS_REGION").or_else(|| non_empty_var("AWS_DEFAULT_REGION"));
        let partition =
            non_empty_var("AWS_PARTITION").unwrap_or_else(|| DEFAULT_PARTITION.to_string());

        let config = Self {
            bucket_name: bucket_name.trim().to_string(),
            stage,
            log_level,
            account_id,
            region,
            partition,
            tag_lookup_interval: secs_var(
                "EXPORT_TAG_LOOKUP_INTERVAL_SECS",
                DEFAULT_TAG_LOOKUP_INTERVAL_SECS,
            ),
            settle_delay: secs_var("EXPORT_SETTLE_DELAY_SECS", DEFAULT_SETTLE_DELAY_SECS),
            post_run_cooldown: secs_var(
                "EXPORT_POST_RUN_COOLDOWN_SECS",
                DEFAULT_POST_RUN_COOLDOWN_SECS,
            ),
        };

        config.validate()?;
        Ok(config)
    }

    /// Reads `LOG_LEVEL`. Unknown levels fall back to `info` instead of
    /// stopping the export.
    pub fn log_level_from_env() -> String {
        match env::var("LOG_LEVEL") {
            Ok(raw) => parse_log_level(&raw).unwrap_or_else(|| {
                warn!(
                    "Unknown LOG_LEVEL '{raw}', using {DEFAULT_LOG_LEVEL}. Must be one of: {}",
                    LOG_LEVELS.join(", ")
                );
                DEFAULT_LOG_LEVEL.to_string()
            }),
            Err(_) => DEFAULT_LOG_LEVEL.to_string(),
        }
    }

    /// Only a missing destination makes the configuration unusable.
    pub fn validate(&self) -> Result<(), ExportError> {
        if self.bucket_name.trim().is_empty() {
            return Err(ExportError::MissingConfig("CLOUDWATCH_BUCKET_NAME"));
        }
        Ok(())
    }
}

fn parse_log_level(raw: &str) -> Option<String> {
    let level = raw.trim().to_lowercase();
    LOG_LEVELS.contains(&level.as_str()).then_some(level)
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|val| val.trim().to_string())
        .filter(|val| !val.is_empty())
}

fn secs_var(key: &str, default: u64) -> Duration {
    let secs = env::var(key)
        .ok()
        .and_then(|val| val.trim().parse::<u64>().ok())
        .unwrap_or(default);
    Duration::from_secs(secs)
}
