// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

/// Errors that abort an export run or describe why configuration is unusable.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("Missing required configuration: {0}")]
    MissingConfig(&'static str),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Logging backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("Runtime error: {0}")]
    Runtime(String),
}

/// Errors returned by the backend seams for lookups and parameter writes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BackendError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Service error: {0}")]
    Service(String),
}

/// Export task creation failures. `LimitExceeded` is the account-wide
/// backpressure signal, everything else only concerns the current log group.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CreateExportTaskError {
    #[error("Too many concurrent export tasks: {0}")]
    LimitExceeded(String),

    #[error("Export task creation failed: {0}")]
    Other(String),
}

impl From<BackendError> for ExportError {
    fn from(err: BackendError) -> Self {
        ExportError::BackendUnavailable(err.to_string())
    }
}
