// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Incremental export of opted-in CloudWatch log groups to S3.
//!
//! A run lists every log group, keeps those tagged `ExportToS3=true`, and for
//! each one exports the range between its stored watermark and now. The
//! watermark is only advanced once the backend accepted the export task, so an
//! interrupted run is simply resumed by the next scheduled invocation.

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

pub mod aws;
pub mod backend;
pub mod clock;
pub mod config;
pub mod eligibility;
pub mod error;
pub mod logger;
pub mod orchestrator;
pub mod pacer;
pub mod resource;
pub mod scheduler;
mod test_support;
pub mod watermark;

pub use backend::{
    ExportTaskRequest, LogGroupDescriptor, LogGroupPage, LogsBackend, ParameterStore,
};
pub use clock::{Clock, SystemClock};
pub use config::ExportConfig;
pub use error::{BackendError, CreateExportTaskError, ExportError};
pub use orchestrator::{Orchestrator, RunStatus, RunSummary};
pub use resource::{AccountContext, Resource};
pub use scheduler::{ExportScheduler, ExportWindow, Outcome};
pub use watermark::WatermarkStore;
