// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

use lambda_runtime::{service_fn, LambdaEvent};
use serde_json::Value;
use std::{env, sync::Arc};
use tracing::{debug, error, info};

use log_export_core::{
    aws::{self, CloudWatchLogsBackend, SsmParameterStore},
    logger, ExportConfig, Orchestrator, RunSummary, SystemClock,
};

const LAMBDA_RUNTIME_API_ENV: &str = "AWS_LAMBDA_RUNTIME_API";

#[tokio::main]
pub async fn main() {
    let log_level = ExportConfig::log_level_from_env();

    if let Err(e) = logger::init(&log_level) {
        eprintln!("LOG_EXPORT | ERROR | Logging subsystem unavailable: {e}");
    }
    debug!("Logging subsystem enabled");

    if running_in_lambda() {
        info!("Starting log export Lambda handler");
        if let Err(e) = lambda_runtime::run(service_fn(handler)).await {
            error!("Lambda runtime stopped: {e}");
        }
    } else {
        info!("Running a single log export pass");
        run_once().await;
    }
}

fn running_in_lambda() -> bool {
    env::var(LAMBDA_RUNTIME_API_ENV).is_ok_and(|val| !val.is_empty())
}

/// Scheduled events carry nothing the export needs, the payload is only logged.
async fn handler(event: LambdaEvent<Value>) -> Result<(), lambda_runtime::Error> {
    debug!(
        request_id = %event.context.request_id,
        "Scheduled invocation: {}",
        event.payload
    );
    run_once().await;
    Ok(())
}

async fn run_once() -> Option<RunSummary> {
    let mut config = match ExportConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Error creating export config, not exporting logs: {e}");
            return None;
        }
    };

    let sdk_config = aws::load_sdk_config().await;
    if config.region.is_none() {
        config.region = sdk_config.region().map(|region| region.as_ref().to_string());
    }

    let orchestrator = Orchestrator {
        config: Arc::new(config),
        logs: Arc::new(CloudWatchLogsBackend::new(&sdk_config)),
        parameters: Arc::new(SsmParameterStore::new(&sdk_config)),
        clock: Arc::new(SystemClock),
    };
    Some(orchestrator.run().await)
}
