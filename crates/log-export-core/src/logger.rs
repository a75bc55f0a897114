// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Log line formatting for the export job.
//!
//! Every line is prefixed with `LOG_EXPORT` so the job's own output can be
//! filtered in CloudWatch next to the SDK's:
//!
//! ```text
//! LOG_EXPORT | INFO | Task created log_group="/aws/lambda/scan" task_id="0b5b..."
//! LOG_EXPORT | WARN | Export task limit reached, stopping this run: ... log_group="app/service-c"
//! ```

use std::fmt;
use tracing_core::{Event, Subscriber};
use tracing_subscriber::fmt::{
    format::{self, FormatEvent, FormatFields},
    FmtContext, FormattedFields,
};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::EnvFilter;

use crate::error::ExportError;

const NOISY_TARGETS: &str = "aws_config=off,aws_smithy_runtime=off,aws_smithy_runtime_api=off,hyper=off,h2=off,rustls=off";

#[derive(Debug, Clone, Copy)]
pub struct Formatter;

impl<S, N> FormatEvent<S, N> for Formatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: format::Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        write!(&mut writer, "LOG_EXPORT | {} | ", event.metadata().level())?;

        if let Some(scope) = ctx.event_scope() {
            for span in scope.from_root() {
                write!(writer, "{}", span.name())?;
                let ext = span.extensions();
                if let Some(fields) = ext.get::<FormattedFields<N>>() {
                    if !fields.is_empty() {
                        write!(writer, "{{{fields}}}")?;
                    }
                }
                write!(writer, ": ")?;
            }
        }

        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

/// Filter directives for `log_level`, with the AWS SDK's own logging silenced.
pub fn env_filter(log_level: &str) -> Result<EnvFilter, ExportError> {
    EnvFilter::try_new(format!("{NOISY_TARGETS},{log_level}"))
        .map_err(|e| ExportError::InvalidConfig(format!("could not parse log level: {e}")))
}

/// Installs the global subscriber. Lambda adds its own timestamps, so none are
/// written, and CloudWatch shows escape codes verbatim, so no colors either.
pub fn init(log_level: &str) -> Result<(), ExportError> {
    let subscriber = tracing_subscriber::fmt::Subscriber::builder()
        .with_env_filter(env_filter(log_level)?)
        .with_ansi(false)
        .event_format(Formatter)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| ExportError::Runtime(format!("setting default subscriber failed: {e}")))
}
