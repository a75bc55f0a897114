// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! One export run: enumerate, filter, then export log groups one by one.
//!
//! A run never queues work past what the backend accepts. When the backend
//! reports that the account-wide export task limit is exhausted, the run stops
//! and the remaining log groups wait for the next scheduled invocation. Every
//! other failure only affects the log group being processed, and its
//! watermark stays untouched so the same window is attempted again next run.

use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::backend::{LogsBackend, ParameterStore};
use crate::clock::Clock;
use crate::config::ExportConfig;
use crate::eligibility::EligibilityFilter;
use crate::resource::{enumerate_resources, AccountContext};
use crate::scheduler::{ExportScheduler, Outcome};
use crate::watermark::WatermarkStore;

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunStatus {
    /// Every discovered log group was considered.
    #[default]
    Completed,
    /// Configuration was unusable, no backend call was made.
    InvalidConfig,
    /// Log groups could not be listed, nothing was processed.
    EnumerationFailed,
    /// The export task limit was hit while processing the log group at `index`.
    Backpressure { index: usize },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub status: RunStatus,
    pub discovered: usize,
    pub eligible: usize,
    pub ineligible: usize,
    pub created: usize,
    pub skipped_too_soon: usize,
    pub failed_retryable: usize,
    pub watermark_write_failures: usize,
}

pub struct Orchestrator {
    pub config: Arc<ExportConfig>,
    pub logs: Arc<dyn LogsBackend + Send + Sync>,
    pub parameters: Arc<dyn ParameterStore + Send + Sync>,
    pub clock: Arc<dyn Clock + Send + Sync>,
}

impl Orchestrator {
    pub async fn run(&self) -> RunSummary {
        let mut summary = RunSummary::default();

        if let Err(e) = self.config.validate() {
            error!("Not exporting logs: {e}");
            summary.status = RunStatus::InvalidConfig;
            return summary;
        }
        info!(
            bucket = %self.config.bucket_name,
            stage = self.config.stage.as_deref().unwrap_or_default(),
            "Starting log export run"
        );

        let resources = match enumerate_resources(self.logs.as_ref()).await {
            Ok(resources) => resources,
            Err(e) => {
                error!("Aborting log export run: {e}");
                summary.status = RunStatus::EnumerationFailed;
                return summary;
            }
        };
        summary.discovered = resources.len();

        let mut filter = EligibilityFilter::new(
            Arc::clone(&self.logs),
            AccountContext::from_config(&self.config),
            self.config.tag_lookup_interval,
        );
        let watermarks = WatermarkStore::new(
            Arc::clone(&self.parameters),
            self.config.stage.as_deref(),
        );
        let scheduler = ExportScheduler::new(
            Arc::clone(&self.logs),
            self.config.bucket_name.clone(),
            self.config.settle_delay,
        );

        for (index, resource) in resources.iter().enumerate() {
            debug!(log_group = %resource.name, index, "Considering log group");
            if !filter.is_eligible(resource).await {
                summary.ineligible += 1;
                continue;
            }
            summary.eligible += 1;
            info!(log_group = %resource.name, "Processing log group");

            let watermark = watermarks.get_watermark(resource).await;
            let now = self.clock.now_millis();

            match scheduler.schedule_export(resource, watermark, now).await {
                Outcome::Created(_) => {
                    summary.created += 1;
                    if let Err(e) = watermarks.set_watermark(resource, now).await {
                        // the window is exported again next run
                        error!(log_group = %resource.name, "Failed to update watermark: {e}");
                        summary.watermark_write_failures += 1;
                    }
                }
                Outcome::SkippedTooSoon => summary.skipped_too_soon += 1,
                Outcome::FailedRetryable => summary.failed_retryable += 1,
                Outcome::FailedFatal => {
                    summary.status = RunStatus::Backpressure { index };
                    warn!(
                        remaining = resources.len() - index - 1,
                        "Log export run stopped early, remaining log groups wait for the next run"
                    );
                    log_summary(&summary);
                    return summary;
                }
            }
        }

        if !self.config.post_run_cooldown.is_zero() {
            debug!(
                "Cooling down for {}s before finishing",
                self.config.post_run_cooldown.as_secs()
            );
            tokio::time::sleep(self.config.post_run_cooldown).await;
        }

        log_summary(&summary);
        summary
    }
}

fn log_summary(summary: &RunSummary) {
    info!(
        status = ?summary.status,
        discovered = summary.discovered,
        eligible = summary.eligible,
        created = summary.created,
        skipped_too_soon = summary.skipped_too_soon,
        failed_retryable = summary.failed_retryable,
        watermark_write_failures = summary.watermark_write_failures,
        "Log export run finished"
    );
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::{EXPORT_TAG_KEY, MIN_REEXPORT_INTERVAL_MS};
    use crate::error::CreateExportTaskError;
    use crate::test_support::{FakeLogsBackend, FakeParameterStore, ManualClock};
    use std::time::Duration;
    use tokio::time::Instant;
    use tracing_test::traced_test;

    const T0: i64 = 1_700_000_000_000;
    const DAY: i64 = MIN_REEXPORT_INTERVAL_MS;

    struct Harness {
        logs: Arc<FakeLogsBackend>,
        params: Arc<FakeParameterStore>,
        clock: Arc<ManualClock>,
        orchestrator: Orchestrator,
    }

    fn config() -> ExportConfig {
        ExportConfig {
            bucket_name: "cloudwatch-logs-bucket".to_string(),
            stage: Some("staging".to_string()),
            ..Default::default()
        }
    }

    fn harness(config: ExportConfig, pages: Vec<Vec<&str>>) -> Harness {
        let logs = Arc::new(FakeLogsBackend::with_pages(pages));
        let params = Arc::new(FakeParameterStore::default());
        let clock = Arc::new(ManualClock::new(T0));
        let orchestrator = Orchestrator {
            config: Arc::new(config),
            logs: logs.clone(),
            parameters: params.clone(),
            clock: clock.clone(),
        };
        Harness {
            logs,
            params,
            clock,
            orchestrator,
        }
    }

    fn opt_in(h: &Harness, names: &[&str]) {
        for name in names {
            h.logs.tag(name, EXPORT_TAG_KEY, "true");
        }
    }

    fn key(name: &str) -> String {
        format!(
            "/logs/staging/last-export-to-s3/{}",
            name.trim_start_matches('/')
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_run_exports_everything_and_sets_watermarks() {
        let h = harness(config(), vec![vec!["app/service-a", "app/service-b"]]);
        opt_in(&h, &["app/service-a", "app/service-b"]);

        let summary = h.orchestrator.run().await;

        assert_eq!(summary.status, RunStatus::Completed);
        assert_eq!(summary.created, 2);
        let requests = h.logs.export_requests();
        assert_eq!(requests.len(), 2);
        for request in &requests {
            assert_eq!((request.from, request.to), (0, T0));
        }
        assert_eq!(h.params.value(&key("app/service-a")), Some(T0.to_string()));
        assert_eq!(h.params.value(&key("app/service-b")), Some(T0.to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_unrecognized_log_level_still_exports() {
        let h = harness(
            ExportConfig {
                log_level: "warning".to_string(),
                ..config()
            },
            vec![vec!["app/service-a"]],
        );
        opt_in(&h, &["app/service-a"]);

        let summary = h.orchestrator.run().await;

        assert_eq!(summary.status, RunStatus::Completed);
        assert_eq!(summary.created, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_immediate_second_run_is_noop() {
        let h = harness(config(), vec![vec!["app/service-a", "app/service-b"]]);
        opt_in(&h, &["app/service-a", "app/service-b"]);

        h.orchestrator.run().await;
        assert_eq!(h.logs.export_requests().len(), 2);

        h.clock.advance(1_000);
        let summary = h.orchestrator.run().await;

        assert_eq!(summary.created, 0);
        assert_eq!(summary.skipped_too_soon, 2);
        assert_eq!(h.logs.export_requests().len(), 2);
        assert_eq!(h.params.value(&key("app/service-a")), Some(T0.to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_after_a_day_exports_the_gap() {
        let h = harness(config(), vec![vec!["app/service-a"]]);
        opt_in(&h, &["app/service-a"]);
        h.params.insert(&key("app/service-a"), &T0.to_string());

        h.clock.set(T0 + DAY - 1);
        h.orchestrator.run().await;
        assert!(h.logs.export_requests().is_empty());
        assert_eq!(h.params.value(&key("app/service-a")), Some(T0.to_string()));

        h.clock.set(T0 + DAY + 60_000);
        h.orchestrator.run().await;
        let requests = h.logs.export_requests();
        assert_eq!(requests.len(), 1);
        assert_eq!((requests[0].from, requests[0].to), (T0, T0 + DAY + 60_000));
        assert_eq!(
            h.params.value(&key("app/service-a")),
            Some((T0 + DAY + 60_000).to_string())
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_backpressure_stops_remaining_resources() {
        let names = ["g0", "g1", "g2", "g3", "g4"];
        let h = harness(config(), vec![names.to_vec()]);
        opt_in(&h, &names);
        h.logs.fail_export_for(
            "g2",
            CreateExportTaskError::LimitExceeded("Resource limit exceeded.".to_string()),
        );

        let summary = h.orchestrator.run().await;

        assert_eq!(summary.status, RunStatus::Backpressure { index: 2 });
        assert_eq!(summary.created, 2);
        for name in ["g3", "g4"] {
            assert!(!h.logs.touched(name), "{name} must receive no calls");
            assert!(!h.params.touched(&key(name)), "{name} must receive no calls");
        }
        assert_eq!(h.params.value(&key("g2")), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_backpressure_skips_cooldown() {
        let h = harness(config(), vec![vec!["g0"]]);
        opt_in(&h, &["g0"]);
        h.logs
            .fail_export_for("g0", CreateExportTaskError::LimitExceeded(String::new()));

        let start = Instant::now();
        h.orchestrator.run().await;
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_completed_run_cools_down() {
        let h = harness(config(), vec![vec!["g0"]]);

        let start = Instant::now();
        let summary = h.orchestrator.run().await;
        assert_eq!(summary.ineligible, 1);
        assert_eq!(start.elapsed(), Duration::from_secs(30));
    }

    #[tokio::test(start_paused = true)]
    async fn test_tag_failure_isolated_to_one_resource() {
        let names = ["g0", "g1", "g2"];
        let h = harness(config(), vec![names.to_vec()]);
        opt_in(&h, &names);
        h.logs.fail_tags_for("g1");

        let summary = h.orchestrator.run().await;

        assert_eq!(summary.status, RunStatus::Completed);
        assert_eq!(summary.ineligible, 1);
        let exported: Vec<String> = h
            .logs
            .export_requests()
            .into_iter()
            .map(|r| r.log_group_name)
            .collect();
        assert_eq!(exported, vec!["g0".to_string(), "g2".to_string()]);
        assert!(!h.params.touched(&key("g1")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retryable_failure_leaves_watermark() {
        let h = harness(config(), vec![vec!["g0", "g1"]]);
        opt_in(&h, &["g0", "g1"]);
        h.logs.fail_export_for(
            "g0",
            CreateExportTaskError::Other("InvalidParameterException".to_string()),
        );

        let summary = h.orchestrator.run().await;

        assert_eq!(summary.failed_retryable, 1);
        assert_eq!(summary.created, 1);
        assert_eq!(h.params.value(&key("g0")), None);
        assert_eq!(h.params.value(&key("g1")), Some(T0.to_string()));
    }

    #[tokio::test(start_paused = true)]
    #[traced_test]
    async fn test_enumeration_failure_aborts_run() {
        let h = harness(config(), vec![vec!["g0"], vec!["g1"]]);
        opt_in(&h, &["g0", "g1"]);
        h.logs.fail_describe_page(1);

        let summary = h.orchestrator.run().await;

        assert_eq!(summary.status, RunStatus::EnumerationFailed);
        assert!(h.logs.tag_lookups().is_empty());
        assert!(h.logs.export_requests().is_empty());
        assert!(logs_contain("Aborting log export run"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_bucket_makes_no_backend_calls() {
        let h = harness(
            ExportConfig {
                bucket_name: String::new(),
                ..config()
            },
            vec![vec!["g0"]],
        );
        opt_in(&h, &["g0"]);

        let summary = h.orchestrator.run().await;

        assert_eq!(summary.status, RunStatus::InvalidConfig);
        assert!(h.logs.describe_tokens().is_empty());
        assert!(h.params.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_watermark_read_failure_exports_from_zero() {
        let h = harness(config(), vec![vec!["g0"]]);
        opt_in(&h, &["g0"]);
        h.params.insert(&key("g0"), &(T0 - DAY / 2).to_string());
        h.params.fail_get(&key("g0"));

        h.orchestrator.run().await;

        let requests = h.logs.export_requests();
        assert_eq!((requests[0].from, requests[0].to), (0, T0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_watermark_write_failure_continues() {
        let h = harness(config(), vec![vec!["g0", "g1"]]);
        opt_in(&h, &["g0", "g1"]);
        h.params.fail_put(&key("g0"));

        let summary = h.orchestrator.run().await;

        assert_eq!(summary.status, RunStatus::Completed);
        assert_eq!(summary.created, 2);
        assert_eq!(summary.watermark_write_failures, 1);
        assert_eq!(h.params.value(&key("g1")), Some(T0.to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_leading_slash_shares_key_and_trims_prefix() {
        let h = harness(config(), vec![vec!["/app/service-a"]]);
        opt_in(&h, &["/app/service-a"]);

        h.orchestrator.run().await;

        assert_eq!(
            h.logs.export_requests()[0].destination_prefix,
            "app/service-a"
        );
        assert_eq!(
            h.params.value("/logs/staging/last-export-to-s3/app/service-a"),
            Some(T0.to_string())
        );
        assert!(h.params.calls().iter().all(|(_, name)| !name.contains("//")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_ineligible_resources_never_read_watermarks() {
        let h = harness(config(), vec![vec!["g0", "g1"]]);
        h.logs.tag("g1", EXPORT_TAG_KEY, "True");

        let summary = h.orchestrator.run().await;

        assert_eq!(summary.ineligible, 2);
        assert!(h.params.calls().is_empty());
        assert!(h.logs.export_requests().is_empty());
    }
}
