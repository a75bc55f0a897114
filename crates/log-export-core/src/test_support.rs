// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! In-memory backends shared by the unit tests. Every call is recorded so
//! tests can assert which log groups the orchestrator touched.

#![cfg(test)]
#![allow(clippy::unwrap_used)]

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Mutex;
use tokio::time::Instant;

use crate::backend::{
    ExportTaskRequest, LogGroupDescriptor, LogGroupPage, LogsBackend, ParameterStore,
};
use crate::clock::Clock;
use crate::error::{BackendError, CreateExportTaskError};

const SAMPLE_ARN_PREFIX: &str = "arn:aws:logs:us-east-1:123456789012:log-group:";

#[derive(Default)]
struct LogsState {
    failing_page: Option<usize>,
    describe_tokens: Vec<Option<String>>,
    tags: HashMap<String, HashMap<String, String>>,
    failing_tags: HashSet<String>,
    tag_lookups: Vec<(String, Instant)>,
    export_failures: HashMap<String, CreateExportTaskError>,
    export_requests: Vec<ExportTaskRequest>,
}

/// Log groups are served in pages, continuation tokens are `page-N`.
#[derive(Default)]
pub(crate) struct FakeLogsBackend {
    pages: Vec<Vec<String>>,
    state: Mutex<LogsState>,
}

impl FakeLogsBackend {
    pub(crate) fn with_pages(pages: Vec<Vec<&str>>) -> Self {
        Self {
            pages: pages
                .into_iter()
                .map(|page| page.into_iter().map(str::to_string).collect())
                .collect(),
            state: Mutex::new(LogsState::default()),
        }
    }

    pub(crate) fn fail_describe_page(&self, index: usize) {
        self.state.lock().unwrap().failing_page = Some(index);
    }

    pub(crate) fn tag(&self, log_group: &str, key: &str, value: &str) {
        self.state
            .lock()
            .unwrap()
            .tags
            .entry(log_group.to_string())
            .or_default()
            .insert(key.to_string(), value.to_string());
    }

    pub(crate) fn fail_tags_for(&self, log_group: &str) {
        self.state
            .lock()
            .unwrap()
            .failing_tags
            .insert(log_group.to_string());
    }

    pub(crate) fn fail_export_for(&self, log_group: &str, error: CreateExportTaskError) {
        self.state
            .lock()
            .unwrap()
            .export_failures
            .insert(log_group.to_string(), error);
    }

    pub(crate) fn describe_tokens(&self) -> Vec<Option<String>> {
        self.state.lock().unwrap().describe_tokens.clone()
    }

    pub(crate) fn tag_lookups(&self) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .tag_lookups
            .iter()
            .map(|(arn, _)| arn.clone())
            .collect()
    }

    pub(crate) fn tag_lookup_times(&self) -> Vec<Instant> {
        self.state
            .lock()
            .unwrap()
            .tag_lookups
            .iter()
            .map(|(_, at)| *at)
            .collect()
    }

    pub(crate) fn export_requests(&self) -> Vec<ExportTaskRequest> {
        self.state.lock().unwrap().export_requests.clone()
    }

    /// True when a tag lookup or export request concerned `log_group`.
    pub(crate) fn touched(&self, log_group: &str) -> bool {
        let state = self.state.lock().unwrap();
        state
            .tag_lookups
            .iter()
            .any(|(arn, _)| log_group_of(arn) == log_group)
            || state
                .export_requests
                .iter()
                .any(|request| request.log_group_name == log_group)
    }
}

fn log_group_of(arn: &str) -> &str {
    arn.split_once(":log-group:")
        .map(|(_, name)| name)
        .unwrap_or(arn)
}

#[async_trait]
impl LogsBackend for FakeLogsBackend {
    async fn describe_log_groups(
        &self,
        next_token: Option<String>,
    ) -> Result<LogGroupPage, BackendError> {
        let mut state = self.state.lock().unwrap();
        state.describe_tokens.push(next_token.clone());

        let index = next_token
            .as_deref()
            .and_then(|token| token.strip_prefix("page-"))
            .and_then(|index| index.parse::<usize>().ok())
            .unwrap_or(0);
        if state.failing_page == Some(index) {
            return Err(BackendError::Service("ServiceUnavailableException".to_string()));
        }

        let log_groups = self
            .pages
            .get(index)
            .map(|page| {
                page.iter()
                    .map(|name| LogGroupDescriptor {
                        name: name.clone(),
                        arn: Some(format!("{SAMPLE_ARN_PREFIX}{name}:*")),
                    })
                    .collect()
            })
            .unwrap_or_default();
        let next_token = (index + 1 < self.pages.len()).then(|| format!("page-{}", index + 1));
        Ok(LogGroupPage {
            log_groups,
            next_token,
        })
    }

    async fn list_tags(&self, resource_arn: &str) -> Result<HashMap<String, String>, BackendError> {
        let mut state = self.state.lock().unwrap();
        state
            .tag_lookups
            .push((resource_arn.to_string(), Instant::now()));

        let log_group = log_group_of(resource_arn);
        if state.failing_tags.contains(log_group) {
            return Err(BackendError::Service("ThrottlingException".to_string()));
        }
        Ok(state.tags.get(log_group).cloned().unwrap_or_default())
    }

    async fn create_export_task(
        &self,
        request: &ExportTaskRequest,
    ) -> Result<String, CreateExportTaskError> {
        let mut state = self.state.lock().unwrap();
        state.export_requests.push(request.clone());
        if let Some(error) = state.export_failures.get(&request.log_group_name) {
            return Err(error.clone());
        }
        Ok(format!("task-{}", state.export_requests.len()))
    }
}

#[derive(Default)]
struct ParameterState {
    values: HashMap<String, String>,
    failing_gets: HashSet<String>,
    failing_puts: HashSet<String>,
    calls: Vec<(&'static str, String)>,
}

#[derive(Default)]
pub(crate) struct FakeParameterStore {
    state: Mutex<ParameterState>,
}

impl FakeParameterStore {
    /// Seeds a value without recording a call.
    pub(crate) fn insert(&self, name: &str, value: &str) {
        self.state
            .lock()
            .unwrap()
            .values
            .insert(name.to_string(), value.to_string());
    }

    pub(crate) fn value(&self, name: &str) -> Option<String> {
        self.state.lock().unwrap().values.get(name).cloned()
    }

    pub(crate) fn fail_get(&self, name: &str) {
        self.state
            .lock()
            .unwrap()
            .failing_gets
            .insert(name.to_string());
    }

    pub(crate) fn fail_put(&self, name: &str) {
        self.state
            .lock()
            .unwrap()
            .failing_puts
            .insert(name.to_string());
    }

    pub(crate) fn calls(&self) -> Vec<(&'static str, String)> {
        self.state.lock().unwrap().calls.clone()
    }

    pub(crate) fn touched(&self, name: &str) -> bool {
        self.state
            .lock()
            .unwrap()
            .calls
            .iter()
            .any(|(_, called)| called == name)
    }
}

#[async_trait]
impl ParameterStore for FakeParameterStore {
    async fn get_parameter(&self, name: &str) -> Result<Option<String>, BackendError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(("get", name.to_string()));
        if state.failing_gets.contains(name) {
            return Err(BackendError::Service("ThrottlingException".to_string()));
        }
        Ok(state.values.get(name).cloned())
    }

    async fn put_parameter(&self, name: &str, value: &str) -> Result<(), BackendError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(("put", name.to_string()));
        if state.failing_puts.contains(name) {
            return Err(BackendError::Service("InternalServerError".to_string()));
        }
        state.values.insert(name.to_string(), value.to_string());
        Ok(())
    }
}

pub(crate) struct ManualClock {
    now: AtomicI64,
}

impl ManualClock {
    pub(crate) fn new(now: i64) -> Self {
        Self {
            now: AtomicI64::new(now),
        }
    }

    pub(crate) fn set(&self, now: i64) {
        self.now.store(now, Ordering::SeqCst);
    }

    pub(crate) fn advance(&self, millis: i64) {
        self.now.fetch_add(millis, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}
