// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Recording in-memory backends for the integration scenarios.

#![allow(dead_code)]

use async_trait::async_trait;
use log_export_core::{
    BackendError, Clock, CreateExportTaskError, ExportTaskRequest, LogGroupDescriptor,
    LogGroupPage, LogsBackend, ParameterStore,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Mutex;

/// Every backend call, in order, tagged with the log group or parameter it concerned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Describe(Option<String>),
    ListTags(String),
    CreateExportTask(String),
    GetParameter(String),
    PutParameter(String, String),
}

#[derive(Default)]
pub struct RecordingBackend {
    pub pages: Vec<Vec<String>>,
    pub tags: Mutex<HashMap<String, HashMap<String, String>>>,
    pub limit_exceeded_for: Mutex<Option<String>>,
    pub parameters: Mutex<HashMap<String, String>>,
    pub calls: Mutex<Vec<Call>>,
}

impl RecordingBackend {
    pub fn new(pages: &[&[&str]]) -> Self {
        Self {
            pages: pages
                .iter()
                .map(|page| page.iter().map(|name| name.to_string()).collect())
                .collect(),
            ..Default::default()
        }
    }

    pub fn opt_in(&self, log_group: &str) {
        self.tags.lock().unwrap().insert(
            log_group.to_string(),
            HashMap::from([("ExportToS3".to_string(), "true".to_string())]),
        );
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn export_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, Call::CreateExportTask(_)))
            .count()
    }

    pub fn parameter(&self, name: &str) -> Option<String> {
        self.parameters.lock().unwrap().get(name).cloned()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl LogsBackend for RecordingBackend {
    async fn describe_log_groups(
        &self,
        next_token: Option<String>,
    ) -> Result<LogGroupPage, BackendError> {
        self.record(Call::Describe(next_token.clone()));
        let index: usize = next_token.and_then(|t| t.parse().ok()).unwrap_or(0);
        let log_groups = self
            .pages
            .get(index)
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .map(|name| LogGroupDescriptor {
                arn: Some(format!(
                    "arn:aws:logs:us-east-1:123456789012:log-group:{name}:*"
                )),
                name,
            })
            .collect();
        Ok(LogGroupPage {
            log_groups,
            next_token: (index + 1 < self.pages.len()).then(|| (index + 1).to_string()),
        })
    }

    async fn list_tags(&self, resource_arn: &str) -> Result<HashMap<String, String>, BackendError> {
        let name = resource_arn
            .split_once(":log-group:")
            .map(|(_, name)| name.to_string())
            .unwrap_or_default();
        self.record(Call::ListTags(name.clone()));
        Ok(self
            .tags
            .lock()
            .unwrap()
            .get(&name)
            .cloned()
            .unwrap_or_default())
    }

    async fn create_export_task(
        &self,
        request: &ExportTaskRequest,
    ) -> Result<String, CreateExportTaskError> {
        self.record(Call::CreateExportTask(request.log_group_name.clone()));
        if self.limit_exceeded_for.lock().unwrap().as_deref() == Some(&request.log_group_name) {
            return Err(CreateExportTaskError::LimitExceeded(
                "Resource limit exceeded.".to_string(),
            ));
        }
        Ok(format!("task-{}", request.log_group_name))
    }
}

#[async_trait]
impl ParameterStore for RecordingBackend {
    async fn get_parameter(&self, name: &str) -> Result<Option<String>, BackendError> {
        self.record(Call::GetParameter(name.to_string()));
        Ok(self.parameter(name))
    }

    async fn put_parameter(&self, name: &str, value: &str) -> Result<(), BackendError> {
        self.record(Call::PutParameter(name.to_string(), value.to_string()));
        self.parameters
            .lock()
            .unwrap()
            .insert(name.to_string(), value.to_string());
        Ok(())
    }
}

pub struct TestClock(pub AtomicI64);

impl TestClock {
    pub fn at(now: i64) -> Self {
        Self(AtomicI64::new(now))
    }

    pub fn advance(&self, millis: i64) {
        self.0.fetch_add(millis, Ordering::SeqCst);
    }
}

impl Clock for TestClock {
    fn now_millis(&self) -> i64 {
        self.0.load(Ordering::SeqCst)
    }
}
