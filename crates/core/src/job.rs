// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job identifiers, handles and status reports.

use crate::id::EntityId;
use serde::{Deserialize, Serialize};

crate::define_id! {
    /// Identifier of a backend job, as returned when the job was started.
    pub struct JobId;
}

/// What a job does with its entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    /// Generate test code or a robot script from the entity
    Generate,
    /// Run analyzers or tests against the entity
    Execute,
}

crate::simple_display! {
    JobKind {
        Generate => "generate",
        Execute => "execute",
    }
}

/// Client-side lifecycle of one polled job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Running,
    Completed,
    Failed,
    Timeout,
    Cancelled,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, JobStatus::Running)
    }
}

crate::simple_display! {
    JobStatus {
        Running => "running",
        Completed => "completed",
        Failed => "failed",
        Timeout => "timeout",
        Cancelled => "cancelled",
    }
}

/// One in-flight (or finished) job owned by an entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobHandle {
    pub job_id: JobId,
    pub owner: EntityId,
    pub kind: JobKind,
    pub started_at_ms: u64,
    pub status: JobStatus,
}

impl JobHandle {
    pub fn new(job_id: JobId, owner: EntityId, kind: JobKind, started_at_ms: u64) -> Self {
        Self { job_id, owner, kind, started_at_ms, status: JobStatus::Running }
    }

    pub fn is_active(&self) -> bool {
        self.status == JobStatus::Running
    }
}

/// Status as reported by the backend for a job id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemoteJobStatus {
    /// Queued or executing
    #[serde(alias = "pending", alias = "queued")]
    Running,
    Completed,
    Failed,
    /// The backend does not (yet) know the job
    NotFound,
}

impl RemoteJobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, RemoteJobStatus::Completed | RemoteJobStatus::Failed)
    }
}

crate::simple_display! {
    RemoteJobStatus {
        Running => "running",
        Completed => "completed",
        Failed => "failed",
        NotFound => "not_found",
    }
}

/// Test counts attached to execution results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultCounts {
    #[serde(default)]
    pub passed: u32,
    #[serde(default)]
    pub failed: u32,
    #[serde(default)]
    pub skipped: u32,
}

impl ResultCounts {
    pub fn total(&self) -> u32 {
        self.passed + self.failed + self.skipped
    }
}

/// Structured outcome of a generation or execution job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobResult {
    pub status: RemoteJobStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub counts: Option<ResultCounts>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    /// Failure detail for failed jobs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Tool-specific payload (coverage, memory issues, ...), kept opaque
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl JobResult {
    pub fn new(status: RemoteJobStatus) -> Self {
        Self { status, counts: None, duration_ms: None, error: None, details: None }
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }
}

/// Response body of a job status query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobStatusReport {
    pub status: RemoteJobStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<JobResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logs: Option<String>,
    /// Generated artifact, present on completed generation jobs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl JobStatusReport {
    pub fn running() -> Self {
        Self { status: RemoteJobStatus::Running, result: None, logs: None, content: None }
    }

    pub fn not_found() -> Self {
        Self { status: RemoteJobStatus::NotFound, ..Self::running() }
    }

    pub fn completed() -> Self {
        Self {
            status: RemoteJobStatus::Completed,
            result: Some(JobResult::new(RemoteJobStatus::Completed)),
            ..Self::running()
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        let error = error.into();
        Self {
            status: RemoteJobStatus::Failed,
            result: Some(JobResult::new(RemoteJobStatus::Failed).with_error(error.clone())),
            logs: Some(error),
            content: None,
        }
    }

    pub fn with_logs(mut self, logs: impl Into<String>) -> Self {
        self.logs = Some(logs.into());
        self
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn with_result(mut self, result: JobResult) -> Self {
        self.result = Some(result);
        self
    }

    /// The result to record for a terminal report, synthesizing one when the
    /// backend sent none.
    pub fn terminal_result(&self) -> JobResult {
        match &self.result {
            Some(result) => result.clone(),
            None => {
                let result = JobResult::new(self.status);
                match (&self.logs, self.status) {
                    (Some(logs), RemoteJobStatus::Failed) => result.with_error(logs.clone()),
                    _ => result,
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
