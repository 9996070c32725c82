// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scriptable in-memory backend for tests.

use super::{RemoteClient, RemoteError};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tb_core::{EntityId, IdGen, JobId, JobKind, JobStatusReport, SequentialIdGen};
use tokio::sync::Notify;

/// Recorded backend call
#[derive(Debug, Clone, PartialEq)]
pub enum RemoteCall {
    StartJob { entity: EntityId, kind: JobKind, params: serde_json::Value },
    JobStatus { job: JobId },
    LoadDraft { entity: EntityId },
    SaveDraft { entity: EntityId, content: String },
}

/// Remaining scripted replies for one job. Once drained, the last `Ok`
/// report repeats (a job that never finishes keeps reporting `running`).
struct JobScript {
    steps: VecDeque<Result<JobStatusReport, RemoteError>>,
    last: JobStatusReport,
}

#[derive(Default)]
struct FakeRemoteState {
    drafts: HashMap<EntityId, String>,
    load_gates: HashMap<EntityId, Arc<Notify>>,
    load_errors: HashMap<EntityId, RemoteError>,
    save_error: Option<RemoteError>,
    start_error: Option<RemoteError>,
    /// Scripts handed to the next started jobs, in order
    pending_scripts: VecDeque<Vec<Result<JobStatusReport, RemoteError>>>,
    jobs: HashMap<JobId, JobScript>,
    calls: Vec<RemoteCall>,
}

/// Fake backend with scripted job status sequences and gated draft loads
#[derive(Clone)]
pub struct FakeRemoteClient {
    inner: Arc<Mutex<FakeRemoteState>>,
    job_ids: SequentialIdGen,
}

impl Default for FakeRemoteClient {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(FakeRemoteState::default())),
            job_ids: SequentialIdGen::new("job"),
        }
    }
}

impl FakeRemoteClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store saved content for an entity
    pub fn set_draft(&self, entity: &str, content: &str) {
        self.inner.lock().drafts.insert(EntityId::new(entity), content.to_string());
    }

    /// Saved content as the backend currently has it
    pub fn saved_draft(&self, entity: &str) -> Option<String> {
        self.inner.lock().drafts.get(entity).cloned()
    }

    /// Hold loads for `entity` until the returned gate is notified.
    ///
    /// The gate stores one permit, so notifying before the load starts
    /// releases it immediately.
    pub fn gate_load(&self, entity: &str) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.inner.lock().load_gates.insert(EntityId::new(entity), Arc::clone(&gate));
        gate
    }

    pub fn fail_load(&self, entity: &str, error: RemoteError) {
        self.inner.lock().load_errors.insert(EntityId::new(entity), error);
    }

    pub fn fail_saves(&self, error: Option<RemoteError>) {
        self.inner.lock().save_error = error;
    }

    pub fn fail_starts(&self, error: Option<RemoteError>) {
        self.inner.lock().start_error = error;
    }

    /// Script the status replies of the next started job
    pub fn script_next_job(&self, steps: Vec<Result<JobStatusReport, RemoteError>>) {
        self.inner.lock().pending_scripts.push_back(steps);
    }

    /// Convenience for scripts made only of reports
    pub fn script_next_job_reports(&self, reports: Vec<JobStatusReport>) {
        self.script_next_job(reports.into_iter().map(Ok).collect());
    }

    /// Append replies to an already started job
    pub fn push_status(&self, job: &JobId, step: Result<JobStatusReport, RemoteError>) {
        let mut inner = self.inner.lock();
        let script = inner
            .jobs
            .entry(job.clone())
            .or_insert_with(|| JobScript { steps: VecDeque::new(), last: JobStatusReport::running() });
        script.steps.push_back(step);
    }

    pub fn calls(&self) -> Vec<RemoteCall> {
        self.inner.lock().calls.clone()
    }

    /// Number of status queries made for `job`
    pub fn status_polls(&self, job: &JobId) -> usize {
        self.inner
            .lock()
            .calls
            .iter()
            .filter(|call| matches!(call, RemoteCall::JobStatus { job: j } if j == job))
            .count()
    }

    /// Number of draft loads made for `entity`
    pub fn loads(&self, entity: &str) -> usize {
        self.inner
            .lock()
            .calls
            .iter()
            .filter(|call| matches!(call, RemoteCall::LoadDraft { entity: e } if e == entity))
            .count()
    }
}

#[async_trait]
impl RemoteClient for FakeRemoteClient {
    async fn start_job(
        &self,
        entity: &EntityId,
        kind: JobKind,
        params: &serde_json::Value,
    ) -> Result<JobId, RemoteError> {
        let mut inner = self.inner.lock();
        inner.calls.push(RemoteCall::StartJob {
            entity: entity.clone(),
            kind,
            params: params.clone(),
        });
        if let Some(err) = inner.start_error.clone() {
            return Err(err);
        }
        let job = JobId::new(self.job_ids.next());
        let steps = inner.pending_scripts.pop_front().unwrap_or_default();
        inner.jobs.insert(
            job.clone(),
            JobScript { steps: steps.into(), last: JobStatusReport::running() },
        );
        Ok(job)
    }

    async fn job_status(&self, job: &JobId) -> Result<JobStatusReport, RemoteError> {
        let mut inner = self.inner.lock();
        inner.calls.push(RemoteCall::JobStatus { job: job.clone() });
        let Some(script) = inner.jobs.get_mut(job) else {
            return Ok(JobStatusReport::not_found());
        };
        match script.steps.pop_front() {
            Some(Ok(report)) => {
                script.last = report.clone();
                Ok(report)
            }
            Some(Err(err)) => Err(err),
            None => Ok(script.last.clone()),
        }
    }

    async fn load_draft(&self, entity: &EntityId) -> Result<String, RemoteError> {
        let gate = {
            let mut inner = self.inner.lock();
            inner.calls.push(RemoteCall::LoadDraft { entity: entity.clone() });
            inner.load_gates.get(entity).cloned()
        };
        if let Some(gate) = gate {
            gate.notified().await;
        }
        let inner = self.inner.lock();
        if let Some(err) = inner.load_errors.get(entity) {
            return Err(err.clone());
        }
        inner.drafts.get(entity).cloned().ok_or_else(|| RemoteError::NotFound(entity.to_string()))
    }

    async fn save_draft(&self, entity: &EntityId, content: &str) -> Result<(), RemoteError> {
        let mut inner = self.inner.lock();
        inner
            .calls
            .push(RemoteCall::SaveDraft { entity: entity.clone(), content: content.to_string() });
        if let Some(err) = inner.save_error.clone() {
            return Err(err);
        }
        inner.drafts.insert(entity.clone(), content.to_string());
        Ok(())
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
