// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Draft session facade.
//!
//! A [`Session`] owns the draft store, the active selection and the job
//! registry behind one mutex. Remote calls happen on spawned tasks or
//! between lock scopes; the lock is never held across an `.await`.
//!
//! Background tasks (hydration, polling) hold a `Weak` reference to the
//! session state, so dropping the last `Session` handle cancels them.

use crate::config::SessionConfig;
use crate::error::SessionError;
use crate::poller::{spawn_poll_task, PollMachine, PollOutcome, PollSink};
use crate::selection::{HydrationOutcome, HydrationTag, SelectOutcome, Selection};
use crate::store::DraftStore;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tb_adapters::{RemoteClient, RemoteError};
use tb_core::{
    Clock, EntityDraft, EntityId, JobHandle, JobId, JobKind, JobStatus, RemoteJobStatus,
    SessionEvent, SessionId, SystemClock,
};
use tokio::sync::{broadcast, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Log text written when a job is abandoned at the polling ceiling.
pub fn timeout_diagnostic(timeout: Duration) -> String {
    format!(
        "No final status after {timeout:?}. The job worker may not be running; check backend \
         connectivity. The outcome is unknown, not failed."
    )
}

struct ActiveJob {
    handle: JobHandle,
    cancel: CancellationToken,
    status: watch::Sender<JobStatus>,
}

impl ActiveJob {
    fn is_current(&self, job: &JobId) -> bool {
        self.handle.job_id == *job && self.handle.is_active()
    }

    fn settle(&mut self, status: JobStatus) {
        self.handle.status = status;
        self.status.send_replace(status);
    }
}

struct PendingHydration {
    ticket: u64,
    done: watch::Sender<bool>,
}

struct SessionState {
    store: DraftStore,
    selection: Selection,
    /// Latest job per entity, active or finished
    jobs: HashMap<EntityId, ActiveJob>,
    /// Bumped by every start or cancel; a start whose epoch moved while the
    /// backend call was in flight is superseded
    start_epochs: HashMap<EntityId, u64>,
    hydrations: HashMap<EntityId, PendingHydration>,
    closed: bool,
}

impl SessionState {
    /// Mutate a draft wherever it lives and stamp it.
    fn write<T>(
        &mut self,
        id: &EntityId,
        now_ms: u64,
        f: impl FnOnce(&mut EntityDraft) -> T,
    ) -> T {
        self.selection.with_draft(&mut self.store, id, |draft| {
            let out = f(draft);
            draft.updated_at_ms = now_ms;
            out
        })
    }

    fn bump_epoch(&mut self, id: &EntityId) -> u64 {
        let epoch = self.start_epochs.entry(id.clone()).or_default();
        *epoch += 1;
        *epoch
    }

    /// Cancel the entity's running job, if any. Returns the settled handle.
    fn cancel_active(&mut self, id: &EntityId) -> Option<JobHandle> {
        let job = self.jobs.get_mut(id).filter(|job| job.handle.is_active())?;
        job.cancel.cancel();
        job.settle(JobStatus::Cancelled);
        Some(job.handle.clone())
    }

    fn finish_hydration(&mut self, tag: &HydrationTag) {
        if self.hydrations.get(&tag.entity).is_some_and(|h| h.ticket == tag.ticket) {
            if let Some(pending) = self.hydrations.remove(&tag.entity) {
                pending.done.send_replace(true);
            }
        }
    }
}

struct Shared<R, C> {
    id: SessionId,
    remote: R,
    clock: C,
    config: SessionConfig,
    state: Mutex<SessionState>,
    events: broadcast::Sender<SessionEvent>,
    shutdown: CancellationToken,
}

impl<R, C> Shared<R, C> {
    fn emit(&self, event: SessionEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }

    fn notice(&self, entity: &EntityId, message: impl Into<String>) {
        self.emit(SessionEvent::Notice { entity: entity.clone(), message: message.into() });
    }
}

impl<R, C> Drop for Shared<R, C> {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

/// Editable session over a set of entity drafts.
///
/// Cheap to clone; clones share state. Operations that spawn work
/// (`select_entity`, `start_job`) must run inside a tokio runtime.
pub struct Session<R, C = SystemClock> {
    inner: Arc<Shared<R, C>>,
}

impl<R, C> Clone for Session<R, C> {
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}

impl<R: RemoteClient> Session<R, SystemClock> {
    pub fn new(remote: R, config: SessionConfig) -> Self {
        Self::with_clock(remote, SystemClock, config)
    }
}

impl<R: RemoteClient, C: Clock> Session<R, C> {
    pub fn with_clock(remote: R, clock: C, config: SessionConfig) -> Self {
        let (events, _) = broadcast::channel(config.event_capacity.max(1));
        let id = SessionId::generate();
        info!(session = %id, "session opened");
        let state = SessionState {
            store: DraftStore::new(events.clone()),
            selection: Selection::new(),
            jobs: HashMap::new(),
            start_epochs: HashMap::new(),
            hydrations: HashMap::new(),
            closed: false,
        };
        Self {
            inner: Arc::new(Shared {
                id,
                remote,
                clock,
                config,
                state: Mutex::new(state),
                events,
                shutdown: CancellationToken::new(),
            }),
        }
    }

    pub fn id(&self) -> &SessionId {
        &self.inner.id
    }

    pub fn config(&self) -> &SessionConfig {
        &self.inner.config
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.inner.events.subscribe()
    }

    pub fn selected(&self) -> Option<EntityId> {
        self.inner.state.lock().selection.current().cloned()
    }

    pub fn is_closed(&self) -> bool {
        self.inner.state.lock().closed
    }

    /// Focus `id`: commit the outgoing buffer, then load or hydrate the
    /// incoming entity.
    pub fn select_entity(&self, id: impl Into<EntityId>) -> Result<(), SessionError> {
        let id = id.into();
        let mut state = self.inner.state.lock();
        if state.closed {
            return Err(SessionError::Closed);
        }

        let outgoing = state.selection.current().cloned();
        let state = &mut *state;
        let outcome = state.selection.select(&mut state.store, id.clone(), &self.inner.shutdown);
        if matches!(outcome, SelectOutcome::Unchanged) {
            return Ok(());
        }

        info!(entity = %id, "entity selected");
        self.inner.emit(SessionEvent::Selected { entity: id.clone() });

        if self.inner.config.cancel_jobs_on_switch {
            if let Some(outgoing) = outgoing {
                state.bump_epoch(&outgoing);
                if let Some(handle) = state.cancel_active(&outgoing) {
                    info!(entity = %outgoing, job = %handle.job_id, "job cancelled on switch");
                    self.inner.emit(SessionEvent::JobFinished {
                        entity: outgoing,
                        job: handle.job_id,
                        status: JobStatus::Cancelled,
                    });
                }
            }
        }

        if let SelectOutcome::Hydrate(tag, cancel) = outcome {
            let (done, _) = watch::channel(false);
            if let Some(previous) = state
                .hydrations
                .insert(id, PendingHydration { ticket: tag.ticket, done })
            {
                previous.done.send_replace(true);
            }
            self.spawn_hydration(tag, cancel);
        }
        Ok(())
    }

    fn spawn_hydration(&self, tag: HydrationTag, cancel: CancellationToken) {
        let weak = Arc::downgrade(&self.inner);
        let remote = self.inner.remote.clone();
        debug!(entity = %tag.entity, ticket = tag.ticket, "hydrating draft");
        tokio::spawn(async move {
            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                result = remote.load_draft(&tag.entity) => Some(result),
            };
            let Some(shared) = weak.upgrade() else {
                return;
            };
            apply_hydration(&shared, &tag, result);
        });
    }

    /// Current draft: the live buffer if `id` is selected, else the store.
    pub fn get_draft(&self, id: &EntityId) -> Option<EntityDraft> {
        let state = self.inner.state.lock();
        state.selection.snapshot(&state.store, id)
    }

    /// Replace the draft's content. Returns whether anything changed.
    pub fn edit_content(
        &self,
        id: &EntityId,
        content: impl Into<String>,
    ) -> Result<bool, SessionError> {
        let now = self.inner.clock.epoch_ms();
        let mut state = self.inner.state.lock();
        if state.closed {
            return Err(SessionError::Closed);
        }
        if !state.selection.is_selected(id) && !state.store.contains(id) {
            return Err(SessionError::UnknownEntity(id.clone()));
        }
        let content = content.into();
        Ok(state.write(id, now, |draft| draft.edit(content)))
    }

    /// Start a backend job for `id` and poll it in the background.
    ///
    /// A running job for the same entity is cancelled first. If another
    /// start or a cancel for the entity happens while the backend call is
    /// in flight, the returned handle is `cancelled` and never polled.
    pub async fn start_job(
        &self,
        id: &EntityId,
        kind: JobKind,
        params: serde_json::Value,
    ) -> Result<JobHandle, SessionError> {
        let epoch = {
            let mut state = self.inner.state.lock();
            if state.closed {
                return Err(SessionError::Closed);
            }
            if let Some(prior) = state.cancel_active(id) {
                info!(entity = %id, job = %prior.job_id, "superseding running job");
                self.inner.emit(SessionEvent::JobFinished {
                    entity: id.clone(),
                    job: prior.job_id,
                    status: JobStatus::Cancelled,
                });
            }
            state.bump_epoch(id)
        };

        let started = self.inner.remote.start_job(id, kind, &params).await;

        let now = self.inner.clock.epoch_ms();
        let mut state = self.inner.state.lock();
        let job_id = match started {
            Ok(job_id) => job_id,
            Err(err) => {
                warn!(entity = %id, %kind, error = %err, "failed to start job");
                self.inner.notice(id, format!("Could not start {kind} job: {err}"));
                return Err(err.into());
            }
        };
        if state.closed {
            return Err(SessionError::Closed);
        }

        let mut handle = JobHandle::new(job_id.clone(), id.clone(), kind, now);
        if state.start_epochs.get(id) != Some(&epoch) {
            debug!(entity = %id, job = %job_id, "job start superseded before registration");
            handle.status = JobStatus::Cancelled;
            return Ok(handle);
        }

        let cancel = self.inner.shutdown.child_token();
        let (status, _) = watch::channel(JobStatus::Running);
        state.jobs.insert(
            id.clone(),
            ActiveJob { handle: handle.clone(), cancel: cancel.clone(), status },
        );
        state.write(id, now, |draft| draft.set_log(format!("{kind} job {job_id} running")));
        info!(entity = %id, job = %job_id, %kind, "job started");
        drop(state);

        let sink = SessionPollSink {
            shared: Arc::downgrade(&self.inner),
            entity: id.clone(),
            job: job_id.clone(),
        };
        let machine = PollMachine::new(self.inner.config.poll_interval, self.inner.config.job_timeout);
        spawn_poll_task(self.inner.remote.clone(), job_id, machine, cancel, sink);
        Ok(handle)
    }

    /// Cancel the entity's running job. Also supersedes a start that is
    /// still waiting on the backend.
    pub fn cancel_job(&self, id: &EntityId) -> Option<JobHandle> {
        let now = self.inner.clock.epoch_ms();
        let mut state = self.inner.state.lock();
        state.bump_epoch(id);
        let handle = state.cancel_active(id)?;
        state.write(id, now, |draft| draft.set_log("Job cancelled"));
        info!(entity = %id, job = %handle.job_id, "job cancelled");
        self.inner.emit(SessionEvent::JobFinished {
            entity: id.clone(),
            job: handle.job_id.clone(),
            status: JobStatus::Cancelled,
        });
        Some(handle)
    }

    /// Latest job for the entity, running or finished.
    pub fn job(&self, id: &EntityId) -> Option<JobHandle> {
        self.inner.state.lock().jobs.get(id).map(|job| job.handle.clone())
    }

    /// Wait until the entity's latest job reaches a terminal status.
    pub async fn wait_for_job(&self, id: &EntityId) -> Result<JobStatus, SessionError> {
        let mut rx = {
            let state = self.inner.state.lock();
            state
                .jobs
                .get(id)
                .map(|job| job.status.subscribe())
                .ok_or_else(|| SessionError::UnknownEntity(id.clone()))?
        };
        let status = *rx.wait_for(|status| status.is_terminal()).await.map_err(|_| SessionError::Closed)?;
        Ok(status)
    }

    /// Wait for the entity's in-flight hydration (if any) to settle, then
    /// return its draft.
    pub async fn wait_for_hydration(&self, id: &EntityId) -> Option<EntityDraft> {
        let rx = self.inner.state.lock().hydrations.get(id).map(|h| h.done.subscribe());
        if let Some(mut rx) = rx {
            // A dropped sender means the hydration was replaced or the session closed
            let _ = rx.wait_for(|done| *done).await;
        }
        self.get_draft(id)
    }

    /// Persist the draft's current content.
    ///
    /// On failure the draft is untouched (still dirty) and a notice is
    /// emitted. Edits made while the save is in flight stay dirty.
    pub async fn save_draft(&self, id: &EntityId) -> Result<(), SessionError> {
        let content = {
            let state = self.inner.state.lock();
            if state.closed {
                return Err(SessionError::Closed);
            }
            state
                .selection
                .snapshot(&state.store, id)
                .map(|draft| draft.content)
                .ok_or_else(|| SessionError::UnknownEntity(id.clone()))?
        };

        let saved = self.inner.remote.save_draft(id, &content).await;

        let now = self.inner.clock.epoch_ms();
        match saved {
            Ok(()) => {
                self.inner.state.lock().write(id, now, |draft| draft.mark_saved(content));
                info!(entity = %id, "draft saved");
                Ok(())
            }
            Err(err) => {
                warn!(entity = %id, error = %err, "failed to save draft");
                self.inner.notice(id, format!("Could not save draft: {err}"));
                Err(err.into())
            }
        }
    }

    /// Cancel every poller and hydration. Later operations fail with
    /// [`SessionError::Closed`]; reads keep working.
    pub fn close(&self) {
        let mut state = self.inner.state.lock();
        if state.closed {
            return;
        }
        state.closed = true;
        state.selection.cancel_hydrations();
        for (_, pending) in state.hydrations.drain() {
            pending.done.send_replace(true);
        }
        for job in state.jobs.values_mut().filter(|job| job.handle.is_active()) {
            job.cancel.cancel();
            job.settle(JobStatus::Cancelled);
        }
        self.inner.shutdown.cancel();
        info!(session = %self.inner.id, "session closed");
    }
}

fn apply_hydration<R, C>(
    shared: &Shared<R, C>,
    tag: &HydrationTag,
    result: Option<Result<String, RemoteError>>,
) {
    let mut state = shared.state.lock();
    state.finish_hydration(tag);
    let state = &mut *state;

    let Some(result) = result else {
        state.selection.abandon_hydration(tag);
        debug!(entity = %tag.entity, ticket = tag.ticket, "hydration cancelled");
        return;
    };

    match state.selection.apply_hydration(&mut state.store, tag, result) {
        HydrationOutcome::Applied => info!(entity = %tag.entity, "draft hydrated"),
        HydrationOutcome::Missing => debug!(entity = %tag.entity, "no saved draft"),
        HydrationOutcome::Failed(err) => {
            warn!(entity = %tag.entity, error = %err, "failed to load saved draft");
            shared.notice(&tag.entity, format!("Could not load saved draft: {err}"));
        }
        HydrationOutcome::Discarded(reason) => {
            debug!(entity = %tag.entity, ticket = tag.ticket, reason, "hydration discarded");
        }
    }
}

/// Routes poll results into the session, guarded by the job registry.
struct SessionPollSink<R, C> {
    shared: Weak<Shared<R, C>>,
    entity: EntityId,
    job: JobId,
}

impl<R, C> PollSink for SessionPollSink<R, C>
where
    R: RemoteClient,
    C: Clock,
{
    fn progress(&self, logs: &str) -> bool {
        let Some(shared) = self.shared.upgrade() else {
            return false;
        };
        let now = shared.clock.epoch_ms();
        let mut state = shared.state.lock();
        if !state.jobs.get(&self.entity).is_some_and(|job| job.is_current(&self.job)) {
            debug!(entity = %self.entity, job = %self.job, "dropping progress of stale job");
            return false;
        }
        state.write(&self.entity, now, |draft| draft.set_log(logs));
        true
    }

    fn finish(&self, outcome: PollOutcome) {
        let Some(shared) = self.shared.upgrade() else {
            return;
        };
        let now = shared.clock.epoch_ms();
        let mut state = shared.state.lock();
        if !state.jobs.get(&self.entity).is_some_and(|job| job.is_current(&self.job)) {
            debug!(entity = %self.entity, job = %self.job, "dropping result of stale job");
            return;
        }

        let status = match outcome {
            PollOutcome::Finished(report) => {
                let result = report.terminal_result();
                let completed = report.status == RemoteJobStatus::Completed;
                let log = match (&report.logs, completed) {
                    (Some(logs), _) => logs.clone(),
                    (None, true) => "Job completed".to_string(),
                    (None, false) => {
                        result.error.clone().unwrap_or_else(|| "Job failed".to_string())
                    }
                };
                state.write(&self.entity, now, |draft| {
                    if let (true, Some(content)) = (completed, report.content) {
                        draft.replace_persisted(content);
                    }
                    draft.last_result = Some(result);
                    draft.set_log(log);
                });
                if completed {
                    JobStatus::Completed
                } else {
                    JobStatus::Failed
                }
            }
            PollOutcome::TimedOut => {
                let log = timeout_diagnostic(shared.config.job_timeout);
                state.write(&self.entity, now, |draft| {
                    draft.last_result = None;
                    draft.set_log(log);
                });
                JobStatus::Timeout
            }
            PollOutcome::Cancelled => return,
        };

        if let Some(job) = state.jobs.get_mut(&self.entity) {
            job.settle(status);
        }
        drop(state);

        match status {
            JobStatus::Completed => info!(entity = %self.entity, job = %self.job, "job completed"),
            JobStatus::Timeout => {
                warn!(entity = %self.entity, job = %self.job, "job timed out without final status")
            }
            _ => info!(entity = %self.entity, job = %self.job, %status, "job finished"),
        }
        shared.emit(SessionEvent::JobFinished {
            entity: self.entity.clone(),
            job: self.job.clone(),
            status,
        });
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
