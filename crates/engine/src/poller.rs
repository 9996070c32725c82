// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bounded job polling.
//!
//! [`PollMachine`] is the state machine on its own: it is fed elapsed time
//! and poll results and answers with the next step, so it can be tested
//! without timers. [`run_poll_loop`] drives it against a [`RemoteClient`]
//! on tokio time, under a cancellation token.
//!
//! ```text
//! Idle ──start──▶ Running ──completed/failed──▶ Completed
//!                  │  ▲
//!                  │  └── running / not_found / request error
//!                  ├──elapsed ≥ timeout──▶ TimedOut
//!                  └──cancel──▶ Cancelled
//! ```

use std::time::Duration;
use tb_adapters::{RemoteClient, RemoteError};
use tb_core::{JobId, JobStatusReport, RemoteJobStatus};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    Idle,
    Running,
    /// Backend reported `completed` or `failed`
    Completed(RemoteJobStatus),
    TimedOut,
    Cancelled,
}

impl PollState {
    pub fn is_terminal(self) -> bool {
        !matches!(self, PollState::Idle | PollState::Running)
    }
}

/// How a poll loop ended
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    /// Terminal report from the backend (completed or failed)
    Finished(JobStatusReport),
    TimedOut,
    Cancelled,
}

/// Next thing the driver should do
#[derive(Debug, Clone, PartialEq)]
pub enum PollStep {
    /// Still running: record `logs` if any, then wait before polling again
    Continue { logs: Option<String>, wait: Duration },
    Done(PollOutcome),
    /// The machine already reached a terminal state; drop the input
    Ignored,
}

#[derive(Debug, Clone)]
pub struct PollMachine {
    state: PollState,
    interval: Duration,
    timeout: Duration,
}

impl PollMachine {
    pub fn new(interval: Duration, timeout: Duration) -> Self {
        Self { state: PollState::Idle, interval, timeout }
    }

    pub fn state(&self) -> PollState {
        self.state
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Idle → Running. Returns the wait before the first poll.
    pub fn start(&mut self) -> Option<Duration> {
        if self.state != PollState::Idle {
            return None;
        }
        self.state = PollState::Running;
        Some(self.next_wait(Duration::ZERO))
    }

    /// Checked before every poll: past the ceiling, time out instead.
    pub fn check_deadline(&mut self, elapsed: Duration) -> Option<PollOutcome> {
        if self.state == PollState::Running && elapsed >= self.timeout {
            self.state = PollState::TimedOut;
            return Some(PollOutcome::TimedOut);
        }
        None
    }

    pub fn on_report(&mut self, report: JobStatusReport, elapsed: Duration) -> PollStep {
        if self.state != PollState::Running {
            return PollStep::Ignored;
        }
        if report.status.is_terminal() {
            self.state = PollState::Completed(report.status);
            return PollStep::Done(PollOutcome::Finished(report));
        }
        self.continue_or_time_out(report.logs, elapsed)
    }

    /// Request errors are transient: keep polling until the ceiling.
    pub fn on_error(&mut self, error: &RemoteError, elapsed: Duration) -> PollStep {
        if self.state != PollState::Running {
            return PollStep::Ignored;
        }
        tracing::debug!(error = %error, "transient poll error");
        self.continue_or_time_out(None, elapsed)
    }

    /// Running → Cancelled. Returns false if already terminal.
    pub fn cancel(&mut self) -> bool {
        if self.state.is_terminal() {
            return false;
        }
        self.state = PollState::Cancelled;
        true
    }

    fn continue_or_time_out(&mut self, logs: Option<String>, elapsed: Duration) -> PollStep {
        if let Some(outcome) = self.check_deadline(elapsed) {
            return PollStep::Done(outcome);
        }
        PollStep::Continue { logs, wait: self.next_wait(elapsed) }
    }

    /// The interval, clamped so no poll lands past the ceiling.
    fn next_wait(&self, elapsed: Duration) -> Duration {
        self.interval.min(self.timeout.saturating_sub(elapsed))
    }
}

/// Receives the loop's writes. Each call returns whether the job is still
/// the entity's active job; `false` stops the loop without further writes.
pub trait PollSink: Send + 'static {
    fn progress(&self, logs: &str) -> bool;
    fn finish(&self, outcome: PollOutcome);
}

/// Poll `job` until it reaches a terminal state, times out, or `cancel`
/// fires.
pub async fn run_poll_loop<R, S>(
    remote: R,
    job: JobId,
    mut machine: PollMachine,
    cancel: CancellationToken,
    sink: S,
) -> PollState
where
    R: RemoteClient,
    S: PollSink,
{
    let started = Instant::now();
    let deadline = started + machine.timeout();
    let Some(mut wait) = machine.start() else {
        return machine.state();
    };

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                machine.cancel();
                return machine.state();
            }
            _ = tokio::time::sleep(wait) => {}
        }

        if let Some(outcome) = machine.check_deadline(started.elapsed()) {
            sink.finish(outcome);
            return machine.state();
        }

        tracing::debug!(job = %job, "polling job status");
        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                machine.cancel();
                return machine.state();
            }
            // A request still in flight at the ceiling does not extend it
            _ = tokio::time::sleep_until(deadline) => None,
            result = remote.job_status(&job) => Some(result),
        };

        // A response that raced with cancellation is dropped
        if cancel.is_cancelled() {
            machine.cancel();
            return machine.state();
        }

        let elapsed = started.elapsed();
        let step = match result {
            None => match machine.check_deadline(elapsed) {
                Some(outcome) => PollStep::Done(outcome),
                None => PollStep::Ignored,
            },
            Some(Ok(report)) => machine.on_report(report, elapsed),
            Some(Err(err)) => machine.on_error(&err, elapsed),
        };

        match step {
            PollStep::Continue { logs, wait: next } => {
                if let Some(logs) = logs {
                    if !sink.progress(&logs) {
                        machine.cancel();
                        return machine.state();
                    }
                }
                wait = next;
            }
            PollStep::Done(outcome) => {
                sink.finish(outcome);
                return machine.state();
            }
            PollStep::Ignored => return machine.state(),
        }
    }
}

/// Run [`run_poll_loop`] on its own task.
pub fn spawn_poll_task<R, S>(
    remote: R,
    job: JobId,
    machine: PollMachine,
    cancel: CancellationToken,
    sink: S,
) -> JoinHandle<PollState>
where
    R: RemoteClient,
    S: PollSink,
{
    tokio::spawn(run_poll_loop(remote, job, machine, cancel, sink))
}

#[cfg(test)]
#[path = "poller_tests.rs"]
mod tests;
