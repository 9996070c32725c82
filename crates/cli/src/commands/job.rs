// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `tb job` - Backend job commands

use std::time::Duration;

use anyhow::Result;
use clap::{Args, Subcommand, ValueEnum};
use tb_adapters::{HttpRemoteClient, RemoteClient};
use tb_core::{EntityId, JobId, JobKind, JobStatus, SessionEvent};
use tb_engine::Session;
use tokio::sync::broadcast::error::RecvError;

use crate::backend::Backend;
use crate::duration::parse_duration;
use crate::exit_error::{self, ExitError};
use crate::output::{print_job_report, print_job_run, JobRunSummary, OutputFormat};

#[derive(Args)]
pub struct JobArgs {
    #[command(subcommand)]
    pub command: JobCommand,
}

#[derive(Clone, Copy, Debug, PartialEq, ValueEnum)]
pub enum KindArg {
    Generate,
    Execute,
}

impl From<KindArg> for JobKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Generate => JobKind::Generate,
            KindArg::Execute => JobKind::Execute,
        }
    }
}

#[derive(Subcommand)]
pub enum JobCommand {
    /// Start a job for an entity and wait for it to finish
    Run {
        /// Entity id (source file path or test-case id)
        entity: String,

        /// What the job does
        #[arg(long, value_enum, default_value = "generate")]
        kind: KindArg,

        /// Job parameters as a JSON object
        #[arg(long, value_parser = parse_params, default_value = "{}")]
        params: serde_json::Value,

        /// Give up waiting after this long (e.g. "90s", "5m")
        #[arg(long, value_parser = parse_duration)]
        timeout: Option<Duration>,

        /// Print the job id and return without waiting
        #[arg(long)]
        no_wait: bool,
    },
    /// Query the status of a job once
    Status {
        /// Job id as printed by `tb job run`
        job_id: String,
    },
}

/// Job parameters must be a JSON object.
pub fn parse_params(s: &str) -> Result<serde_json::Value, String> {
    let value: serde_json::Value =
        serde_json::from_str(s).map_err(|e| format!("invalid JSON: {e}"))?;
    if !value.is_object() {
        return Err("parameters must be a JSON object".to_string());
    }
    Ok(value)
}

pub async fn handle(command: JobCommand, backend: &Backend, format: OutputFormat) -> Result<()> {
    match command {
        JobCommand::Run { entity, kind, params, timeout, no_wait } => {
            let session = backend.session(timeout)?;
            let entity = EntityId::new(entity);
            let result = run(&session, &entity, kind.into(), params, no_wait, format).await;
            session.close();
            result
        }
        JobCommand::Status { job_id } => {
            let job = JobId::new(job_id);
            let report = backend.client()?.job_status(&job).await?;
            print_job_report(&job, &report, format)
        }
    }
}

async fn run(
    session: &Session<HttpRemoteClient>,
    entity: &EntityId,
    kind: JobKind,
    params: serde_json::Value,
    no_wait: bool,
    format: OutputFormat,
) -> Result<()> {
    let mut events = session.subscribe();
    let handle = session.start_job(entity, kind, params).await?;
    if no_wait {
        match format {
            OutputFormat::Text => println!("{}", handle.job_id),
            OutputFormat::Json => {
                let summary =
                    JobRunSummary { handle, result: None, log: String::new(), content: None };
                print_job_run(&summary, format)?;
            }
        }
        return Ok(());
    }

    let status = wait(session, entity, &mut events, format).await?;
    let draft = session.get_draft(entity).unwrap_or_else(|| tb_core::EntityDraft::new(entity.clone()));
    let mut final_handle = session.job(entity).unwrap_or(handle);
    final_handle.status = status;
    let summary = JobRunSummary {
        content: (kind == JobKind::Generate && status == JobStatus::Completed)
            .then(|| draft.content.clone()),
        handle: final_handle,
        result: draft.last_result,
        log: draft.log_text,
    };
    print_job_run(&summary, format)?;

    match ExitError::for_job(status, "") {
        Some(err) => Err(err.into()),
        None => Ok(()),
    }
}

/// Wait for the entity's job, echoing log updates to stderr in text mode.
/// Ctrl-C cancels the job.
async fn wait(
    session: &Session<HttpRemoteClient>,
    entity: &EntityId,
    events: &mut tokio::sync::broadcast::Receiver<SessionEvent>,
    format: OutputFormat,
) -> Result<JobStatus> {
    let done = session.wait_for_job(entity);
    tokio::pin!(done);
    let mut last_log = String::new();
    let mut events_open = true;

    loop {
        tokio::select! {
            status = &mut done => return Ok(status?),
            _ = tokio::signal::ctrl_c() => {
                session.cancel_job(entity);
                return Err(ExitError::new(exit_error::INTERRUPTED, "interrupted").into());
            }
            event = events.recv(), if events_open => match event {
                Ok(SessionEvent::DraftChanged { entity: changed }) if changed == *entity => {
                    let Some(draft) = session.get_draft(entity) else { continue };
                    if format == OutputFormat::Text && draft.log_text != last_log {
                        if !draft.log_text.is_empty() {
                            eprintln!("{}", draft.log_text);
                        }
                        last_log = draft.log_text;
                    }
                }
                Ok(_) | Err(RecvError::Lagged(_)) => {}
                Err(RecvError::Closed) => events_open = false,
            },
        }
    }
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
