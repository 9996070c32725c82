// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Backend access for draft sessions.
//!
//! The `RemoteClient` trait is the only way the session core talks to the
//! test-management backend:
//! - starting generation/execution jobs and querying their status
//! - loading and saving per-entity drafts
//!
//! `HttpRemoteClient` speaks the REST API; `FakeRemoteClient` (feature
//! `test-support`) scripts responses and latency for tests.

mod http;

pub use http::{BaseUrl, HttpRemoteClient};

#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeRemoteClient, RemoteCall};

use async_trait::async_trait;
use tb_core::{EntityId, JobId, JobKind, JobStatusReport};
use thiserror::Error;

/// Errors from backend calls
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteError {
    /// Network, protocol or backend-side failure
    #[error("request failed: {0}")]
    Request(String),
    /// The requested resource does not exist (expected for unsaved drafts)
    #[error("not found: {0}")]
    NotFound(String),
    #[error("invalid backend url: {0}")]
    InvalidUrl(String),
}

impl RemoteError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, RemoteError::NotFound(_))
    }
}

/// Client for the test-management backend
#[async_trait]
pub trait RemoteClient: Clone + Send + Sync + 'static {
    /// Start a job for an entity and return the backend's job id
    async fn start_job(
        &self,
        entity: &EntityId,
        kind: JobKind,
        params: &serde_json::Value,
    ) -> Result<JobId, RemoteError>;

    /// Query the status of a job. An unknown job is a `not_found` report,
    /// not an error.
    async fn job_status(&self, job: &JobId) -> Result<JobStatusReport, RemoteError>;

    /// Load previously saved content. `NotFound` when nothing was saved.
    async fn load_draft(&self, entity: &EntityId) -> Result<String, RemoteError>;

    async fn save_draft(&self, entity: &EntityId, content: &str) -> Result<(), RemoteError>;
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
