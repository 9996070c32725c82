// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Backend client and session construction from flags and environment.

use anyhow::{Context, Result};
use std::time::Duration;
use tb_adapters::HttpRemoteClient;
use tb_engine::{env, Session, SessionConfig};

/// Resolved connection settings: flags win over environment.
#[derive(Debug, Clone, PartialEq)]
pub struct Backend {
    pub url: String,
    pub request_timeout: Duration,
    pub auth_token: Option<String>,
}

impl Backend {
    pub fn resolve(url_flag: Option<&str>) -> Self {
        Self {
            url: url_flag.map(str::to_string).unwrap_or_else(env::backend_url),
            request_timeout: env::request_timeout(),
            auth_token: env::auth_token(),
        }
    }

    pub fn client(&self) -> Result<HttpRemoteClient> {
        let client = HttpRemoteClient::new(&self.url, self.request_timeout)
            .with_context(|| format!("cannot use backend {}", self.url))?;
        Ok(match &self.auth_token {
            Some(token) => client.with_auth_token(token.clone()),
            None => client,
        })
    }

    /// A session over this backend, optionally with a job timeout override.
    pub fn session(&self, job_timeout: Option<Duration>) -> Result<Session<HttpRemoteClient>> {
        let mut config = SessionConfig::from_env();
        if let Some(timeout) = job_timeout {
            config = config.job_timeout(timeout);
        }
        if config.poll_interval > config.job_timeout {
            let job_timeout = config.job_timeout;
            config = config.poll_interval(job_timeout);
        }
        config.validate()?;
        tracing::debug!(url = %self.url, ?config, "opening session");
        Ok(Session::new(self.client()?, config))
    }
}

#[cfg(test)]
#[path = "backend_tests.rs"]
mod tests;
