// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access.

use std::time::Duration;

pub const DEFAULT_BACKEND_URL: &str = "http://127.0.0.1:8000/api";
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);
pub const DEFAULT_JOB_TIMEOUT: Duration = Duration::from_secs(5 * 60);
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Backend base URL: TB_BACKEND_URL > default
pub fn backend_url() -> String {
    std::env::var("TB_BACKEND_URL")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_BACKEND_URL.to_string())
}

/// Bearer token sent with backend requests
pub fn auth_token() -> Option<String> {
    std::env::var("TB_AUTH_TOKEN").ok().filter(|s| !s.is_empty())
}

/// Delay between job status polls (default 2s)
pub fn poll_interval() -> Duration {
    duration_ms("TB_POLL_INTERVAL_MS").unwrap_or(DEFAULT_POLL_INTERVAL)
}

/// Ceiling on how long a job is polled before giving up (default 5m)
pub fn job_timeout() -> Duration {
    duration_ms("TB_JOB_TIMEOUT_MS").unwrap_or(DEFAULT_JOB_TIMEOUT)
}

/// Per-request timeout for backend calls (default 5s)
pub fn request_timeout() -> Duration {
    duration_ms("TB_REQUEST_TIMEOUT_MS").unwrap_or(DEFAULT_REQUEST_TIMEOUT)
}

/// Zero and unparsable values count as unset.
fn duration_ms(var: &str) -> Option<Duration> {
    std::env::var(var)
        .ok()
        .and_then(|s| s.trim().parse::<u64>().ok())
        .filter(|ms| *ms > 0)
        .map(Duration::from_millis)
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
