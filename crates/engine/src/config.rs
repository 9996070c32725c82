// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session tuning knobs.

use crate::env;
use crate::error::ConfigError;
use std::time::Duration;

/// Configuration for a [`Session`](crate::Session)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Delay between status polls of a running job
    pub poll_interval: Duration,
    /// Give up on a job after this long without a terminal status
    pub job_timeout: Duration,
    /// Cancel the outgoing entity's job when the selection changes.
    /// Off by default: background jobs keep writing to their stored draft.
    pub cancel_jobs_on_switch: bool,
    /// Buffered change notifications per subscriber
    pub event_capacity: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            poll_interval: env::DEFAULT_POLL_INTERVAL,
            job_timeout: env::DEFAULT_JOB_TIMEOUT,
            cancel_jobs_on_switch: false,
            event_capacity: 256,
        }
    }
}

impl SessionConfig {
    pub fn from_env() -> Self {
        Self { poll_interval: env::poll_interval(), job_timeout: env::job_timeout(), ..Self::default() }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.poll_interval.is_zero() {
            return Err(ConfigError::Zero("poll interval"));
        }
        if self.job_timeout.is_zero() {
            return Err(ConfigError::Zero("job timeout"));
        }
        if self.event_capacity == 0 {
            return Err(ConfigError::Zero("event capacity"));
        }
        if self.poll_interval > self.job_timeout {
            return Err(ConfigError::IntervalExceedsTimeout {
                interval: self.poll_interval,
                timeout: self.job_timeout,
            });
        }
        Ok(())
    }

    tb_core::setters! {
        set {
            poll_interval: Duration,
            job_timeout: Duration,
            cancel_jobs_on_switch: bool,
            event_capacity: usize,
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
