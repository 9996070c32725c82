// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error type that carries a process exit code.
//!
//! Commands return `ExitError` instead of calling `std::process::exit()`
//! directly, so `main()` owns process termination.

use std::fmt;
use tb_core::JobStatus;

/// Job failed or was cancelled; also generic command failure
pub const FAILURE: i32 = 1;
/// Job gave up at the polling ceiling; its outcome is unknown
pub const TIMED_OUT: i32 = 2;
/// Interrupted with Ctrl-C
pub const INTERRUPTED: i32 = 130;

#[derive(Debug)]
pub struct ExitError {
    pub code: i32,
    pub message: String,
}

impl ExitError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self { code, message: message.into() }
    }

    /// Exit code for a terminal job status, or `None` for success.
    pub fn for_job(status: JobStatus, message: impl Into<String>) -> Option<Self> {
        let code = match status {
            JobStatus::Completed | JobStatus::Running => return None,
            JobStatus::Timeout => TIMED_OUT,
            JobStatus::Failed | JobStatus::Cancelled => FAILURE,
        };
        Some(Self::new(code, message))
    }
}

impl fmt::Display for ExitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ExitError {}

#[cfg(test)]
#[path = "exit_error_tests.rs"]
mod tests;
