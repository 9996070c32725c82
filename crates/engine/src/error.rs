// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::time::Duration;
use tb_adapters::RemoteError;
use tb_core::EntityId;
use thiserror::Error;

/// Errors surfaced by [`Session`](crate::Session) operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("backend error: {0}")]
    Remote(#[from] RemoteError),

    #[error("session is closed")]
    Closed,

    #[error("no draft for entity {0}")]
    UnknownEntity(EntityId),
}

/// Rejected [`SessionConfig`](crate::SessionConfig) values
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    #[error("poll interval {interval:?} exceeds job timeout {timeout:?}")]
    IntervalExceedsTimeout { interval: Duration, timeout: Duration },
}
