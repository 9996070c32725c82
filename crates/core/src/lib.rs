// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! tb-core: shared types for testbench draft sessions

pub mod macros;

pub mod clock;
pub mod draft;
pub mod event;
pub mod id;
pub mod job;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use clock::{Clock, FakeClock, SystemClock};
pub use draft::{EntityDraft, Hydration};
pub use event::SessionEvent;
pub use id::{short, EntityId, IdGen, NanoIdGen, SequentialIdGen, SessionId};
pub use job::{
    JobHandle, JobId, JobKind, JobResult, JobStatus, JobStatusReport, RemoteJobStatus,
    ResultCounts,
};
