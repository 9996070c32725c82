// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! tb-engine: draft store, active selection and job polling

pub mod config;
pub mod env;
mod error;
pub mod poller;
pub mod selection;
mod session;
pub mod store;

pub use config::SessionConfig;
pub use error::{ConfigError, SessionError};
pub use poller::{run_poll_loop, spawn_poll_task, PollMachine, PollOutcome, PollSink, PollState};
pub use selection::{HydrationOutcome, HydrationTag, SelectOutcome, Selection};
pub use session::{timeout_diagnostic, Session};
pub use store::DraftStore;
