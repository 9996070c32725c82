// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! tb-adapters: backend clients for testbench sessions

pub mod remote;

pub use remote::{BaseUrl, HttpRemoteClient, RemoteClient, RemoteError};

#[cfg(any(test, feature = "test-support"))]
pub use remote::{FakeRemoteClient, RemoteCall};
