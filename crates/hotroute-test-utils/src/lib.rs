// SPDX-FileCopyrightText: 2026 Hotroute Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for hotroute integration tests.
//!
//! Provides a mock handler and a harness that runs the full host stack over
//! a temporary plugin directory, without binding a socket.
//!
//! # Components
//!
//! - [`MockHandlerFactory`] - Handler kind `mock` with scripted failures, delays, and counters
//! - [`TestHarness`] - Plugin directory, registry, and router wired together

pub mod harness;
pub mod mock_handler;

pub use harness::{TestHarness, TestHarnessBuilder, TestResponse};
pub use mock_handler::{MockCounters, MockHandlerFactory};
