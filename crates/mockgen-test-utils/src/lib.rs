// SPDX-FileCopyrightText: 2026 Mockgen Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for mockgen integration tests.
//!
//! Provides a scripted provider and a pipeline harness for fast,
//! deterministic tests without any upstream model.
//!
//! # Components
//!
//! - [`MockProvider`] - Scripted generation provider with a call counter
//! - [`TestHarness`] - Job store, runner and fallback chain over a temp SQLite database

pub mod harness;
pub mod mock_provider;

pub use harness::{TestHarness, TestHarnessBuilder};
pub use mock_provider::{MockProvider, Step};
