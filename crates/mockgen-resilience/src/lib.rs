// SPDX-FileCopyrightText: 2026 Mockgen Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Resilience primitives for provider calls.
//!
//! - [`RetryPolicy`]: per-call exponential backoff on transient upstream errors.
//! - [`TimeoutBudget`]: call deadline that scales with the requested object count.
//! - [`SlidingWindow`]: process-local request budget per provider.
//! - [`FallbackOrchestrator`]: tries providers in priority order until one answers.

pub mod fallback;
pub mod retry;
pub mod timeout;
pub mod window;

pub use fallback::FallbackOrchestrator;
pub use retry::RetryPolicy;
pub use timeout::TimeoutBudget;
pub use window::SlidingWindow;
