// SPDX-FileCopyrightText: 2026 Mockgen Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Generation job pipeline for mockgen.
//!
//! - [`normalizer`] repairs raw model text into validated records
//! - [`JobStore`] owns job creation, lookup, transitions and retention
//! - [`GenerationJobRunner`] drives one job from `processing` to a terminal state

pub mod normalizer;
pub mod runner;
pub mod store;

pub use normalizer::{fit_to_count, normalize};
pub use runner::{GenerationJobRunner, RunOutcome};
pub use store::{JobStore, JobSubmission};
