// SPDX-FileCopyrightText: 2026 Mockgen Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Credit gating for generation and monthly quotas for live-data reads.

pub mod credits;
pub mod quota;

pub use credits::CreditPolicy;
pub use quota::{QuotaPolicy, current_period, period_key};
