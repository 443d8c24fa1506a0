// SPDX-FileCopyrightText: 2026 Mockgen Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Monthly live-data request quotas.

use chrono::{Datelike, Utc};
use mockgen_config::model::QuotaConfig;
use mockgen_core::types::{QuotaLimits, UsageGrant};
use mockgen_core::{MockgenError, StorageAdapter};

/// Billing period key for a date: `"{year}-{month}"`, month not zero-padded.
pub fn period_key<D: Datelike>(date: &D) -> String {
    format!("{}-{}", date.year(), date.month())
}

/// Period key for the current UTC month.
pub fn current_period() -> String {
    period_key(&Utc::now())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaPolicy {
    limits: QuotaLimits,
}

impl QuotaPolicy {
    pub fn new(config: &QuotaConfig) -> Self {
        Self {
            limits: config.limits(),
        }
    }

    pub fn limits(&self) -> QuotaLimits {
        self.limits
    }

    /// Count one request against `user_id` in `period`.
    pub async fn admit_in(
        &self,
        storage: &dyn StorageAdapter,
        user_id: &str,
        period: &str,
    ) -> Result<UsageGrant, MockgenError> {
        storage.admit_usage(user_id, period, self.limits).await
    }
}
