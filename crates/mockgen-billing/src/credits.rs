// SPDX-FileCopyrightText: 2026 Mockgen Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-user generation credits.
//!
//! A generation is refused when the balance is below `min_balance`, unless
//! the user is on the unlimited tier. Each completed generation costs
//! `cost_per_generation`; the charge is best-effort and never fails a job.

use mockgen_config::model::CreditsConfig;
use mockgen_core::types::User;
use mockgen_core::{MockgenError, StorageAdapter};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreditPolicy {
    min_balance: i64,
    cost_per_generation: i64,
}

impl CreditPolicy {
    pub fn new(config: &CreditsConfig) -> Self {
        Self {
            min_balance: config.min_balance,
            cost_per_generation: config.cost_per_generation,
        }
    }

    /// Whether `user` may start a generation.
    pub fn check(&self, user: &User) -> Result<(), MockgenError> {
        if user.tier.is_unlimited() || user.credits >= self.min_balance {
            return Ok(());
        }
        Err(MockgenError::InsufficientCredits {
            balance: user.credits,
            required: self.min_balance,
        })
    }

    /// Charge one generation. Returns the new balance, or `None` when the
    /// decrement failed (logged, accepted drift).
    pub async fn charge(&self, storage: &dyn StorageAdapter, user_id: &str) -> Option<i64> {
        match storage
            .decrement_credits(user_id, self.cost_per_generation)
            .await
        {
            Ok(balance) => {
                debug!(user_id, balance, "credits charged");
                Some(balance)
            }
            Err(e) => {
                warn!(user_id, error = %e, "credit decrement failed; job result kept");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockgen_config::model::StorageConfig;
    use mockgen_core::types::{Tier, UsageCounter};
    use mockgen_storage::SqliteStorage;
    use tempfile::tempdir;

    fn user(tier: Tier, credits: i64) -> User {
        User {
            id: "u1".into(),
            tier,
            credits,
            usage: UsageCounter::default(),
            created_at: String::new(),
        }
    }

    fn policy() -> CreditPolicy {
        CreditPolicy::new(&CreditsConfig::default())
    }

    #[test]
    fn free_user_below_threshold_refused() {
        let err = policy().check(&user(Tier::Free, 0)).unwrap_err();
        assert!(matches!(
            err,
            MockgenError::InsufficientCredits {
                balance: 0,
                required: 1
            }
        ));
        assert!(policy().check(&user(Tier::Free, 1)).is_ok());
    }

    #[test]
    fn unlimited_tier_bypasses_threshold() {
        assert!(policy().check(&user(Tier::Pro, 0)).is_ok());
    }

    #[tokio::test]
    #[tracing_test::traced_test]
    async fn charge_is_best_effort() {
        let dir = tempdir().unwrap();
        let storage = SqliteStorage::new(StorageConfig {
            database_path: dir.path().join("credits.db").display().to_string(),
            wal_mode: true,
        });
        storage.initialize().await.unwrap();
        storage.upsert_user("u1", Tier::Free, 2).await.unwrap();

        assert_eq!(policy().charge(&storage, "u1").await, Some(1));
        assert_eq!(policy().charge(&storage, "ghost").await, None);
        assert!(logs_contain("credit decrement failed"));
    }
}
