// SPDX-FileCopyrightText: 2026 Mockgen Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! One-shot maintenance commands: `mockgen sweep` and `mockgen user add`.

use std::sync::Arc;

use mockgen_config::MockgenConfig;
use mockgen_core::types::Tier;
use mockgen_core::{MockgenError, StorageAdapter};
use mockgen_jobs::JobStore;
use mockgen_storage::SqliteStorage;
use tracing::info;

async fn open_storage(config: &MockgenConfig) -> Result<Arc<dyn StorageAdapter>, MockgenError> {
    let storage = SqliteStorage::new(config.storage.clone());
    storage.initialize().await?;
    Ok(Arc::new(storage))
}

/// Runs `mockgen sweep`.
pub async fn run_sweep(config: MockgenConfig, max_age_days: Option<u32>) -> Result<(), MockgenError> {
    let max_age_days = max_age_days.unwrap_or(config.retention.max_age_days);
    if max_age_days == 0 {
        return Err(MockgenError::Validation("--max-age-days must be at least 1".into()));
    }

    let storage = open_storage(&config).await?;
    let store = JobStore::new(Arc::clone(&storage), &config.credits);
    let deleted = store.cleanup_old_jobs(max_age_days).await?;
    storage.close().await?;

    println!("deleted {deleted} job(s) older than {max_age_days} day(s)");
    Ok(())
}

/// Runs `mockgen user add`.
pub async fn run_user_add(
    config: MockgenConfig,
    user_id: &str,
    tier: Tier,
    credits: Option<i64>,
) -> Result<(), MockgenError> {
    if user_id.trim().is_empty() {
        return Err(MockgenError::Validation("--id must not be empty".into()));
    }
    let credits = credits.unwrap_or(config.credits.initial_balance);

    let storage = open_storage(&config).await?;
    let user = storage.upsert_user(user_id, tier, credits).await?;
    storage.close().await?;

    info!(user_id = %user.id, tier = %user.tier, credits = user.credits, "user provisioned");
    println!("user {} ({}) has {} credit(s)", user.id, user.tier, user.credits);
    Ok(())
}
