// SPDX-FileCopyrightText: 2026 Mockgen Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the StorageAdapter trait.

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::debug;

use mockgen_config::model::StorageConfig;
use mockgen_core::types::{
    Job, JobAttempt, JobStatusUpdate, NewJob, NewResource, QuotaLimits, Resource, Tier,
    UsageGrant, UsageLogEntry, User,
};
use mockgen_core::{AdapterType, HealthStatus, MockgenError, PluginAdapter, StorageAdapter};

use crate::database::{Database, map_tr_err};
use crate::queries;

/// SQLite-backed storage adapter.
///
/// The database is opened on the first call to [`StorageAdapter::initialize`].
pub struct SqliteStorage {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqliteStorage {
    /// The connection is not opened until [`StorageAdapter::initialize`] is called.
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    fn db(&self) -> Result<&Database, MockgenError> {
        self.db
            .get()
            .ok_or_else(|| MockgenError::storage("storage not initialized, call initialize() first"))
    }

    async fn checkpoint(db: &Database) -> Result<(), MockgenError> {
        db.connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)
    }
}

#[async_trait]
impl PluginAdapter for SqliteStorage {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, MockgenError> {
        let db = self.db()?;
        db.connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), MockgenError> {
        if let Some(db) = self.db.get() {
            Self::checkpoint(db).await?;
            debug!("shutdown: WAL checkpoint complete");
        }
        Ok(())
    }
}

#[async_trait]
impl StorageAdapter for SqliteStorage {
    async fn initialize(&self) -> Result<(), MockgenError> {
        let db = Database::open_with(&self.config.database_path, self.config.wal_mode).await?;
        self.db
            .set(db)
            .map_err(|_| MockgenError::storage("storage already initialized"))?;
        debug!(path = %self.config.database_path, "SQLite storage initialized");
        Ok(())
    }

    async fn close(&self) -> Result<(), MockgenError> {
        Self::checkpoint(self.db()?).await?;
        debug!("WAL checkpoint complete");
        Ok(())
    }

    // --- Jobs ---

    async fn create_job(&self, job: NewJob) -> Result<Job, MockgenError> {
        queries::jobs::create_job(self.db()?, job).await
    }

    async fn get_job(&self, job_id: &str) -> Result<Option<Job>, MockgenError> {
        queries::jobs::get_job(self.db()?, job_id).await
    }

    async fn latest_job_for_project(
        &self,
        user_id: &str,
        project_id: &str,
    ) -> Result<Option<Job>, MockgenError> {
        queries::jobs::latest_job_for_project(self.db()?, user_id, project_id).await
    }

    async fn update_job_status(
        &self,
        job_id: &str,
        update: JobStatusUpdate,
    ) -> Result<Job, MockgenError> {
        queries::jobs::update_job_status(self.db()?, job_id, update).await
    }

    async fn delete_terminal_jobs_before(&self, cutoff: &str) -> Result<u64, MockgenError> {
        queries::jobs::delete_terminal_jobs_before(self.db()?, cutoff).await
    }

    async fn list_job_attempts(&self, job_id: &str) -> Result<Vec<JobAttempt>, MockgenError> {
        queries::jobs::list_job_attempts(self.db()?, job_id).await
    }

    async fn list_unfinished_job_ids(&self) -> Result<Vec<String>, MockgenError> {
        queries::jobs::list_unfinished_job_ids(self.db()?).await
    }

    // --- Users ---

    async fn upsert_user(
        &self,
        user_id: &str,
        tier: Tier,
        credits: i64,
    ) -> Result<User, MockgenError> {
        queries::users::upsert_user(self.db()?, user_id, tier, credits).await
    }

    async fn get_user(&self, user_id: &str) -> Result<Option<User>, MockgenError> {
        queries::users::get_user(self.db()?, user_id).await
    }

    async fn decrement_credits(&self, user_id: &str, amount: i64) -> Result<i64, MockgenError> {
        queries::users::decrement_credits(self.db()?, user_id, amount).await
    }

    // --- Resources and live usage ---

    async fn create_resource(&self, resource: NewResource) -> Result<Resource, MockgenError> {
        queries::resources::create_resource(self.db()?, resource).await
    }

    async fn get_resource(&self, resource_id: &str) -> Result<Option<Resource>, MockgenError> {
        queries::resources::get_resource(self.db()?, resource_id).await
    }

    async fn set_resource_live(
        &self,
        resource_id: &str,
        live: bool,
    ) -> Result<Option<Resource>, MockgenError> {
        queries::resources::set_resource_live(self.db()?, resource_id, live).await
    }

    async fn admit_usage(
        &self,
        user_id: &str,
        period: &str,
        limits: QuotaLimits,
    ) -> Result<UsageGrant, MockgenError> {
        queries::usage::admit_usage(self.db()?, user_id, period, limits).await
    }

    async fn append_usage_log(&self, entry: UsageLogEntry) -> Result<(), MockgenError> {
        queries::usage::append_usage_log(self.db()?, entry).await
    }

    async fn list_usage_log(
        &self,
        resource_id: &str,
        limit: u32,
    ) -> Result<Vec<UsageLogEntry>, MockgenError> {
        queries::usage::list_usage_log(self.db()?, resource_id, limit).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn make_config(path: &str) -> StorageConfig {
        StorageConfig {
            database_path: path.to_string(),
            wal_mode: true,
        }
    }

    #[tokio::test]
    async fn sqlite_storage_implements_plugin_adapter() {
        let storage = SqliteStorage::new(make_config("/tmp/unused.db"));
        assert_eq!(storage.name(), "sqlite");
        assert_eq!(storage.version(), semver::Version::new(0, 1, 0));
        assert_eq!(storage.adapter_type(), AdapterType::Storage);
    }

    #[tokio::test]
    async fn operations_before_initialize_fail() {
        let storage = SqliteStorage::new(make_config("/tmp/unused.db"));
        let err = storage.get_job("j1").await.unwrap_err();
        assert!(matches!(err, MockgenError::Storage { .. }));
        // Shutdown without a database is a no-op.
        storage.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn initialize_opens_database_at_configured_path() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("init_test.db");
        let storage = SqliteStorage::new(make_config(db_path.to_str().unwrap()));

        storage.initialize().await.unwrap();
        assert!(db_path.exists(), "database file should be created");
        assert_eq!(storage.health_check().await.unwrap(), HealthStatus::Healthy);

        let err = storage.initialize().await.unwrap_err();
        assert!(err.to_string().contains("already initialized"));
        storage.close().await.unwrap();
    }

    #[tokio::test]
    async fn trait_object_round_trip() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("dyn.db");
        let storage: Box<dyn StorageAdapter> =
            Box::new(SqliteStorage::new(make_config(db_path.to_str().unwrap())));
        storage.initialize().await.unwrap();

        storage.upsert_user("u1", Tier::Free, 5).await.unwrap();
        assert_eq!(storage.decrement_credits("u1", 2).await.unwrap(), 3);
        let user = storage.get_user("u1").await.unwrap().unwrap();
        assert_eq!(user.credits, 3);
    }
}
