// SPDX-FileCopyrightText: 2026 Mockgen Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end pipeline testing.
//!
//! `TestHarness` assembles the job pipeline over a temp SQLite database and
//! scripted providers. Tests drive it with `submit()` and `run()` and assert
//! on the stored job, the attempt history and user balances.

use std::sync::Arc;
use std::time::Duration;

use mockgen_config::model::{MockgenConfig, StorageConfig};
use mockgen_core::types::{GenerationRequest, Job, Tier};
use mockgen_core::{GenerationProvider, MockgenError, StorageAdapter};
use mockgen_jobs::{GenerationJobRunner, JobStore, JobSubmission, RunOutcome};
use mockgen_resilience::{FallbackOrchestrator, TimeoutBudget};
use mockgen_storage::SqliteStorage;

use crate::mock_provider::MockProvider;

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    providers: Vec<Arc<MockProvider>>,
    users: Vec<(String, Tier, i64)>,
    config: MockgenConfig,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            providers: Vec::new(),
            users: Vec::new(),
            config: MockgenConfig::default(),
        }
    }

    /// Append a provider to the fallback chain, in priority order.
    pub fn with_provider(mut self, provider: Arc<MockProvider>) -> Self {
        self.providers.push(provider);
        self
    }

    /// Provision a user before the harness is handed out.
    pub fn with_user(mut self, id: &str, tier: Tier, credits: i64) -> Self {
        self.users.push((id.to_string(), tier, credits));
        self
    }

    /// Start from a custom configuration. The storage path is always replaced.
    pub fn with_config(mut self, config: MockgenConfig) -> Self {
        self.config = config;
        self
    }

    /// Build the harness, creating the temp database and the pipeline.
    pub async fn build(mut self) -> Result<TestHarness, MockgenError> {
        let temp_dir = tempfile::TempDir::new().map_err(MockgenError::storage)?;
        self.config.storage = StorageConfig {
            database_path: temp_dir.path().join("test.db").to_string_lossy().to_string(),
            wal_mode: true,
        };

        let storage = SqliteStorage::new(self.config.storage.clone());
        storage.initialize().await?;
        let storage: Arc<dyn StorageAdapter> = Arc::new(storage);

        for (id, tier, credits) in &self.users {
            storage.upsert_user(id, *tier, *credits).await?;
        }

        let chain = self
            .providers
            .iter()
            .map(|p| Arc::clone(p) as Arc<dyn GenerationProvider>)
            .collect();
        let providers_config = &self.config.providers;
        let orchestrator = Arc::new(FallbackOrchestrator::new(
            chain,
            TimeoutBudget::new(
                Duration::from_millis(providers_config.timeout_base_ms),
                Duration::from_millis(providers_config.timeout_per_object_ms),
                Duration::from_millis(providers_config.timeout_cap_ms),
            ),
        ));

        let store = JobStore::new(Arc::clone(&storage), &self.config.credits);
        let runner = GenerationJobRunner::new(store.clone(), Arc::clone(&orchestrator));

        Ok(TestHarness {
            providers: self.providers,
            storage,
            store,
            runner,
            orchestrator,
            config: self.config,
            _temp_dir: temp_dir,
        })
    }
}

/// A complete pipeline over scripted providers and a temp database.
pub struct TestHarness {
    /// Scripted providers in fallback order.
    pub providers: Vec<Arc<MockProvider>>,
    /// SQLite storage adapter (temp DB, cleaned up on drop).
    pub storage: Arc<dyn StorageAdapter>,
    pub store: JobStore,
    pub runner: GenerationJobRunner,
    pub orchestrator: Arc<FallbackOrchestrator>,
    /// Effective configuration, storage path included.
    pub config: MockgenConfig,
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    /// Create a new builder for configuring the test harness.
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// Queue a job for `user_id` in project `p1`.
    pub async fn submit(&self, user_id: &str, prompt: &str, count: u32) -> Result<Job, MockgenError> {
        self.store
            .create_job(JobSubmission {
                user_id: user_id.to_string(),
                project_id: "p1".to_string(),
                prompt: prompt.to_string(),
                objects_count: count,
                ..Default::default()
            })
            .await
    }

    /// Run a previously submitted job with its stored request.
    pub async fn run(&self, job: &Job) -> RunOutcome {
        let request: GenerationRequest = job.generation_request();
        self.runner.run(&job.id, &job.user_id, &request).await
    }

    pub async fn job(&self, job_id: &str) -> Result<Job, MockgenError> {
        self.store.get_job(job_id).await
    }

    pub async fn credits(&self, user_id: &str) -> Result<i64, MockgenError> {
        self.storage
            .get_user(user_id)
            .await?
            .map(|user| user.credits)
            .ok_or_else(|| MockgenError::NotFound {
                entity: "user",
                id: user_id.to_string(),
            })
    }
}
