// SPDX-FileCopyrightText: 2026 Mockgen Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Drives one generation job from `processing` to a terminal state.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use futures::FutureExt;
use mockgen_core::types::{GeneratedRecord, GenerationRequest, JobStatus, JobStatusUpdate};
use mockgen_core::MockgenError;
use mockgen_resilience::FallbackOrchestrator;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::normalizer;
use crate::store::JobStore;

/// Structured result of one run. Never an `Err`: failures are data here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    pub processing_time_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider_used: Option<String>,
}

impl RunOutcome {
    fn completed(item_count: u32, processing_time_ms: u64, provider: String) -> Self {
        Self {
            success: true,
            item_count: Some(item_count),
            error: None,
            error_code: None,
            processing_time_ms,
            provider_used: Some(provider),
        }
    }

    fn failed(err: &MockgenError, processing_time_ms: u64) -> Self {
        Self {
            success: false,
            item_count: None,
            error: Some(err.to_string()),
            error_code: Some(err.code().to_string()),
            processing_time_ms,
            provider_used: None,
        }
    }
}

/// Runs jobs against the provider chain and records the outcome.
#[derive(Clone)]
pub struct GenerationJobRunner {
    store: JobStore,
    orchestrator: Arc<FallbackOrchestrator>,
}

impl GenerationJobRunner {
    pub fn new(store: JobStore, orchestrator: Arc<FallbackOrchestrator>) -> Self {
        Self {
            store,
            orchestrator,
        }
    }

    pub fn store(&self) -> &JobStore {
        &self.store
    }

    /// Run `job_id` once. Every failure, panics included, becomes a `failed`
    /// transition and an unsuccessful [`RunOutcome`].
    pub async fn run(&self, job_id: &str, user_id: &str, request: &GenerationRequest) -> RunOutcome {
        let started = Instant::now();
        let attempt = AssertUnwindSafe(self.run_inner(job_id, user_id, request, started))
            .catch_unwind()
            .await;

        match attempt {
            Ok(outcome) => outcome,
            Err(panic) => {
                let message = panic
                    .downcast_ref::<&str>()
                    .map(|s| (*s).to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                error!(job_id, panic = %message, "job run panicked");
                self.fail(job_id, MockgenError::Internal(format!("run panicked: {message}")), started)
                    .await
            }
        }
    }

    /// Like [`run`](Self::run), but stops when `cancel` fires and records the
    /// job as failed with an `interrupted` code instead of leaving it open.
    pub async fn run_until_cancelled(
        &self,
        job_id: &str,
        user_id: &str,
        request: &GenerationRequest,
        cancel: &CancellationToken,
    ) -> RunOutcome {
        let started = Instant::now();
        match cancel
            .run_until_cancelled(self.run(job_id, user_id, request))
            .await
        {
            Some(outcome) => outcome,
            None => {
                self.fail(
                    job_id,
                    MockgenError::Interrupted("server shutting down".into()),
                    started,
                )
                .await
            }
        }
    }

    /// Re-run a `failed` job with its original prompt, count and owner.
    pub async fn retry(&self, job_id: &str) -> Result<RunOutcome, MockgenError> {
        let job = self.store.get_job(job_id).await?;
        if job.status != JobStatus::Failed {
            return Err(MockgenError::InvalidState {
                job_id: job.id,
                status: job.status,
            });
        }
        info!(job_id, attempts = job.attempts, "retrying failed job");
        Ok(self
            .run(&job.id, &job.user_id, &job.generation_request())
            .await)
    }

    async fn run_inner(
        &self,
        job_id: &str,
        user_id: &str,
        request: &GenerationRequest,
        started: Instant,
    ) -> RunOutcome {
        if let Err(err) = self
            .store
            .update_job_status(job_id, JobStatusUpdate::processing())
            .await
        {
            error!(job_id, error = %err, "could not mark job processing");
            return RunOutcome::failed(&err, elapsed_ms(started));
        }

        let generation = match self.orchestrator.generate(request).await {
            Ok(generation) => generation,
            Err(err) => return self.fail(job_id, err, started).await,
        };

        let records = match normalizer::normalize(&generation.raw_text) {
            Ok(records) => records,
            Err(err) => {
                warn!(job_id, provider = %generation.provider, error = %err, "model output rejected");
                return self.fail(job_id, err, started).await;
            }
        };
        let records = self.apply_length_policy(job_id, records, request.object_count);
        let item_count = u32::try_from(records.len()).unwrap_or(u32::MAX);

        let elapsed = elapsed_ms(started);
        let update = JobStatusUpdate::completed(records, elapsed, generation.provider.clone());
        if let Err(err) = self.store.update_job_status(job_id, update).await {
            error!(job_id, error = %err, "could not store job result");
            return self.fail(job_id, err, started).await;
        }
        info!(
            job_id,
            provider = %generation.provider,
            items = item_count,
            elapsed_ms = elapsed,
            "job completed"
        );

        self.store
            .credits()
            .charge(self.store.storage().as_ref(), user_id)
            .await;

        RunOutcome::completed(item_count, elapsed, generation.provider)
    }

    fn apply_length_policy(
        &self,
        job_id: &str,
        records: Vec<GeneratedRecord>,
        expected: u32,
    ) -> Vec<GeneratedRecord> {
        let produced = records.len();
        if produced > expected as usize {
            info!(job_id, produced, expected, "truncating surplus records");
        } else if produced < expected as usize {
            info!(job_id, produced, expected, "provider returned fewer records than requested");
        }
        normalizer::fit_to_count(records, expected)
    }

    async fn fail(&self, job_id: &str, err: MockgenError, started: Instant) -> RunOutcome {
        let elapsed = elapsed_ms(started);
        warn!(job_id, code = err.code(), error = %err, "job failed");
        if let Err(store_err) = self
            .store
            .update_job_status(job_id, JobStatusUpdate::failed(&err, Some(elapsed)))
            .await
        {
            error!(job_id, error = %store_err, "could not record job failure");
        }
        RunOutcome::failed(&err, elapsed)
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use mockgen_config::model::{CreditsConfig, StorageConfig};
    use mockgen_core::types::{FieldValue, Tier};
    use mockgen_core::{GenerationProvider, StorageAdapter};
    use mockgen_resilience::TimeoutBudget;
    use mockgen_storage::SqliteStorage;
    use mockgen_test_utils::{MockProvider, Step};
    use tempfile::TempDir;

    use crate::store::JobSubmission;

    const THREE_FRUITS: &str =
        r#"[{"id":1,"name":"apple"},{"id":2,"name":"banana"},{"id":3,"name":"cherry"}]"#;

    struct Fixture {
        runner: GenerationJobRunner,
        storage: Arc<dyn StorageAdapter>,
        _dir: TempDir,
    }

    async fn fixture(providers: &[&Arc<MockProvider>]) -> Fixture {
        let dir = TempDir::new().unwrap();
        let storage = SqliteStorage::new(StorageConfig {
            database_path: dir.path().join("runner.db").display().to_string(),
            wal_mode: true,
        });
        storage.initialize().await.unwrap();
        storage.upsert_user("alice", Tier::Free, 5).await.unwrap();
        let storage: Arc<dyn StorageAdapter> = Arc::new(storage);

        let providers = providers
            .iter()
            .map(|p| Arc::clone(*p) as Arc<dyn GenerationProvider>)
            .collect();
        let orchestrator = Arc::new(FallbackOrchestrator::new(
            providers,
            TimeoutBudget::new(
                Duration::from_millis(200),
                Duration::from_millis(10),
                Duration::from_millis(500),
            ),
        ));
        let store = JobStore::new(Arc::clone(&storage), &CreditsConfig::default());
        Fixture {
            runner: GenerationJobRunner::new(store, orchestrator),
            storage,
            _dir: dir,
        }
    }

    async fn submit(fx: &Fixture, prompt: &str, count: u32) -> String {
        fx.runner
            .store()
            .create_job(JobSubmission {
                user_id: "alice".into(),
                project_id: "p1".into(),
                prompt: prompt.into(),
                objects_count: count,
                ..Default::default()
            })
            .await
            .unwrap()
            .id
    }

    async fn run(fx: &Fixture, job_id: &str) -> RunOutcome {
        let job = fx.runner.store().get_job(job_id).await.unwrap();
        fx.runner
            .run(&job.id, &job.user_id, &job.generation_request())
            .await
    }

    async fn credits(fx: &Fixture) -> i64 {
        fx.storage.get_user("alice").await.unwrap().unwrap().credits
    }

    #[tokio::test]
    async fn completes_and_charges_credits() {
        let fast = Arc::new(MockProvider::with_responses("fast", vec![THREE_FRUITS.into()]));
        let fx = fixture(&[&fast]).await;
        let job_id = submit(&fx, "list 3 fruits", 3).await;

        let outcome = run(&fx, &job_id).await;
        assert!(outcome.success);
        assert_eq!(outcome.item_count, Some(3));
        assert_eq!(outcome.provider_used.as_deref(), Some("fast"));

        let job = fx.runner.store().get_job(&job_id).await.unwrap();
        assert_eq!(job.status, JobStatus::Completed);
        let result = job.result.unwrap();
        assert_eq!(result.len(), 3);
        assert_eq!(result[2].id(), Some(&FieldValue::Integer(3)));
        assert_eq!(job.metadata.model.as_deref(), Some("fast"));
        assert_eq!(credits(&fx).await, 4);
    }

    #[tokio::test]
    async fn exhaustion_fails_job_without_charging() {
        let a = Arc::new(MockProvider::rate_limited("fast", 1));
        let b = Arc::new(MockProvider::rate_limited("balanced", 1));
        let c = Arc::new(MockProvider::rate_limited("quality", 1));
        let fx = fixture(&[&a, &b, &c]).await;
        let job_id = submit(&fx, "list 3 fruits", 3).await;

        let outcome = run(&fx, &job_id).await;
        assert!(!outcome.success);
        assert_eq!(outcome.error_code.as_deref(), Some("all_providers_exhausted"));
        assert_eq!((a.calls(), b.calls(), c.calls()), (1, 1, 1));

        let job = fx.runner.store().get_job(&job_id).await.unwrap();
        assert_eq!(job.status, JobStatus::Failed);
        assert!(!job.error.unwrap_or_default().is_empty());
        assert_eq!(credits(&fx).await, 5);
    }

    #[tokio::test]
    async fn malformed_output_fails_job() {
        let fast = Arc::new(MockProvider::with_responses("fast", vec!["not json at all".into()]));
        let fx = fixture(&[&fast]).await;
        let job_id = submit(&fx, "list 3 fruits", 3).await;

        let outcome = run(&fx, &job_id).await;
        assert_eq!(outcome.error_code.as_deref(), Some("malformed_output"));
        let job = fx.runner.store().get_job(&job_id).await.unwrap();
        assert_eq!(job.status, JobStatus::Failed);
        assert_eq!(job.error_code.as_deref(), Some("malformed_output"));
    }

    #[tokio::test]
    async fn surplus_records_are_truncated() {
        let fast = Arc::new(MockProvider::with_responses("fast", vec![THREE_FRUITS.into()]));
        let fx = fixture(&[&fast]).await;
        let job_id = submit(&fx, "list 2 fruits", 2).await;

        let outcome = run(&fx, &job_id).await;
        assert_eq!(outcome.item_count, Some(2));
        let job = fx.runner.store().get_job(&job_id).await.unwrap();
        assert_eq!(job.result.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn short_results_are_accepted() {
        let fast = Arc::new(MockProvider::with_responses("fast", vec![THREE_FRUITS.into()]));
        let fx = fixture(&[&fast]).await;
        let job_id = submit(&fx, "list 5 fruits", 5).await;
        assert_eq!(run(&fx, &job_id).await.item_count, Some(3));
    }

    #[tokio::test]
    async fn provider_timeout_never_leaves_job_processing() {
        let slow = Arc::new(MockProvider::scripted(
            "fast",
            vec![Step::Stall(Duration::from_secs(5), THREE_FRUITS.into())],
        ));
        let fx = fixture(&[&slow]).await;
        let job_id = submit(&fx, "list 3 fruits", 3).await;

        let outcome = run(&fx, &job_id).await;
        assert!(!outcome.success);
        let job = fx.runner.store().get_job(&job_id).await.unwrap();
        assert_eq!(job.status, JobStatus::Failed);
        assert!(job.error.unwrap().contains("timed out"));
    }

    #[tokio::test]
    async fn cancelled_run_marks_job_interrupted() {
        let slow = Arc::new(MockProvider::scripted(
            "fast",
            vec![
                Step::Stall(Duration::from_millis(400), THREE_FRUITS.into()),
                Step::Reply(THREE_FRUITS.into()),
            ],
        ));
        let fx = fixture(&[&slow]).await;
        let job_id = submit(&fx, "list 3 fruits", 3).await;
        let job = fx.runner.store().get_job(&job_id).await.unwrap();

        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            trigger.cancel();
        });
        let outcome = fx
            .runner
            .run_until_cancelled(&job.id, &job.user_id, &job.generation_request(), &cancel)
            .await;

        assert_eq!(outcome.error_code.as_deref(), Some("interrupted"));
        let job = fx.runner.store().get_job(&job_id).await.unwrap();
        assert_eq!(job.status, JobStatus::Failed);
        assert_eq!(job.error_code.as_deref(), Some("interrupted"));
        assert_eq!(credits(&fx).await, 5);

        // An interrupted job is an ordinary failed job for retry.
        assert!(fx.runner.retry(&job_id).await.unwrap().success);
    }

    #[tokio::test]
    async fn uncancelled_run_completes_normally() {
        let fast = Arc::new(MockProvider::with_responses("fast", vec![THREE_FRUITS.into()]));
        let fx = fixture(&[&fast]).await;
        let job_id = submit(&fx, "list 3 fruits", 3).await;
        let job = fx.runner.store().get_job(&job_id).await.unwrap();

        let outcome = fx
            .runner
            .run_until_cancelled(
                &job.id,
                &job.user_id,
                &job.generation_request(),
                &CancellationToken::new(),
            )
            .await;
        assert!(outcome.success);
    }

    #[tokio::test]
    async fn panicking_provider_becomes_failed_job() {
        let fast = Arc::new(MockProvider::scripted("fast", vec![Step::Panic("provider bug")]));
        let fx = fixture(&[&fast]).await;
        let job_id = submit(&fx, "list 3 fruits", 3).await;

        let outcome = run(&fx, &job_id).await;
        assert_eq!(outcome.error_code.as_deref(), Some("internal"));
        assert!(outcome.error.unwrap().contains("provider bug"));
        let job = fx.runner.store().get_job(&job_id).await.unwrap();
        assert_eq!(job.status, JobStatus::Failed);
    }

    #[tokio::test]
    async fn credit_decrement_failure_keeps_completed_job() {
        let fast = Arc::new(MockProvider::with_responses("fast", vec![THREE_FRUITS.into()]));
        let fx = fixture(&[&fast]).await;
        let job_id = submit(&fx, "list 3 fruits", 3).await;

        // The owner disappears between submission and completion.
        let job = fx.runner.store().get_job(&job_id).await.unwrap();
        let outcome = fx
            .runner
            .run(&job.id, "deleted-user", &job.generation_request())
            .await;

        assert!(outcome.success);
        let job = fx.runner.store().get_job(&job_id).await.unwrap();
        assert_eq!(job.status, JobStatus::Completed);
        assert_eq!(credits(&fx).await, 5);
    }

    #[tokio::test]
    async fn retry_reruns_failed_job() {
        let fast = Arc::new(MockProvider::scripted(
            "fast",
            vec![
                Step::Reply("garbage".into()),
                Step::Reply(THREE_FRUITS.into()),
            ],
        ));
        let fx = fixture(&[&fast]).await;
        let job_id = submit(&fx, "list 3 fruits", 3).await;

        assert!(!run(&fx, &job_id).await.success);
        let outcome = fx.runner.retry(&job_id).await.unwrap();
        assert!(outcome.success);

        let job = fx.runner.store().get_job(&job_id).await.unwrap();
        assert_eq!(job.status, JobStatus::Completed);
        assert_eq!(job.attempts, 2);
        assert!(job.error.is_none());

        let attempts = fx.runner.store().job_attempts(&job_id).await.unwrap();
        let statuses: Vec<_> = attempts.iter().map(|a| a.status).collect();
        assert_eq!(statuses, vec![JobStatus::Failed, JobStatus::Completed]);

        let requests = fast.requests().await;
        assert_eq!(requests[1].prompt, "list 3 fruits");
        assert_eq!(requests[1].object_count, 3);
    }

    #[tokio::test]
    async fn retry_rejects_non_failed_jobs() {
        let fast = Arc::new(MockProvider::with_responses("fast", vec![THREE_FRUITS.into()]));
        let fx = fixture(&[&fast]).await;
        let job_id = submit(&fx, "list 3 fruits", 3).await;

        let err = fx.runner.retry(&job_id).await.unwrap_err();
        assert!(matches!(err, MockgenError::InvalidState { status: JobStatus::Queued, .. }));

        run(&fx, &job_id).await;
        let err = fx.runner.retry(&job_id).await.unwrap_err();
        assert!(matches!(err, MockgenError::InvalidState { status: JobStatus::Completed, .. }));
    }

    #[tokio::test]
    async fn run_on_completed_job_does_not_touch_it() {
        let fast = Arc::new(MockProvider::with_responses(
            "fast",
            vec![THREE_FRUITS.into(), THREE_FRUITS.into()],
        ));
        let fx = fixture(&[&fast]).await;
        let job_id = submit(&fx, "list 3 fruits", 3).await;
        run(&fx, &job_id).await;

        let outcome = run(&fx, &job_id).await;
        assert_eq!(outcome.error_code.as_deref(), Some("invalid_transition"));
        assert_eq!(fast.calls(), 1);
        let job = fx.runner.store().get_job(&job_id).await.unwrap();
        assert_eq!(job.status, JobStatus::Completed);
    }
}
