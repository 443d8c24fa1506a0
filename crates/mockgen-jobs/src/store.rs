// SPDX-FileCopyrightText: 2026 Mockgen Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Durable job records: creation with credit gating, polling, transitions
//! and the retention sweep.

use std::sync::Arc;

use chrono::{Duration, Utc};
use mockgen_billing::CreditPolicy;
use mockgen_config::model::CreditsConfig;
use mockgen_core::types::{FieldSpec, Job, JobAttempt, JobMetadata, JobStatusUpdate, NewJob};
use mockgen_core::{MockgenError, StorageAdapter};
use tracing::{debug, info, warn};

/// A client's request for a new generation job.
#[derive(Debug, Clone, Default)]
pub struct JobSubmission {
    pub user_id: String,
    pub project_id: String,
    pub prompt: String,
    pub objects_count: u32,
    pub resource_type: Option<String>,
    pub schema: Option<Vec<FieldSpec>>,
}

/// Job persistence with the pipeline's admission rules on top.
#[derive(Clone)]
pub struct JobStore {
    storage: Arc<dyn StorageAdapter>,
    credits: CreditPolicy,
    max_objects_per_job: u32,
}

impl JobStore {
    pub fn new(storage: Arc<dyn StorageAdapter>, config: &CreditsConfig) -> Self {
        Self {
            storage,
            credits: CreditPolicy::new(config),
            max_objects_per_job: config.max_objects_per_job,
        }
    }

    pub fn storage(&self) -> &Arc<dyn StorageAdapter> {
        &self.storage
    }

    pub fn credits(&self) -> &CreditPolicy {
        &self.credits
    }

    /// Validate the submission, check the submitter's credits, and insert a
    /// `queued` job.
    pub async fn create_job(&self, submission: JobSubmission) -> Result<Job, MockgenError> {
        if submission.prompt.trim().is_empty() {
            return Err(MockgenError::Validation("prompt must not be empty".into()));
        }
        if submission.project_id.trim().is_empty() {
            return Err(MockgenError::Validation("projectId must not be empty".into()));
        }
        if !(1..=self.max_objects_per_job).contains(&submission.objects_count) {
            return Err(MockgenError::Validation(format!(
                "objectsCount must be between 1 and {}",
                self.max_objects_per_job
            )));
        }

        let user = self
            .storage
            .get_user(&submission.user_id)
            .await?
            .ok_or_else(|| MockgenError::NotFound {
                entity: "user",
                id: submission.user_id.clone(),
            })?;
        self.credits.check(&user)?;

        let job = self
            .storage
            .create_job(NewJob {
                id: uuid::Uuid::new_v4().to_string(),
                user_id: submission.user_id,
                project_id: submission.project_id,
                prompt: submission.prompt,
                objects_count: submission.objects_count,
                metadata: JobMetadata {
                    model: None,
                    resource_type: submission.resource_type,
                    schema: submission.schema,
                },
            })
            .await?;

        debug!(job_id = %job.id, user_id = %job.user_id, objects = job.objects_count, "job queued");
        Ok(job)
    }

    pub async fn get_job(&self, job_id: &str) -> Result<Job, MockgenError> {
        self.storage
            .get_job(job_id)
            .await?
            .ok_or_else(|| MockgenError::NotFound {
                entity: "job",
                id: job_id.to_string(),
            })
    }

    pub async fn latest_job_for_project(
        &self,
        user_id: &str,
        project_id: &str,
    ) -> Result<Option<Job>, MockgenError> {
        self.storage.latest_job_for_project(user_id, project_id).await
    }

    /// Apply one transition. Backward moves fail with `InvalidTransition`.
    pub async fn update_job_status(
        &self,
        job_id: &str,
        update: JobStatusUpdate,
    ) -> Result<Job, MockgenError> {
        self.storage.update_job_status(job_id, update).await
    }

    pub async fn job_attempts(&self, job_id: &str) -> Result<Vec<JobAttempt>, MockgenError> {
        self.storage.list_job_attempts(job_id).await
    }

    /// Fail every job left `queued` or `processing` by a previous process.
    ///
    /// Only safe while no run is in flight, i.e. before serving requests.
    pub async fn fail_unfinished_jobs(&self) -> Result<u64, MockgenError> {
        let err = MockgenError::Interrupted("server stopped before the run finished".into());
        let mut failed = 0;
        for job_id in self.storage.list_unfinished_job_ids().await? {
            match self
                .storage
                .update_job_status(&job_id, JobStatusUpdate::failed(&err, None))
                .await
            {
                Ok(_) => failed += 1,
                Err(e @ MockgenError::InvalidTransition { .. }) => {
                    debug!(job_id, error = %e, "job finished before recovery");
                }
                Err(e) => return Err(e),
            }
        }
        if failed > 0 {
            warn!(failed, "marked interrupted jobs as failed");
        }
        Ok(failed)
    }

    /// Delete terminal jobs created more than `max_age_days` ago.
    pub async fn cleanup_old_jobs(&self, max_age_days: u32) -> Result<u64, MockgenError> {
        let cutoff = (Utc::now() - Duration::days(i64::from(max_age_days)))
            .format("%Y-%m-%dT%H:%M:%S%.3fZ")
            .to_string();
        let deleted = self.storage.delete_terminal_jobs_before(&cutoff).await?;
        info!(deleted, max_age_days, cutoff = %cutoff, "retention sweep finished");
        Ok(deleted)
    }
}
