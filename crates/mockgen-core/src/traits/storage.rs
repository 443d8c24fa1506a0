// SPDX-FileCopyrightText: 2026 Mockgen Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Storage adapter trait for persistence backends.

use async_trait::async_trait;

use crate::error::MockgenError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{
    Job, JobAttempt, JobStatusUpdate, NewJob, NewResource, QuotaLimits, Resource, Tier,
    UsageGrant, UsageLogEntry, User,
};

/// Adapter for persistence backends.
///
/// Every mutating operation on a single record is atomic: job transitions,
/// credit decrements and usage admission never lose concurrent updates.
#[async_trait]
pub trait StorageAdapter: PluginAdapter {
    /// Initializes the storage backend (migrations, connection, etc.).
    async fn initialize(&self) -> Result<(), MockgenError>;

    /// Closes the storage backend, flushing pending writes.
    async fn close(&self) -> Result<(), MockgenError>;

    // --- Jobs ---

    /// Inserts a job in `queued` state.
    async fn create_job(&self, job: NewJob) -> Result<Job, MockgenError>;

    async fn get_job(&self, job_id: &str) -> Result<Option<Job>, MockgenError>;

    /// Most recently created job for the (user, project) pair.
    async fn latest_job_for_project(
        &self,
        user_id: &str,
        project_id: &str,
    ) -> Result<Option<Job>, MockgenError>;

    /// Applies a status transition.
    ///
    /// Rejects transitions that move a job backwards with
    /// [`MockgenError::InvalidTransition`]. Terminal statuses stamp the
    /// completion time and append a row to the attempt history.
    async fn update_job_status(
        &self,
        job_id: &str,
        update: JobStatusUpdate,
    ) -> Result<Job, MockgenError>;

    /// Deletes terminal jobs created before `cutoff` (ISO-8601 UTC). Returns the count.
    async fn delete_terminal_jobs_before(&self, cutoff: &str) -> Result<u64, MockgenError>;

    async fn list_job_attempts(&self, job_id: &str) -> Result<Vec<JobAttempt>, MockgenError>;

    /// Ids of jobs not yet in a terminal status.
    async fn list_unfinished_job_ids(&self) -> Result<Vec<String>, MockgenError>;

    // --- Users ---

    /// Creates the user or updates tier and credits of an existing one.
    async fn upsert_user(&self, user_id: &str, tier: Tier, credits: i64)
    -> Result<User, MockgenError>;

    async fn get_user(&self, user_id: &str) -> Result<Option<User>, MockgenError>;

    /// Subtracts `amount` from the balance, flooring at zero. Returns the new balance.
    async fn decrement_credits(&self, user_id: &str, amount: i64) -> Result<i64, MockgenError>;

    // --- Resources and live usage ---

    async fn create_resource(&self, resource: NewResource) -> Result<Resource, MockgenError>;

    async fn get_resource(&self, resource_id: &str) -> Result<Option<Resource>, MockgenError>;

    async fn set_resource_live(
        &self,
        resource_id: &str,
        live: bool,
    ) -> Result<Option<Resource>, MockgenError>;

    /// Counts one live-data request against the user's quota for `period`.
    ///
    /// Resets the stored counter when its period differs, checks the
    /// tier limit before incrementing, and fails with
    /// [`MockgenError::QuotaExceeded`] without touching the counter when full.
    async fn admit_usage(
        &self,
        user_id: &str,
        period: &str,
        limits: QuotaLimits,
    ) -> Result<UsageGrant, MockgenError>;

    async fn append_usage_log(&self, entry: UsageLogEntry) -> Result<(), MockgenError>;

    /// Audit entries for one resource, newest first.
    async fn list_usage_log(
        &self,
        resource_id: &str,
        limit: u32,
    ) -> Result<Vec<UsageLogEntry>, MockgenError>;
}
