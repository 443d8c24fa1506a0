// SPDX-FileCopyrightText: 2026 Mockgen Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Job records and their forward-only status transitions.

use mockgen_core::types::{
    FieldSpec, Job, JobAttempt, JobMetadata, JobStatus, JobStatusUpdate, NewJob,
};
use mockgen_core::MockgenError;
use rusqlite::{OptionalExtension, TransactionBehavior, params};

use super::{NOW_SQL, json_column, parsed_column};
use crate::database::{Database, map_tr_err};

const JOB_COLUMNS: &str = "id, user_id, project_id, prompt, objects_count, status, result,
    error, error_code, created_at, completed_at, processing_time_ms, attempts,
    model, resource_type, schema_json";

fn row_to_job(row: &rusqlite::Row<'_>) -> rusqlite::Result<Job> {
    let schema: Option<Vec<FieldSpec>> = json_column(row, 15)?;
    Ok(Job {
        id: row.get(0)?,
        user_id: row.get(1)?,
        project_id: row.get(2)?,
        prompt: row.get(3)?,
        objects_count: row.get(4)?,
        status: parsed_column(row, 5)?,
        result: json_column(row, 6)?,
        error: row.get(7)?,
        error_code: row.get(8)?,
        created_at: row.get(9)?,
        completed_at: row.get(10)?,
        processing_time_ms: row.get::<_, Option<i64>>(11)?.map(|ms| ms.max(0) as u64),
        attempts: row.get(12)?,
        metadata: JobMetadata {
            model: row.get(13)?,
            resource_type: row.get(14)?,
            schema,
        },
    })
}

fn select_job(conn: &rusqlite::Connection, id: &str) -> rusqlite::Result<Option<Job>> {
    conn.query_row(
        &format!("SELECT {JOB_COLUMNS} FROM jobs WHERE id = ?1"),
        params![id],
        row_to_job,
    )
    .optional()
}

/// Insert a job in `queued` state.
pub async fn create_job(db: &Database, job: NewJob) -> Result<Job, MockgenError> {
    let schema_json = job
        .metadata
        .schema
        .as_ref()
        .map(serde_json::to_string)
        .transpose()
        .map_err(MockgenError::storage)?;

    let inserted = db
        .connection()
        .call(move |conn| -> Result<Option<Job>, rusqlite::Error> {
            conn.execute(
                "INSERT INTO jobs (id, user_id, project_id, prompt, objects_count,
                                   model, resource_type, schema_json)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    job.id,
                    job.user_id,
                    job.project_id,
                    job.prompt,
                    job.objects_count,
                    job.metadata.model,
                    job.metadata.resource_type,
                    schema_json,
                ],
            )?;
            select_job(conn, &job.id)
        })
        .await
        .map_err(map_tr_err)?;

    inserted.ok_or_else(|| MockgenError::Internal("inserted job vanished".into()))
}

pub async fn get_job(db: &Database, id: &str) -> Result<Option<Job>, MockgenError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| select_job(conn, &id))
        .await
        .map_err(map_tr_err)
}

/// Most recently created job for one user's project.
pub async fn latest_job_for_project(
    db: &Database,
    user_id: &str,
    project_id: &str,
) -> Result<Option<Job>, MockgenError> {
    let user_id = user_id.to_string();
    let project_id = project_id.to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!(
                    "SELECT {JOB_COLUMNS} FROM jobs
                     WHERE user_id = ?1 AND project_id = ?2
                     ORDER BY created_at DESC, rowid DESC
                     LIMIT 1"
                ),
                params![user_id, project_id],
                row_to_job,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// Apply a status transition inside one IMMEDIATE transaction.
///
/// Entering `processing` increments `attempts` and clears the previous
/// outcome. Terminal statuses stamp `completed_at` and append an attempt row.
pub async fn update_job_status(
    db: &Database,
    id: &str,
    update: JobStatusUpdate,
) -> Result<Job, MockgenError> {
    let result_json = update
        .result
        .as_ref()
        .map(serde_json::to_string)
        .transpose()
        .map_err(MockgenError::storage)?;
    let item_count = update
        .result
        .as_ref()
        .map(|r| i64::try_from(r.len()).unwrap_or(i64::MAX));
    let processing_time_ms = update
        .processing_time_ms
        .map(|ms| i64::try_from(ms).unwrap_or(i64::MAX));
    let id = id.to_string();

    db.connection()
        .call(move |conn| -> Result<Result<Job, MockgenError>, rusqlite::Error> {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

            let current: Option<String> = tx
                .query_row(
                    "SELECT status FROM jobs WHERE id = ?1",
                    params![id],
                    |row| row.get(0),
                )
                .optional()?;
            let Some(current) = current else {
                return Ok(Err(MockgenError::NotFound { entity: "job", id }));
            };
            let from: JobStatus = current.parse().map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
            })?;
            let to = update.status;
            if !from.can_transition_to(to) {
                return Ok(Err(MockgenError::InvalidTransition { job_id: id, from, to }));
            }

            if to.is_terminal() {
                tx.execute(
                    &format!(
                        "UPDATE jobs SET status = ?2, result = ?3, error = ?4, error_code = ?5,
                                processing_time_ms = ?6, model = COALESCE(?7, model),
                                completed_at = {NOW_SQL}
                         WHERE id = ?1"
                    ),
                    params![
                        id,
                        to.to_string(),
                        result_json,
                        update.error,
                        update.error_code,
                        processing_time_ms,
                        update.provider,
                    ],
                )?;
                tx.execute(
                    "INSERT INTO job_attempts (job_id, attempt, status, error, error_code,
                                               item_count, provider, processing_time_ms)
                     SELECT id, attempts, status, error, error_code, ?2, ?3, processing_time_ms
                     FROM jobs WHERE id = ?1",
                    params![id, item_count, update.provider],
                )?;
            } else {
                tx.execute(
                    "UPDATE jobs SET status = ?2, attempts = attempts + 1, result = NULL,
                            error = NULL, error_code = NULL, completed_at = NULL,
                            processing_time_ms = NULL
                     WHERE id = ?1",
                    params![id, to.to_string()],
                )?;
            }

            let job = select_job(&tx, &id)?;
            tx.commit()?;
            Ok(job.ok_or(MockgenError::NotFound { entity: "job", id }))
        })
        .await
        .map_err(map_tr_err)?
}

/// Delete terminal jobs created before `cutoff`. Attempt history cascades.
pub async fn delete_terminal_jobs_before(db: &Database, cutoff: &str) -> Result<u64, MockgenError> {
    let cutoff = cutoff.to_string();
    db.connection()
        .call(move |conn| {
            let deleted = conn.execute(
                "DELETE FROM jobs
                 WHERE status IN ('completed', 'failed') AND created_at < ?1",
                params![cutoff],
            )?;
            Ok(deleted as u64)
        })
        .await
        .map_err(map_tr_err)
}

/// Ids of jobs still `queued` or `processing`, oldest first.
pub async fn list_unfinished_job_ids(db: &Database) -> Result<Vec<String>, MockgenError> {
    db.connection()
        .call(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id FROM jobs WHERE status IN ('queued', 'processing')
                 ORDER BY created_at ASC, rowid ASC",
            )?;
            let rows = stmt.query_map([], |row| row.get(0))?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

pub async fn list_job_attempts(db: &Database, job_id: &str) -> Result<Vec<JobAttempt>, MockgenError> {
    let job_id = job_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT job_id, attempt, status, error, error_code, item_count, provider,
                        processing_time_ms, finished_at
                 FROM job_attempts WHERE job_id = ?1 ORDER BY id ASC",
            )?;
            let rows = stmt.query_map(params![job_id], |row| {
                Ok(JobAttempt {
                    job_id: row.get(0)?,
                    attempt: row.get(1)?,
                    status: parsed_column(row, 2)?,
                    error: row.get(3)?,
                    error_code: row.get(4)?,
                    item_count: row.get(5)?,
                    provider: row.get(6)?,
                    processing_time_ms: row.get::<_, Option<i64>>(7)?.map(|ms| ms.max(0) as u64),
                    finished_at: row.get(8)?,
                })
            })?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}
