// SPDX-FileCopyrightText: 2026 Mockgen Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Live-data quota admission and the request audit log.

use mockgen_core::MockgenError;
use mockgen_core::types::{QuotaLimits, UsageGrant, UsageLogEntry};
use rusqlite::{TransactionBehavior, params};

use super::NOW_SQL;
use super::users::select_user;
use crate::database::{Database, map_tr_err};

/// Admit one live-data request for `user_id` in `period`.
///
/// Read, lazy period reset, limit check and increment happen in one
/// IMMEDIATE transaction, so concurrent requests never lose an increment.
/// A rejected request leaves the counter untouched.
pub async fn admit_usage(
    db: &Database,
    user_id: &str,
    period: &str,
    limits: QuotaLimits,
) -> Result<UsageGrant, MockgenError> {
    let user_id = user_id.to_string();
    let period = period.to_string();
    db.connection()
        .call(move |conn| -> Result<Result<UsageGrant, MockgenError>, rusqlite::Error> {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            let Some(user) = select_user(&tx, &user_id)? else {
                return Ok(Err(MockgenError::NotFound {
                    entity: "user",
                    id: user_id,
                }));
            };

            let limit = limits.for_tier(user.tier);
            let next = match user.usage.admit(&period, limit) {
                Ok(next) => next,
                Err(rejected) => return Ok(Err(rejected)),
            };

            tx.execute(
                &format!(
                    "UPDATE users SET usage_count = ?2, usage_period = ?3, updated_at = {NOW_SQL}
                     WHERE id = ?1"
                ),
                params![user_id, next.count as i64, next.period],
            )?;
            tx.commit()?;
            Ok(Ok(UsageGrant {
                limit,
                used: next.count,
            }))
        })
        .await
        .map_err(map_tr_err)?
}

/// Record one request. `created_at` is assigned by the database.
pub async fn append_usage_log(db: &Database, entry: UsageLogEntry) -> Result<(), MockgenError> {
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO usage_log (resource_id, user_id, ip, user_agent, status)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    entry.resource_id,
                    entry.user_id,
                    entry.ip,
                    entry.user_agent,
                    entry.status,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Audit entries for one resource, newest first.
pub async fn list_usage_log(
    db: &Database,
    resource_id: &str,
    limit: u32,
) -> Result<Vec<UsageLogEntry>, MockgenError> {
    let resource_id = resource_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT resource_id, user_id, ip, user_agent, status, created_at
                 FROM usage_log WHERE resource_id = ?1
                 ORDER BY id DESC LIMIT ?2",
            )?;
            let rows = stmt.query_map(params![resource_id, limit], |row| {
                Ok(UsageLogEntry {
                    resource_id: row.get(0)?,
                    user_id: row.get(1)?,
                    ip: row.get(2)?,
                    user_agent: row.get(3)?,
                    status: row.get(4)?,
                    created_at: row.get(5)?,
                })
            })?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}
