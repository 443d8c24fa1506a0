// SPDX-FileCopyrightText: 2026 Mockgen Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! User rows: tier, credit balance and the live-data usage counter.

use mockgen_core::MockgenError;
use mockgen_core::types::{Tier, UsageCounter, User};
use rusqlite::{OptionalExtension, params};

use super::{NOW_SQL, parsed_column};
use crate::database::{Database, map_tr_err};

pub(crate) fn row_to_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        tier: parsed_column(row, 1)?,
        credits: row.get(2)?,
        usage: UsageCounter {
            count: row.get::<_, i64>(3)?.max(0) as u64,
            period: row.get(4)?,
        },
        created_at: row.get(5)?,
    })
}

pub(crate) fn select_user(conn: &rusqlite::Connection, id: &str) -> rusqlite::Result<Option<User>> {
    conn.query_row(
        "SELECT id, tier, credits, usage_count, usage_period, created_at
         FROM users WHERE id = ?1",
        params![id],
        row_to_user,
    )
    .optional()
}

/// Create the user, or overwrite tier and credits of an existing one.
/// The usage counter of an existing user is preserved.
pub async fn upsert_user(
    db: &Database,
    id: &str,
    tier: Tier,
    credits: i64,
) -> Result<User, MockgenError> {
    let id = id.to_string();
    let user = db
        .connection()
        .call(move |conn| {
            conn.execute(
                &format!(
                    "INSERT INTO users (id, tier, credits) VALUES (?1, ?2, ?3)
                     ON CONFLICT(id) DO UPDATE SET
                         tier = excluded.tier,
                         credits = excluded.credits,
                         updated_at = {NOW_SQL}"
                ),
                params![id, tier.to_string(), credits],
            )?;
            select_user(conn, &id)
        })
        .await
        .map_err(map_tr_err)?;
    user.ok_or_else(|| MockgenError::Internal("upserted user vanished".into()))
}

pub async fn get_user(db: &Database, id: &str) -> Result<Option<User>, MockgenError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| select_user(conn, &id))
        .await
        .map_err(map_tr_err)
}

/// Subtract `amount` credits, flooring at zero, in a single statement.
/// Returns the new balance.
pub async fn decrement_credits(db: &Database, id: &str, amount: i64) -> Result<i64, MockgenError> {
    let id = id.to_string();
    let lookup_id = id.clone();
    let balance = db
        .connection()
        .call(move |conn| {
            conn.query_row(
                &format!(
                    "UPDATE users SET credits = MAX(credits - ?2, 0), updated_at = {NOW_SQL}
                     WHERE id = ?1
                     RETURNING credits"
                ),
                params![id, amount],
                |row| row.get::<_, i64>(0),
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)?;
    balance.ok_or(MockgenError::NotFound {
        entity: "user",
        id: lookup_id,
    })
}
