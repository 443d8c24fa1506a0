// SPDX-FileCopyrightText: 2026 Mockgen Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Published result sets and their live flag.

use mockgen_core::MockgenError;
use mockgen_core::types::{NewResource, Resource};
use rusqlite::{OptionalExtension, params};

use super::{NOW_SQL, json_column};
use crate::database::{Database, map_tr_err};

fn row_to_resource(row: &rusqlite::Row<'_>) -> rusqlite::Result<Resource> {
    Ok(Resource {
        id: row.get(0)?,
        user_id: row.get(1)?,
        project_id: row.get(2)?,
        name: row.get(3)?,
        data: json_column(row, 4)?.unwrap_or(serde_json::Value::Null),
        live: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

fn select_resource(conn: &rusqlite::Connection, id: &str) -> rusqlite::Result<Option<Resource>> {
    conn.query_row(
        "SELECT id, user_id, project_id, name, data, live, created_at, updated_at
         FROM resources WHERE id = ?1",
        params![id],
        row_to_resource,
    )
    .optional()
}

pub async fn create_resource(db: &Database, resource: NewResource) -> Result<Resource, MockgenError> {
    let data = serde_json::to_string(&resource.data).map_err(MockgenError::storage)?;
    let created = db
        .connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO resources (id, user_id, project_id, name, data, live)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    resource.id,
                    resource.user_id,
                    resource.project_id,
                    resource.name,
                    data,
                    resource.live,
                ],
            )?;
            select_resource(conn, &resource.id)
        })
        .await
        .map_err(map_tr_err)?;
    created.ok_or_else(|| MockgenError::Internal("inserted resource vanished".into()))
}

pub async fn get_resource(db: &Database, id: &str) -> Result<Option<Resource>, MockgenError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| select_resource(conn, &id))
        .await
        .map_err(map_tr_err)
}

/// Toggle public visibility. `None` when the resource does not exist.
pub async fn set_resource_live(
    db: &Database,
    id: &str,
    live: bool,
) -> Result<Option<Resource>, MockgenError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            let changed = conn.execute(
                &format!("UPDATE resources SET live = ?2, updated_at = {NOW_SQL} WHERE id = ?1"),
                params![id, live],
            )?;
            if changed == 0 {
                return Ok(None);
            }
            select_resource(conn, &id)
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    #[tokio::test]
    async fn create_get_and_toggle_live() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("resources.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();

        let created = create_resource(
            &db,
            NewResource {
                id: "r1".into(),
                user_id: "u1".into(),
                project_id: "p1".into(),
                name: "fruits".into(),
                data: json!([{"id": 1, "name": "apple"}]),
                live: false,
            },
        )
        .await
        .unwrap();
        assert!(!created.live);
        assert_eq!(created.data[0]["name"], "apple");

        let live = set_resource_live(&db, "r1", true).await.unwrap().unwrap();
        assert!(live.live);
        assert!(get_resource(&db, "r1").await.unwrap().unwrap().live);

        assert!(set_resource_live(&db, "missing", true).await.unwrap().is_none());
        assert!(get_resource(&db, "missing").await.unwrap().is_none());
    }
}
