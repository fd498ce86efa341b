// SPDX-FileCopyrightText: 2026 Confab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! History snapshot get/put operations.
//!
//! A snapshot is the full turn sequence for one session, stored as a JSON
//! array in a single row. Puts overwrite the prior snapshot wholesale; the
//! in-memory ledger is the working copy, so partial updates never happen.

use rusqlite::params;

use confab_core::{ConfabError, Turn};

use crate::database::Database;

/// Read the persisted snapshot for a session. Absence yields `None`.
pub async fn get_snapshot(
    db: &Database,
    session_id: &str,
) -> Result<Option<Vec<Turn>>, ConfabError> {
    let session_id = session_id.to_string();
    let payload: Option<String> = db
        .connection()
        .call(move |conn| {
            let mut stmt =
                conn.prepare("SELECT turns FROM history_snapshots WHERE session_id = ?1")?;
            let mut rows = stmt.query(params![session_id])?;
            match rows.next()? {
                Some(row) => Ok(Some(row.get(0)?)),
                None => Ok(None),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)?;

    match payload {
        Some(json) => {
            let turns = serde_json::from_str(&json).map_err(|e| ConfabError::Storage {
                source: Box::new(e),
            })?;
            Ok(Some(turns))
        }
        None => Ok(None),
    }
}

/// Overwrite the persisted snapshot for a session.
pub async fn put_snapshot(
    db: &Database,
    session_id: &str,
    turns: &[Turn],
) -> Result<(), ConfabError> {
    let session_id = session_id.to_string();
    let payload = serde_json::to_string(turns).map_err(|e| ConfabError::Storage {
        source: Box::new(e),
    })?;

    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO history_snapshots (session_id, turns, updated_at)
                 VALUES (?1, ?2, strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
                 ON CONFLICT(session_id) DO UPDATE SET
                     turns = excluded.turns,
                     updated_at = excluded.updated_at",
                params![session_id, payload],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use confab_core::Role;
    use tempfile::tempdir;

    async fn setup_db() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("snapshots.db");
        let db = Database::open(db_path.to_str().unwrap(), true).await.unwrap();
        (db, dir)
    }

    fn make_turn(role: Role, content: &str, ts: i64) -> Turn {
        Turn {
            role,
            content: content.to_string(),
            ts,
        }
    }

    #[tokio::test]
    async fn get_absent_snapshot_is_none() {
        let (db, _dir) = setup_db().await;
        let result = get_snapshot(&db, "sess-none").await.unwrap();
        assert!(result.is_none());
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn put_and_get_round_trip() {
        let (db, _dir) = setup_db().await;

        let turns = vec![
            make_turn(Role::User, "hello", 1),
            make_turn(Role::Assistant, "hi there", 2),
        ];
        put_snapshot(&db, "sess-1", &turns).await.unwrap();

        let loaded = get_snapshot(&db, "sess-1").await.unwrap().unwrap();
        assert_eq!(loaded, turns);
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn put_overwrites_prior_snapshot() {
        let (db, _dir) = setup_db().await;

        let first = vec![make_turn(Role::User, "one", 1)];
        put_snapshot(&db, "sess-1", &first).await.unwrap();

        let second = vec![
            make_turn(Role::User, "one", 1),
            make_turn(Role::Assistant, "two", 2),
            make_turn(Role::User, "three", 3),
        ];
        put_snapshot(&db, "sess-1", &second).await.unwrap();

        let loaded = get_snapshot(&db, "sess-1").await.unwrap().unwrap();
        assert_eq!(loaded.len(), 3);
        assert_eq!(loaded, second);
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn sessions_are_isolated() {
        let (db, _dir) = setup_db().await;

        put_snapshot(&db, "sess-a", &[make_turn(Role::User, "a", 1)])
            .await
            .unwrap();
        put_snapshot(&db, "sess-b", &[make_turn(Role::User, "b", 1)])
            .await
            .unwrap();

        let a = get_snapshot(&db, "sess-a").await.unwrap().unwrap();
        let b = get_snapshot(&db, "sess-b").await.unwrap().unwrap();
        assert_eq!(a[0].content, "a");
        assert_eq!(b[0].content, "b");
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn empty_turn_list_round_trips() {
        let (db, _dir) = setup_db().await;
        put_snapshot(&db, "sess-empty", &[]).await.unwrap();
        let loaded = get_snapshot(&db, "sess-empty").await.unwrap().unwrap();
        assert!(loaded.is_empty());
        db.close().await.unwrap();
    }
}
