// SPDX-FileCopyrightText: 2026 Confab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and lifecycle.
//!
//! All writes are serialized through tokio-rusqlite's single background
//! thread. Do NOT create additional Connection instances for writes.

use std::path::Path;

use tokio_rusqlite::Connection;
use tracing::debug;

use confab_core::ConfabError;

/// Handle to the single SQLite connection.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Opens (creating if needed) the database at `path`, applies PRAGMAs,
    /// and runs pending migrations.
    pub async fn open(path: &str, wal_mode: bool) -> Result<Self, ConfabError> {
        if let Some(parent) = Path::new(path).parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| ConfabError::Storage {
                source: Box::new(e),
            })?;
        }

        let conn = Connection::open(path.to_owned())
            .await
            .map_err(|e| ConfabError::Storage {
                source: Box::new(e),
            })?;

        conn.call(move |conn| -> Result<(), ConfabError> {
            if wal_mode {
                conn.pragma_update(None, "journal_mode", "WAL")
                    .map_err(|e| ConfabError::Storage {
                        source: Box::new(e),
                    })?;
            }
            conn.pragma_update(None, "synchronous", "NORMAL")
                .map_err(|e| ConfabError::Storage {
                    source: Box::new(e),
                })?;
            conn.pragma_update(None, "foreign_keys", "ON")
                .map_err(|e| ConfabError::Storage {
                    source: Box::new(e),
                })?;
            crate::migrations::run_migrations(conn)?;
            Ok(())
        })
        .await
        .map_err(|e| ConfabError::Storage {
            source: Box::new(e),
        })?;

        debug!(path = %path, "database opened");
        Ok(Self { conn })
    }

    /// Returns the underlying tokio-rusqlite connection.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Checkpoints the WAL and flushes pending writes.
    pub async fn close(&self) -> Result<(), ConfabError> {
        self.conn
            .call(|conn| {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        debug!("WAL checkpoint complete");
        Ok(())
    }
}

/// Helper to convert tokio_rusqlite errors into ConfabError::Storage.
pub fn map_tr_err(e: tokio_rusqlite::Error) -> ConfabError {
    ConfabError::Storage {
        source: Box::new(e),
    }
}
