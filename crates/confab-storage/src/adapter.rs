// SPDX-FileCopyrightText: 2026 Confab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the SnapshotStore trait.

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::debug;

use confab_config::model::StorageConfig;
use confab_core::{ConfabError, SnapshotStore, Turn};

use crate::database::Database;
use crate::queries;

/// SQLite-backed snapshot store.
///
/// Wraps a [`Database`] handle and delegates query operations to the typed
/// query module. The database is lazily initialized on the first call to
/// [`initialize`](SqliteSnapshots::initialize).
pub struct SqliteSnapshots {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqliteSnapshots {
    /// Create a new SqliteSnapshots with the given configuration.
    ///
    /// The database connection is not opened until `initialize` is called.
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    /// Opens the database, applies PRAGMAs, and runs migrations.
    pub async fn initialize(&self) -> Result<(), ConfabError> {
        let db = Database::open(&self.config.database_path, self.config.wal_mode).await?;
        self.db.set(db).map_err(|_| ConfabError::Storage {
            source: "storage already initialized".into(),
        })?;
        debug!(path = %self.config.database_path, "SQLite snapshot store initialized");
        Ok(())
    }

    /// Flushes pending writes and checkpoints the WAL.
    pub async fn close(&self) -> Result<(), ConfabError> {
        self.db()?.close().await
    }

    /// Returns a reference to the underlying Database, or an error if not initialized.
    fn db(&self) -> Result<&Database, ConfabError> {
        self.db.get().ok_or_else(|| ConfabError::Storage {
            source: "storage not initialized -- call initialize() first".into(),
        })
    }
}

#[async_trait]
impl SnapshotStore for SqliteSnapshots {
    async fn get(&self, session_id: &str) -> Result<Option<Vec<Turn>>, ConfabError> {
        queries::snapshots::get_snapshot(self.db()?, session_id).await
    }

    async fn put(&self, session_id: &str, turns: &[Turn]) -> Result<(), ConfabError> {
        queries::snapshots::put_snapshot(self.db()?, session_id, turns).await
    }
}
