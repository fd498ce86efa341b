// SPDX-FileCopyrightText: 2026 Confab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory snapshot store for tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;

use confab_core::{ConfabError, SnapshotStore, Turn};

/// HashMap-backed [`SnapshotStore`] with a failure switch for exercising
/// persist-error paths.
#[derive(Default)]
pub struct MemorySnapshotStore {
    snapshots: Mutex<HashMap<String, Vec<Turn>>>,
    fail_puts: AtomicBool,
}

impl MemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Direct read of a persisted snapshot for assertions.
    pub fn snapshot(&self, session_id: &str) -> Option<Vec<Turn>> {
        self.snapshots.lock().unwrap().get(session_id).cloned()
    }

    /// Pre-populates a persisted snapshot.
    pub fn seed(&self, session_id: &str, turns: Vec<Turn>) {
        self.snapshots
            .lock()
            .unwrap()
            .insert(session_id.to_string(), turns);
    }

    /// Makes every subsequent `put` fail.
    pub fn fail_puts(&self, fail: bool) {
        self.fail_puts.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl SnapshotStore for MemorySnapshotStore {
    async fn get(&self, session_id: &str) -> Result<Option<Vec<Turn>>, ConfabError> {
        Ok(self.snapshot(session_id))
    }

    async fn put(&self, session_id: &str, turns: &[Turn]) -> Result<(), ConfabError> {
        if self.fail_puts.load(Ordering::SeqCst) {
            return Err(ConfabError::Storage {
                source: "simulated put failure".into(),
            });
        }
        self.seed(session_id, turns.to_vec());
        Ok(())
    }
}
