// SPDX-FileCopyrightText: 2026 Confab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Durable, bounded, ordered turn storage for one session.
//!
//! The in-memory sequence is the authoritative working copy. It starts
//! unhydrated; the first operation loads the persisted snapshot (absence
//! means an empty ledger). Every append truncates to the retention bound
//! (oldest turns first) and writes the full sequence back to the store.

use std::sync::Arc;

use tracing::debug;

use confab_core::{ConfabError, Role, SnapshotStore, Turn};

/// Bounded conversation history for one session, persisted as a whole
/// snapshot after each append.
pub struct HistoryLedger {
    session_id: String,
    store: Arc<dyn SnapshotStore>,
    retention: usize,
    /// `None` until hydrated from the store.
    turns: Option<Vec<Turn>>,
}

impl HistoryLedger {
    pub fn new(session_id: String, store: Arc<dyn SnapshotStore>, retention: usize) -> Self {
        Self {
            session_id,
            store,
            retention,
            turns: None,
        }
    }

    /// Loads the persisted snapshot. A no-op when already hydrated, so the
    /// in-memory copy stays authoritative across reconnects.
    pub async fn hydrate(&mut self) -> Result<(), ConfabError> {
        self.hydrated().await?;
        Ok(())
    }

    /// Whether the ledger has loaded (or begun) its in-memory sequence.
    pub fn is_hydrated(&self) -> bool {
        self.turns.is_some()
    }

    /// Number of turns currently held in memory (0 before hydration).
    pub fn len(&self) -> usize {
        self.turns.as_ref().map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Appends a turn, evicts beyond the retention bound (oldest first),
    /// and persists the resulting sequence.
    ///
    /// The timestamp is assigned here and clamped so it never decreases
    /// within the ledger. On a persist failure the turn stays in the
    /// in-memory sequence and the error is returned to the caller.
    pub async fn append(&mut self, role: Role, content: String) -> Result<(), ConfabError> {
        let retention = self.retention;
        let turns = self.hydrated().await?;

        let last_ts = turns.last().map_or(0, |t| t.ts);
        let ts = chrono::Utc::now().timestamp_millis().max(last_ts);
        turns.push(Turn { role, content, ts });

        if turns.len() > retention {
            let excess = turns.len() - retention;
            turns.drain(..excess);
        }

        let snapshot = turns.clone();
        debug!(
            session_id = %self.session_id,
            len = snapshot.len(),
            "persisting history snapshot"
        );
        self.store.put(&self.session_id, &snapshot).await
    }

    /// Returns the last `n` turns (or all, if fewer), in conversation order.
    pub async fn recent(&mut self, n: usize) -> Result<Vec<Turn>, ConfabError> {
        let turns = self.hydrated().await?;
        let start = turns.len().saturating_sub(n);
        Ok(turns[start..].to_vec())
    }

    /// Hydrates on first use and returns the in-memory sequence.
    async fn hydrated(&mut self) -> Result<&mut Vec<Turn>, ConfabError> {
        if self.turns.is_none() {
            let stored = self.store.get(&self.session_id).await?.unwrap_or_default();
            debug!(
                session_id = %self.session_id,
                len = stored.len(),
                "ledger hydrated"
            );
            self.turns = Some(stored);
        }
        match self.turns.as_mut() {
            Some(turns) => Ok(turns),
            None => Err(ConfabError::Internal(
                "ledger hydration left no in-memory sequence".into(),
            )),
        }
    }
}
