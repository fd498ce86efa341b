// SPDX-FileCopyrightText: 2026 Confab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Durable snapshot store seam for session history.

use async_trait::async_trait;

use crate::error::ConfabError;
use crate::types::Turn;

/// Opaque get/put storage for per-session history snapshots.
///
/// The in-memory ledger is the authoritative working copy during a process
/// lifetime; the store only hydrates it on first contact and receives full
/// snapshots after each append.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Reads the persisted snapshot for a session. Absence is `Ok(None)`,
    /// not an error.
    async fn get(&self, session_id: &str) -> Result<Option<Vec<Turn>>, ConfabError>;

    /// Overwrites the persisted snapshot for a session.
    async fn put(&self, session_id: &str, turns: &[Turn]) -> Result<(), ConfabError>;
}
