// SPDX-FileCopyrightText: 2026 Confab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence layer for Confab session history.
//!
//! Provides WAL-mode SQLite storage with embedded migrations, a single-writer
//! concurrency model via `tokio-rusqlite`, and the [`SnapshotStore`]
//! implementation the session ledger persists through.
//!
//! [`SnapshotStore`]: confab_core::SnapshotStore

pub mod adapter;
pub mod database;
pub mod migrations;
pub mod queries;
pub mod writer;

pub use adapter::SqliteSnapshots;
pub use database::Database;
