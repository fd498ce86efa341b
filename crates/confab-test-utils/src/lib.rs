// SPDX-FileCopyrightText: 2026 Confab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Confab integration tests.
//!
//! Provides mock backends and a test harness for fast, deterministic,
//! CI-runnable tests without external services.
//!
//! # Components
//!
//! - [`MockGeneration`] - Generation backend with scripted outcomes
//! - [`MockEmbedding`] / [`MockVectorIndex`] - Memory backends with
//!   captured upserts and scripted matches
//! - [`MemorySnapshotStore`] - In-memory snapshot store with a failure switch
//! - [`TestHarness`] - A full session agent wired over the mocks

pub mod harness;
pub mod mock_generation;
pub mod mock_memory;
pub mod mock_store;

pub use harness::TestHarness;
pub use mock_generation::{MockGeneration, MockOutcome};
pub use mock_memory::{MockEmbedding, MockVectorIndex};
pub use mock_store::MemorySnapshotStore;
