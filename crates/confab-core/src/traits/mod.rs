// SPDX-FileCopyrightText: 2026 Confab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Trait seams for the external capabilities the session agent consumes.
//!
//! Everything behind these traits is an opaque collaborator: the agent
//! depends only on the contracts here, never on backend identity.

pub mod embedding;
pub mod generation;
pub mod index;
pub mod store;

pub use embedding::EmbeddingBackend;
pub use generation::GenerationBackend;
pub use index::VectorIndex;
pub use store::SnapshotStore;
