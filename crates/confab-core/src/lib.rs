// SPDX-FileCopyrightText: 2026 Confab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Confab session agent.
//!
//! This crate provides the trait seams, error types, and common types used
//! throughout the Confab workspace. Backend adapters implement the traits
//! defined here; the session agent consumes only these contracts.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::{ConfabError, GenerationErrorKind};
pub use types::{ChatMessage, ChatRole, ClientEvent, Role, ServerEvent, Turn};

// Re-export all backend traits at crate root.
pub use traits::{EmbeddingBackend, GenerationBackend, SnapshotStore, VectorIndex};
