// SPDX-FileCopyrightText: 2026 Confab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Embedding backend seam for semantic memory.

use async_trait::async_trait;

use crate::error::ConfabError;

/// A text-embedding capability.
#[async_trait]
pub trait EmbeddingBackend: Send + Sync {
    /// Embeds the given text. `Ok(None)` means the backend produced no
    /// vector, which callers treat the same as an empty result.
    async fn embed(&self, text: &str) -> Result<Option<Vec<f32>>, ConfabError>;
}
