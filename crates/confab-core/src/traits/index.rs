// SPDX-FileCopyrightText: 2026 Confab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Vector index seam: nearest-neighbor search and append-only upserts.

use async_trait::async_trait;

use crate::error::ConfabError;
use crate::types::{IndexEntry, IndexMatch};

/// A shared, unpartitioned vector index.
///
/// Entries are never mutated after upsert, so concurrent calls from
/// different sessions commute without coordination.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Returns the `top_k` nearest matches with full metadata.
    async fn search(
        &self,
        vector: &[f32],
        top_k: usize,
    ) -> Result<Vec<IndexMatch>, ConfabError>;

    /// Writes entries keyed by their ids, overwriting any prior values.
    async fn upsert(&self, entries: Vec<IndexEntry>) -> Result<(), ConfabError>;
}
