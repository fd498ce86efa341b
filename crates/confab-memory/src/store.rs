// SPDX-FileCopyrightText: 2026 Confab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The memory store adapter: retrieval-augmented context and exchange
//! recording over the embedding and vector-index seams.

use std::sync::Arc;

use tracing::{debug, warn};

use confab_core::types::{IndexEntry, IndexMatch};
use confab_core::{ConfabError, EmbeddingBackend, VectorIndex};

/// Best-effort semantic memory over an embedding backend and a vector index.
///
/// The index is shared across all sessions and append-only; entries are
/// never deleted or expired. When no index is configured, retrieval yields
/// empty context and recording is a no-op.
pub struct MemoryStore {
    embedder: Arc<dyn EmbeddingBackend>,
    index: Option<Arc<dyn VectorIndex>>,
    top_k: usize,
}

impl MemoryStore {
    /// Creates a new memory store. `index: None` disables both operations.
    pub fn new(
        embedder: Arc<dyn EmbeddingBackend>,
        index: Option<Arc<dyn VectorIndex>>,
        top_k: usize,
    ) -> Self {
        Self {
            embedder,
            index,
            top_k,
        }
    }

    /// Retrieves memory context for a query.
    ///
    /// Returns the stored text of the nearest matches joined by newlines,
    /// or an empty string when no index is configured, the query embeds to
    /// nothing, nothing matches, or any step fails. Failures are logged,
    /// never propagated.
    pub async fn retrieve(&self, query: &str) -> String {
        match self.try_retrieve(query).await {
            Ok(context) => context,
            Err(e) => {
                warn!(error = %e, "memory retrieval failed, continuing without context");
                String::new()
            }
        }
    }

    async fn try_retrieve(&self, query: &str) -> Result<String, ConfabError> {
        let Some(index) = &self.index else {
            return Ok(String::new());
        };

        let Some(vector) = self.embedder.embed(query).await? else {
            return Ok(String::new());
        };

        let matches = index.search(&vector, self.top_k).await?;
        debug!(count = matches.len(), "memory matches retrieved");

        let parts: Vec<&str> = matches.iter().filter_map(match_text).collect();
        Ok(parts.join("\n"))
    }

    /// Records one completed exchange as a memory document.
    ///
    /// Performs nothing when no index is configured or the document embeds
    /// to nothing. Failures are logged, never propagated, and there is no
    /// observable return value.
    pub async fn record(&self, user: &str, assistant: &str) {
        if let Err(e) = self.try_record(user, assistant).await {
            warn!(error = %e, "memory recording failed (non-fatal)");
        }
    }

    async fn try_record(&self, user: &str, assistant: &str) -> Result<(), ConfabError> {
        let Some(index) = &self.index else {
            return Ok(());
        };

        let document = format!("User: {user}\nAssistant: {assistant}");
        let id = uuid::Uuid::new_v4().to_string();

        let Some(vector) = self.embedder.embed(&document).await? else {
            return Ok(());
        };

        let mut metadata = serde_json::Map::new();
        metadata.insert("id".into(), serde_json::Value::String(id.clone()));
        metadata.insert("content".into(), serde_json::Value::String(document));

        index
            .upsert(vec![IndexEntry {
                id,
                vector,
                metadata,
            }])
            .await
    }
}

/// The stored text of a match: `content` metadata first, then `text`.
/// Matches carrying neither contribute nothing.
fn match_text(m: &IndexMatch) -> Option<&str> {
    m.metadata
        .get("content")
        .and_then(|v| v.as_str())
        .or_else(|| m.metadata.get("text").and_then(|v| v.as_str()))
        .filter(|s| !s.is_empty())
}
