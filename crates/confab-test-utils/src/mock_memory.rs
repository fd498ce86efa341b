// SPDX-FileCopyrightText: 2026 Confab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock embedding backend and vector index for tests.

use std::sync::Mutex;

use async_trait::async_trait;

use confab_core::types::{IndexEntry, IndexMatch};
use confab_core::{ConfabError, EmbeddingBackend, VectorIndex};

/// Embedding backend returning one fixed vector (or nothing).
pub struct MockEmbedding {
    vector: Option<Vec<f32>>,
}

impl MockEmbedding {
    /// Embeds every text to the same small vector.
    pub fn fixed() -> Self {
        Self {
            vector: Some(vec![0.1, 0.2, 0.3, 0.4]),
        }
    }

    /// Produces no vector for any text.
    pub fn empty() -> Self {
        Self { vector: None }
    }
}

#[async_trait]
impl EmbeddingBackend for MockEmbedding {
    async fn embed(&self, _text: &str) -> Result<Option<Vec<f32>>, ConfabError> {
        Ok(self.vector.clone())
    }
}

/// Vector index with scripted matches and captured upserts.
#[derive(Default)]
pub struct MockVectorIndex {
    matches: Mutex<Vec<IndexMatch>>,
    upserts: Mutex<Vec<IndexEntry>>,
}

impl MockVectorIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scripts the matches every search returns, each carrying its text
    /// under the `content` metadata key.
    pub fn with_content_matches(texts: &[&str]) -> Self {
        let matches = texts
            .iter()
            .enumerate()
            .map(|(i, text)| {
                let mut metadata = serde_json::Map::new();
                metadata.insert(
                    "content".into(),
                    serde_json::Value::String((*text).to_string()),
                );
                IndexMatch {
                    id: format!("match-{i}"),
                    score: 0.9,
                    metadata,
                }
            })
            .collect();
        Self {
            matches: Mutex::new(matches),
            upserts: Mutex::new(Vec::new()),
        }
    }

    /// Entries captured from upsert calls, in arrival order.
    pub fn upserts(&self) -> Vec<IndexEntry> {
        self.upserts.lock().unwrap().clone()
    }
}

#[async_trait]
impl VectorIndex for MockVectorIndex {
    async fn search(
        &self,
        _vector: &[f32],
        top_k: usize,
    ) -> Result<Vec<IndexMatch>, ConfabError> {
        let matches = self.matches.lock().unwrap();
        Ok(matches.iter().take(top_k).cloned().collect())
    }

    async fn upsert(&self, entries: Vec<IndexEntry>) -> Result<(), ConfabError> {
        self.upserts.lock().unwrap().extend(entries);
        Ok(())
    }
}
