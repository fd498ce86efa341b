// SPDX-FileCopyrightText: 2026 Confab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Cloudflare backend adapters for Confab.
//!
//! Implements the confab-core backend traits over two REST surfaces:
//! Workers AI (`/ai/run/{model}`) for chat generation and text embeddings,
//! and Vectorize v2 for nearest-neighbor search and upserts. This is the
//! only crate that knows backend identity; everything above it depends on
//! the trait seams alone.

pub mod client;
pub mod types;
pub mod vectorize;

use async_trait::async_trait;

use confab_core::types::{IndexEntry, IndexMatch};
use confab_core::{ChatMessage, ConfabError, EmbeddingBackend, GenerationBackend, VectorIndex};

pub use client::WorkersAiClient;
pub use vectorize::VectorizeClient;

#[async_trait]
impl GenerationBackend for WorkersAiClient {
    async fn invoke(
        &self,
        model: &str,
        messages: &[ChatMessage],
    ) -> Result<String, ConfabError> {
        self.run_chat(model, messages).await
    }
}

#[async_trait]
impl EmbeddingBackend for WorkersAiClient {
    async fn embed(&self, text: &str) -> Result<Option<Vec<f32>>, ConfabError> {
        self.run_embedding(text).await
    }
}

#[async_trait]
impl VectorIndex for VectorizeClient {
    async fn search(
        &self,
        vector: &[f32],
        top_k: usize,
    ) -> Result<Vec<IndexMatch>, ConfabError> {
        self.query(vector, top_k).await
    }

    async fn upsert(&self, entries: Vec<IndexEntry>) -> Result<(), ConfabError> {
        VectorizeClient::upsert(self, &entries).await
    }
}
