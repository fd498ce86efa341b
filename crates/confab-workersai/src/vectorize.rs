// SPDX-FileCopyrightText: 2026 Confab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the Vectorize v2 REST API.
//!
//! Query bodies are JSON; upsert bodies are NDJSON (one record per line),
//! as the v2 endpoints require.

use tracing::debug;

use confab_core::ConfabError;
use confab_core::types::{IndexEntry, IndexMatch};

use crate::client::build_client;
use crate::types::{ApiEnvelope, QueryRequest, QueryResult, UpsertRecord};

/// Base URL for the Cloudflare v4 REST API.
const API_BASE_URL: &str = "https://api.cloudflare.com/client/v4";

/// HTTP client for one Vectorize index.
#[derive(Debug, Clone)]
pub struct VectorizeClient {
    client: reqwest::Client,
    account_id: String,
    index: String,
    base_url: String,
}

impl VectorizeClient {
    /// Creates a new Vectorize client for the named index.
    pub fn new(account_id: String, api_token: &str, index: String) -> Result<Self, ConfabError> {
        let client = build_client(api_token)?;
        Ok(Self {
            client,
            account_id,
            index,
            base_url: API_BASE_URL.to_string(),
        })
    }

    /// Overrides the base URL (for testing with wiremock).
    #[cfg(test)]
    pub fn with_base_url(mut self, url: String) -> Self {
        self.base_url = url;
        self
    }

    fn endpoint(&self, op: &str) -> String {
        format!(
            "{}/accounts/{}/vectorize/v2/indexes/{}/{op}",
            self.base_url, self.account_id, self.index
        )
    }

    /// Returns the `top_k` nearest matches with full metadata.
    pub async fn query(
        &self,
        vector: &[f32],
        top_k: usize,
    ) -> Result<Vec<IndexMatch>, ConfabError> {
        let response = self
            .client
            .post(self.endpoint("query"))
            .json(&QueryRequest {
                vector,
                top_k,
                return_metadata: "all",
            })
            .send()
            .await
            .map_err(|e| ConfabError::Memory {
                message: format!("vector query request failed: {e}"),
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| ConfabError::Memory {
            message: format!("failed to read vector query response: {e}"),
            source: Some(Box::new(e)),
        })?;

        let envelope: ApiEnvelope<QueryResult> =
            serde_json::from_str(&body).map_err(|e| ConfabError::Memory {
                message: format!("vector query returned {status}: {body}"),
                source: Some(Box::new(e)),
            })?;

        if !envelope.success || !status.is_success() {
            return Err(ConfabError::Memory {
                message: format!("vector query error ({status})"),
                source: None,
            });
        }

        let matches = envelope.result.map(|r| r.matches).unwrap_or_default();
        debug!(index = %self.index, count = matches.len(), "vector query complete");
        Ok(matches)
    }

    /// Writes entries keyed by their ids, overwriting prior values.
    pub async fn upsert(&self, entries: &[IndexEntry]) -> Result<(), ConfabError> {
        let mut body = String::new();
        for entry in entries {
            let record = UpsertRecord {
                id: &entry.id,
                values: &entry.vector,
                metadata: &entry.metadata,
            };
            let line = serde_json::to_string(&record).map_err(|e| ConfabError::Memory {
                message: format!("failed to encode upsert record: {e}"),
                source: Some(Box::new(e)),
            })?;
            body.push_str(&line);
            body.push('\n');
        }

        let response = self
            .client
            .post(self.endpoint("upsert"))
            .header("content-type", "application/x-ndjson")
            .body(body)
            .send()
            .await
            .map_err(|e| ConfabError::Memory {
                message: format!("vector upsert request failed: {e}"),
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ConfabError::Memory {
                message: format!("vector upsert error ({status}): {body}"),
                source: None,
            });
        }

        debug!(index = %self.index, count = entries.len(), "vector upsert complete");
        Ok(())
    }
}
