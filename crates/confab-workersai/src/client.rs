// SPDX-FileCopyrightText: 2026 Confab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the Workers AI inference API.
//!
//! Provides [`WorkersAiClient`] which handles request construction,
//! authentication, and classification of model-availability failures so the
//! dispatcher can fall through its model priority list.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue};
use tracing::debug;

use confab_core::{ChatMessage, ConfabError, GenerationErrorKind};

use crate::types::{ApiEnvelope, ApiError, ChatRequest, ChatResult, EmbeddingRequest, EmbeddingResult};

/// Base URL for the Cloudflare v4 REST API.
const API_BASE_URL: &str = "https://api.cloudflare.com/client/v4";

/// Workers AI error code for an unknown or unsupported model id.
const CODE_NO_SUCH_MODEL: i64 = 5007;

/// Request-level timeout applied to every backend call. A hung upstream
/// call fails its own turn after this bound instead of hanging forever.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// HTTP client for Workers AI chat and embedding invocations.
#[derive(Debug, Clone)]
pub struct WorkersAiClient {
    client: reqwest::Client,
    account_id: String,
    embedding_model: String,
    base_url: String,
}

impl WorkersAiClient {
    /// Creates a new Workers AI client.
    ///
    /// # Arguments
    /// * `account_id` - Cloudflare account id the models run under
    /// * `api_token` - API token with Workers AI permissions
    /// * `embedding_model` - Model id used for embedding invocations
    pub fn new(
        account_id: String,
        api_token: &str,
        embedding_model: String,
    ) -> Result<Self, ConfabError> {
        let client = build_client(api_token)?;
        Ok(Self {
            client,
            account_id,
            embedding_model,
            base_url: API_BASE_URL.to_string(),
        })
    }

    /// Overrides the base URL (for testing with wiremock).
    #[cfg(test)]
    pub fn with_base_url(mut self, url: String) -> Self {
        self.base_url = url;
        self
    }

    /// Runs a chat model over the given messages and returns the generated
    /// text (possibly empty).
    ///
    /// Unknown-model failures are classified as
    /// [`GenerationErrorKind::ModelUnavailable`]; everything else as
    /// [`GenerationErrorKind::Other`].
    pub async fn run_chat(
        &self,
        model: &str,
        messages: &[ChatMessage],
    ) -> Result<String, ConfabError> {
        let url = format!(
            "{}/accounts/{}/ai/run/{}",
            self.base_url, self.account_id, model
        );

        let response = self
            .client
            .post(&url)
            .json(&ChatRequest { messages })
            .send()
            .await
            .map_err(|e| ConfabError::Generation {
                kind: GenerationErrorKind::Other,
                message: format!("HTTP request failed: {e}"),
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| ConfabError::Generation {
            kind: GenerationErrorKind::Other,
            message: format!("failed to read response body: {e}"),
        })?;

        debug!(model, status = %status, "chat response received");

        let envelope: ApiEnvelope<ChatResult> = match serde_json::from_str(&body) {
            Ok(env) => env,
            Err(_) => {
                return Err(ConfabError::Generation {
                    kind: GenerationErrorKind::Other,
                    message: format!("API returned {status}: {body}"),
                });
            }
        };

        if !envelope.success || !status.is_success() {
            return Err(chat_error(model, status, &envelope.errors));
        }

        Ok(envelope.result.map(ChatResult::text).unwrap_or_default())
    }

    /// Embeds one text and returns its vector, or `None` if the model
    /// produced no data.
    pub async fn run_embedding(&self, text: &str) -> Result<Option<Vec<f32>>, ConfabError> {
        let url = format!(
            "{}/accounts/{}/ai/run/{}",
            self.base_url, self.account_id, self.embedding_model
        );

        let response = self
            .client
            .post(&url)
            .json(&EmbeddingRequest { text: vec![text] })
            .send()
            .await
            .map_err(|e| ConfabError::Memory {
                message: format!("embedding request failed: {e}"),
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| ConfabError::Memory {
            message: format!("failed to read embedding response: {e}"),
            source: Some(Box::new(e)),
        })?;

        let envelope: ApiEnvelope<EmbeddingResult> =
            serde_json::from_str(&body).map_err(|e| ConfabError::Memory {
                message: format!("embedding API returned {status}: {body}"),
                source: Some(Box::new(e)),
            })?;

        if !envelope.success || !status.is_success() {
            return Err(ConfabError::Memory {
                message: format!(
                    "embedding API error ({status}): {}",
                    format_errors(&envelope.errors)
                ),
                source: None,
            });
        }

        let vector = envelope
            .result
            .and_then(|r| r.data.into_iter().next())
            .filter(|v| !v.is_empty());
        Ok(vector)
    }
}

/// Builds the shared reqwest client with bearer auth and the request timeout.
pub(crate) fn build_client(api_token: &str) -> Result<reqwest::Client, ConfabError> {
    let mut headers = HeaderMap::new();
    let bearer = format!("Bearer {api_token}");
    headers.insert(
        "authorization",
        HeaderValue::from_str(&bearer)
            .map_err(|e| ConfabError::Config(format!("invalid API token header value: {e}")))?,
    );
    headers.insert("content-type", HeaderValue::from_static("application/json"));

    reqwest::Client::builder()
        .default_headers(headers)
        .timeout(REQUEST_TIMEOUT)
        .build()
        .map_err(|e| ConfabError::Config(format!("failed to build HTTP client: {e}")))
}

/// Classifies a failed chat invocation from the envelope's error list.
fn chat_error(model: &str, status: reqwest::StatusCode, errors: &[ApiError]) -> ConfabError {
    let unavailable = errors.iter().any(|e| {
        e.code == CODE_NO_SUCH_MODEL || e.message.to_lowercase().contains("no such model")
    });
    let kind = if unavailable {
        GenerationErrorKind::ModelUnavailable
    } else {
        GenerationErrorKind::Other
    };
    ConfabError::Generation {
        kind,
        message: format!(
            "Workers AI error for {model} ({status}): {}",
            format_errors(errors)
        ),
    }
}

/// Joins envelope errors into one readable string.
fn format_errors(errors: &[ApiError]) -> String {
    if errors.is_empty() {
        return "no error detail".to_string();
    }
    errors
        .iter()
        .map(|e| format!("{} (code {})", e.message, e.code))
        .collect::<Vec<_>>()
        .join("; ")
}
