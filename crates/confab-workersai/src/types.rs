// SPDX-FileCopyrightText: 2026 Confab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Request and response types for the Cloudflare v4 REST APIs.
//!
//! Both Workers AI and Vectorize wrap results in the same envelope:
//! `{"success": bool, "errors": [{code, message}], "result": ...}`.

use serde::{Deserialize, Serialize};

use confab_core::ChatMessage;
use confab_core::types::IndexMatch;

/// Response envelope shared by all Cloudflare v4 endpoints.
#[derive(Debug, Deserialize)]
pub struct ApiEnvelope<T> {
    pub success: bool,
    #[serde(default)]
    pub errors: Vec<ApiError>,
    pub result: Option<T>,
}

/// One entry of the envelope's `errors` array.
#[derive(Debug, Deserialize)]
pub struct ApiError {
    pub code: i64,
    pub message: String,
}

/// Body for a chat invocation of `POST /ai/run/{model}`.
#[derive(Debug, Serialize)]
pub struct ChatRequest<'a> {
    pub messages: &'a [ChatMessage],
}

/// Result payload of a chat invocation.
///
/// Text models answer in `response`; a few older ones use `output`.
#[derive(Debug, Deserialize)]
pub struct ChatResult {
    #[serde(default)]
    pub response: Option<String>,
    #[serde(default)]
    pub output: Option<String>,
}

impl ChatResult {
    /// The generated text, whichever field carried it.
    pub fn text(self) -> String {
        self.response.or(self.output).unwrap_or_default()
    }
}

/// Body for an embedding invocation of `POST /ai/run/{model}`.
#[derive(Debug, Serialize)]
pub struct EmbeddingRequest<'a> {
    pub text: Vec<&'a str>,
}

/// Result payload of an embedding invocation: one vector per input text.
#[derive(Debug, Deserialize)]
pub struct EmbeddingResult {
    #[serde(default)]
    pub data: Vec<Vec<f32>>,
}

/// Body for `POST /vectorize/v2/indexes/{index}/query`.
#[derive(Debug, Serialize)]
pub struct QueryRequest<'a> {
    pub vector: &'a [f32],
    #[serde(rename = "topK")]
    pub top_k: usize,
    #[serde(rename = "returnMetadata")]
    pub return_metadata: &'static str,
}

/// Result payload of a Vectorize query.
#[derive(Debug, Deserialize)]
pub struct QueryResult {
    #[serde(default)]
    pub matches: Vec<IndexMatch>,
}

/// One NDJSON line of a Vectorize upsert body.
#[derive(Debug, Serialize)]
pub struct UpsertRecord<'a> {
    pub id: &'a str,
    pub values: &'a [f32],
    pub metadata: &'a serde_json::Map<String, serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_result_prefers_response_field() {
        let result = ChatResult {
            response: Some("from response".into()),
            output: Some("from output".into()),
        };
        assert_eq!(result.text(), "from response");
    }

    #[test]
    fn chat_result_falls_back_to_output() {
        let result = ChatResult {
            response: None,
            output: Some("from output".into()),
        };
        assert_eq!(result.text(), "from output");
    }

    #[test]
    fn chat_result_empty_when_neither_present() {
        let result = ChatResult {
            response: None,
            output: None,
        };
        assert_eq!(result.text(), "");
    }

    #[test]
    fn envelope_deserializes_error_body() {
        let json = r#"{"success":false,"errors":[{"code":5007,"message":"No such model"}]}"#;
        let envelope: ApiEnvelope<ChatResult> = serde_json::from_str(json).unwrap();
        assert!(!envelope.success);
        assert_eq!(envelope.errors[0].code, 5007);
        assert!(envelope.result.is_none());
    }

    #[test]
    fn query_request_uses_camel_case_keys() {
        let vector = vec![0.1_f32, 0.2];
        let req = QueryRequest {
            vector: &vector,
            top_k: 5,
            return_metadata: "all",
        };
        let json = serde_json::to_string(&req).unwrap();
        assert!(json.contains(r#""topK":5"#));
        assert!(json.contains(r#""returnMetadata":"all""#));
    }
}
