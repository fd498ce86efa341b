// SPDX-FileCopyrightText: 2026 Confab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ordered fallback across generation models.
//!
//! The dispatcher owns the model priority list (injected at construction)
//! and hides backend availability failures from the session agent: an
//! unavailable model falls through to the next one, while any other failure
//! stops iteration and surfaces unchanged.

use std::sync::Arc;

use tracing::{debug, warn};

use confab_core::{ChatMessage, ConfabError, GenerationBackend, GenerationErrorKind};

/// Tries generation models in priority order and returns the first
/// non-empty reply.
pub struct GenerationDispatcher {
    backend: Arc<dyn GenerationBackend>,
    models: Vec<String>,
}

impl GenerationDispatcher {
    /// Creates a dispatcher over the given backend and ordered model list
    /// (highest quality/cost first).
    pub fn new(backend: Arc<dyn GenerationBackend>, models: Vec<String>) -> Self {
        Self { backend, models }
    }

    /// Produces generated text for the prompt.
    ///
    /// Iterates the model list in order. The first invocation returning
    /// non-empty text wins. An unavailable model continues to the next
    /// entry; any other failure stops iteration and is returned as-is.
    /// Exhausting the list fails with the last observed failure.
    pub async fn generate(&self, messages: &[ChatMessage]) -> Result<String, ConfabError> {
        let mut last_error: Option<ConfabError> = None;

        for model in &self.models {
            debug!(model = model.as_str(), "invoking generation backend");
            match self.backend.invoke(model, messages).await {
                Ok(text) if !text.trim().is_empty() => {
                    debug!(model = model.as_str(), chars = text.len(), "generation complete");
                    return Ok(text);
                }
                Ok(_) => {
                    debug!(model = model.as_str(), "empty reply, trying next model");
                }
                Err(e) if e.generation_kind() == Some(GenerationErrorKind::ModelUnavailable) => {
                    warn!(model = model.as_str(), error = %e, "model unavailable, trying next");
                    last_error = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_error.unwrap_or_else(|| ConfabError::Generation {
            kind: GenerationErrorKind::Other,
            message: "no model produced usable text".into(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Backend scripted per model id, recording invocation order.
    #[derive(Default)]
    struct ScriptedBackend {
        outcomes: HashMap<String, Result<String, (GenerationErrorKind, String)>>,
        invoked: Mutex<Vec<String>>,
    }

    impl ScriptedBackend {
        fn with(mut self, model: &str, outcome: Result<&str, (GenerationErrorKind, &str)>) -> Self {
            let outcome = match outcome {
                Ok(text) => Ok(text.to_string()),
                Err((kind, msg)) => Err((kind, msg.to_string())),
            };
            self.outcomes.insert(model.to_string(), outcome);
            self
        }

        fn invoked(&self) -> Vec<String> {
            self.invoked.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl GenerationBackend for ScriptedBackend {
        async fn invoke(
            &self,
            model: &str,
            _messages: &[ChatMessage],
        ) -> Result<String, ConfabError> {
            self.invoked.lock().unwrap().push(model.to_string());
            match self.outcomes.get(model) {
                Some(Ok(text)) => Ok(text.clone()),
                Some(Err((kind, message))) => Err(ConfabError::Generation {
                    kind: *kind,
                    message: message.clone(),
                }),
                None => panic!("unscripted model {model}"),
            }
        }
    }

    fn models(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    fn prompt() -> Vec<ChatMessage> {
        vec![ChatMessage::user("hi")]
    }

    #[tokio::test]
    async fn first_usable_reply_wins() {
        let backend = Arc::new(ScriptedBackend::default().with("a", Ok("from a")));
        let dispatcher = GenerationDispatcher::new(backend.clone(), models(&["a", "b"]));

        let text = dispatcher.generate(&prompt()).await.unwrap();
        assert_eq!(text, "from a");
        assert_eq!(backend.invoked(), vec!["a"]);
    }

    #[tokio::test]
    async fn unavailable_model_falls_through_without_trying_the_rest() {
        let backend = Arc::new(
            ScriptedBackend::default()
                .with("a", Err((GenerationErrorKind::ModelUnavailable, "no such model a")))
                .with("b", Ok("hello")),
        );
        let dispatcher = GenerationDispatcher::new(backend.clone(), models(&["a", "b", "c"]));

        let text = dispatcher.generate(&prompt()).await.unwrap();
        assert_eq!(text, "hello");
        // c is never invoked once b succeeds.
        assert_eq!(backend.invoked(), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn other_failure_stops_iteration() {
        let backend = Arc::new(
            ScriptedBackend::default()
                .with("a", Err((GenerationErrorKind::Other, "upstream exploded")))
                .with("b", Ok("never reached")),
        );
        let dispatcher = GenerationDispatcher::new(backend.clone(), models(&["a", "b"]));

        let err = dispatcher.generate(&prompt()).await.unwrap_err();
        assert_eq!(err.generation_kind(), Some(GenerationErrorKind::Other));
        assert!(err.to_string().contains("upstream exploded"));
        assert_eq!(backend.invoked(), vec!["a"]);
    }

    #[tokio::test]
    async fn empty_reply_tries_next_model() {
        let backend = Arc::new(
            ScriptedBackend::default()
                .with("a", Ok("   "))
                .with("b", Ok("real text")),
        );
        let dispatcher = GenerationDispatcher::new(backend.clone(), models(&["a", "b"]));

        let text = dispatcher.generate(&prompt()).await.unwrap();
        assert_eq!(text, "real text");
        assert_eq!(backend.invoked(), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn exhaustion_carries_last_failure_detail() {
        let backend = Arc::new(
            ScriptedBackend::default()
                .with("a", Err((GenerationErrorKind::ModelUnavailable, "no such model a")))
                .with("b", Err((GenerationErrorKind::ModelUnavailable, "no such model b"))),
        );
        let dispatcher = GenerationDispatcher::new(backend, models(&["a", "b"]));

        let err = dispatcher.generate(&prompt()).await.unwrap_err();
        assert!(err.to_string().contains("no such model b"));
    }

    #[tokio::test]
    async fn all_empty_replies_fail_with_generic_error() {
        let backend = Arc::new(
            ScriptedBackend::default().with("a", Ok("")).with("b", Ok("")),
        );
        let dispatcher = GenerationDispatcher::new(backend, models(&["a", "b"]));

        let err = dispatcher.generate(&prompt()).await.unwrap_err();
        assert!(err.to_string().contains("no model produced usable text"));
    }
}
