// SPDX-FileCopyrightText: 2026 Confab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock generation backend for deterministic testing.
//!
//! Outcomes are popped from a FIFO queue; when the queue is empty a
//! configurable fallback outcome applies (default: a "mock reply" success).
//! Every invocation records its model id for ordering assertions.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use confab_core::{ChatMessage, ConfabError, GenerationBackend, GenerationErrorKind};

/// One scripted invocation outcome.
#[derive(Debug, Clone)]
pub enum MockOutcome {
    /// Succeed with this text.
    Reply(String),
    /// Fail as a model-unavailable error (dispatcher falls through).
    Unavailable(String),
    /// Fail as any other error (dispatcher stops).
    Failure(String),
}

impl MockOutcome {
    fn into_result(self) -> Result<String, ConfabError> {
        match self {
            MockOutcome::Reply(text) => Ok(text),
            MockOutcome::Unavailable(message) => Err(ConfabError::Generation {
                kind: GenerationErrorKind::ModelUnavailable,
                message,
            }),
            MockOutcome::Failure(message) => Err(ConfabError::Generation {
                kind: GenerationErrorKind::Other,
                message,
            }),
        }
    }
}

/// A mock generation backend with scripted outcomes.
pub struct MockGeneration {
    outcomes: Mutex<VecDeque<MockOutcome>>,
    fallback: MockOutcome,
    invoked: Mutex<Vec<String>>,
    prompts: Mutex<Vec<Vec<ChatMessage>>>,
}

impl MockGeneration {
    /// Creates a mock whose every invocation succeeds with "mock reply".
    pub fn new() -> Self {
        Self {
            outcomes: Mutex::new(VecDeque::new()),
            fallback: MockOutcome::Reply("mock reply".to_string()),
            invoked: Mutex::new(Vec::new()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Creates a mock pre-loaded with the given reply texts.
    pub fn with_replies(replies: Vec<String>) -> Self {
        let mock = Self::new();
        {
            let mut outcomes = mock.outcomes.lock().unwrap();
            outcomes.extend(replies.into_iter().map(MockOutcome::Reply));
        }
        mock
    }

    /// Creates a mock whose every invocation fails with a non-availability
    /// error carrying `message`.
    pub fn failing_with(message: &str) -> Self {
        Self {
            fallback: MockOutcome::Failure(message.to_string()),
            ..Self::new()
        }
    }

    /// Creates a mock whose every invocation reports the model unavailable.
    pub fn unavailable_with(message: &str) -> Self {
        Self {
            fallback: MockOutcome::Unavailable(message.to_string()),
            ..Self::new()
        }
    }

    /// Queues one scripted outcome.
    pub fn push_outcome(&self, outcome: MockOutcome) {
        self.outcomes.lock().unwrap().push_back(outcome);
    }

    /// Model ids in invocation order.
    pub fn invoked_models(&self) -> Vec<String> {
        self.invoked.lock().unwrap().clone()
    }

    /// The most recent prompt passed to the backend.
    pub fn last_prompt(&self) -> Option<Vec<ChatMessage>> {
        self.prompts.lock().unwrap().last().cloned()
    }
}

impl Default for MockGeneration {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GenerationBackend for MockGeneration {
    async fn invoke(
        &self,
        model: &str,
        messages: &[ChatMessage],
    ) -> Result<String, ConfabError> {
        self.invoked.lock().unwrap().push(model.to_string());
        self.prompts.lock().unwrap().push(messages.to_vec());
        let outcome = self
            .outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone());
        outcome.into_result()
    }
}
