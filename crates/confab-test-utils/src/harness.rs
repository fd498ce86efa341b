// SPDX-FileCopyrightText: 2026 Confab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end session testing.
//!
//! `TestHarness` wires a complete session agent over mock backends and an
//! in-memory snapshot store, then drives it frame-in/event-out the same
//! way the gateway does.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use confab_agent::{
    AgentCommand, GenerationDispatcher, HistoryLedger, SessionAgent, SessionSettings,
};
use confab_core::ServerEvent;
use confab_memory::MemoryStore;

use crate::mock_generation::MockGeneration;
use crate::mock_memory::{MockEmbedding, MockVectorIndex};
use crate::mock_store::MemorySnapshotStore;

/// How long `next_event` waits before giving up.
const EVENT_TIMEOUT: Duration = Duration::from_secs(2);

/// Builder for creating test sessions with configurable mocks.
pub struct TestHarnessBuilder {
    session_id: String,
    generation: Option<MockGeneration>,
    index: Option<MockVectorIndex>,
    embedding: Option<MockEmbedding>,
    models: Vec<String>,
    history_retention: usize,
    settings: SessionSettings,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            session_id: "test-session".to_string(),
            generation: None,
            index: None,
            embedding: None,
            models: vec!["mock-model".to_string()],
            history_retention: 50,
            settings: SessionSettings::default(),
        }
    }

    /// Set the session id the agent runs under.
    pub fn with_session_id(mut self, session_id: &str) -> Self {
        self.session_id = session_id.to_string();
        self
    }

    /// Pre-load generation replies, returned in order.
    pub fn with_replies(mut self, replies: Vec<String>) -> Self {
        self.generation = Some(MockGeneration::with_replies(replies));
        self
    }

    /// Use a fully scripted generation backend.
    pub fn with_generation(mut self, generation: MockGeneration) -> Self {
        self.generation = Some(generation);
        self
    }

    /// Attach a vector index (memory retrieval/recording enabled).
    pub fn with_index(mut self, index: MockVectorIndex) -> Self {
        self.index = Some(index);
        self
    }

    /// Override the embedding backend.
    pub fn with_embedding(mut self, embedding: MockEmbedding) -> Self {
        self.embedding = Some(embedding);
        self
    }

    /// Override the dispatcher's model priority list.
    pub fn with_models(mut self, models: Vec<&str>) -> Self {
        self.models = models.into_iter().map(String::from).collect();
        self
    }

    /// Override the ledger retention bound.
    pub fn with_history_retention(mut self, retention: usize) -> Self {
        self.history_retention = retention;
        self
    }

    /// Builds the harness: spawns the agent task and attaches a client.
    ///
    /// The greeting `status` frame is left in the event queue for the test
    /// to consume via [`TestHarness::next_event`].
    pub async fn build(self) -> TestHarness {
        let store = Arc::new(MemorySnapshotStore::new());
        let generation = Arc::new(self.generation.unwrap_or_default());
        let index = Arc::new(self.index.unwrap_or_default());
        let embedding = Arc::new(self.embedding.unwrap_or_else(MockEmbedding::fixed));

        let memory = Arc::new(MemoryStore::new(
            embedding,
            Some(index.clone() as Arc<dyn confab_core::VectorIndex>),
            5,
        ));
        let ledger = HistoryLedger::new(
            self.session_id.clone(),
            store.clone(),
            self.history_retention,
        );
        let dispatcher = GenerationDispatcher::new(generation.clone(), self.models.clone());
        let agent = SessionAgent::new(
            self.session_id.clone(),
            ledger,
            dispatcher,
            memory,
            self.settings.clone(),
        );

        let (commands, command_rx) = mpsc::channel(16);
        tokio::spawn(agent.run(command_rx));

        let (outbound_tx, events) = mpsc::channel(16);
        commands
            .send(AgentCommand::Attach {
                outbound: outbound_tx,
            })
            .await
            .expect("agent mailbox open");

        TestHarness {
            session_id: self.session_id,
            commands,
            events,
            store,
            generation,
            index,
        }
    }
}

/// A complete session test environment over mock backends.
pub struct TestHarness {
    session_id: String,
    /// The agent's mailbox, as the gateway would hold it.
    pub commands: mpsc::Sender<AgentCommand>,
    /// Outbound frames from the agent to the attached client.
    pub events: mpsc::Receiver<ServerEvent>,
    /// In-memory snapshot store for ledger assertions.
    pub store: Arc<MemorySnapshotStore>,
    /// The mock generation backend.
    pub generation: Arc<MockGeneration>,
    /// The mock vector index.
    pub index: Arc<MockVectorIndex>,
}

impl TestHarness {
    /// Create a new builder for configuring the test harness.
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// The session id the agent runs under.
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Sends one raw text frame into the agent's mailbox.
    pub async fn send_frame(&self, payload: &str) {
        self.commands
            .send(AgentCommand::Frame {
                payload: payload.to_string(),
            })
            .await
            .expect("agent mailbox open");
    }

    /// Sends a well-formed user message frame.
    pub async fn send_message(&self, text: &str) {
        let frame = serde_json::json!({ "type": "userMessage", "content": text });
        self.send_frame(&frame.to_string()).await;
    }

    /// Next outbound frame, or `None` if nothing arrives in time.
    pub async fn next_event(&mut self) -> Option<ServerEvent> {
        tokio::time::timeout(EVENT_TIMEOUT, self.events.recv())
            .await
            .ok()
            .flatten()
    }

    /// The persisted turn sequence for this session.
    pub fn persisted_turns(&self) -> Vec<confab_core::Turn> {
        self.store.snapshot(&self.session_id).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use confab_core::Role;

    #[tokio::test]
    async fn harness_greets_on_attach() {
        let mut harness = TestHarness::builder().build().await;
        let greeting = harness.next_event().await.unwrap();
        assert!(matches!(greeting, ServerEvent::Status { .. }));
    }

    #[tokio::test]
    async fn send_message_round_trips_through_the_agent() {
        let mut harness = TestHarness::builder()
            .with_replies(vec!["scripted answer".to_string()])
            .build()
            .await;

        let _greeting = harness.next_event().await.unwrap();
        harness.send_message("hello").await;

        let reply = harness.next_event().await.unwrap();
        assert_eq!(
            reply,
            ServerEvent::AssistantReply {
                content: "scripted answer".into()
            }
        );

        let turns = harness.persisted_turns();
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].role, Role::User);
        assert_eq!(turns[1].role, Role::Assistant);
    }

    #[tokio::test]
    async fn malformed_frames_produce_no_events() {
        let mut harness = TestHarness::builder().build().await;
        let _greeting = harness.next_event().await.unwrap();

        harness.send_frame("{{{ not json").await;
        harness.send_frame(r#"{"type":"mystery"}"#).await;

        // Follow with a real message; the next event is its reply, proving
        // the noise produced nothing.
        harness.send_message("after noise").await;
        let reply = harness.next_event().await.unwrap();
        assert!(matches!(reply, ServerEvent::AssistantReply { .. }));
        assert_eq!(harness.persisted_turns().len(), 2);
    }
}
