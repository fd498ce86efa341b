// SPDX-FileCopyrightText: 2026 Confab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-session actor that drives one conversation's full message loop.
//!
//! The agent owns its ledger exclusively and processes commands from a
//! mailbox, so the steps of a turn never interleave with another turn of
//! the same session. Only the trailing memory-recording step is spawned
//! off and may overlap the next turn -- the memory store is append-only,
//! so the race is harmless.
//!
//! Failure isolation per turn: retrieval failures yield empty context,
//! generation failures yield a fallback reply, recording failures are
//! invisible. Only a snapshot persist failure aborts the turn; it is
//! reported to the client as an `error` frame and closes the connection,
//! leaving the agent and its durable ledger intact for a reconnect.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use confab_core::{ChatMessage, ClientEvent, ConfabError, Role, ServerEvent};
use confab_memory::MemoryStore;

use crate::dispatch::GenerationDispatcher;
use crate::ledger::HistoryLedger;

/// Built-in system instruction, used when the config provides none.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful personal assistant.\n\
Use retrieved memory when relevant. Be concise and accurate.\n\
If you don't know, say so clearly.";

/// Commands delivered to a session agent's mailbox.
#[derive(Debug)]
pub enum AgentCommand {
    /// A client connected; subsequent outbound frames go to this sender.
    Attach {
        outbound: mpsc::Sender<ServerEvent>,
    },
    /// A raw text frame arrived from the attached client.
    Frame { payload: String },
    /// The client's stream closed.
    Detach,
}

/// Per-session conversation settings.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    /// Display name used in the connection greeting.
    pub agent_name: String,
    /// System instruction leading every prompt.
    pub system_prompt: String,
    /// Number of recent turns included in each prompt.
    pub context_turns: usize,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            agent_name: "confab".to_string(),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            context_turns: 6,
        }
    }
}

/// The actor owning one session's lifecycle: mailbox loop, prompt
/// assembly, dispatch, reply delivery, ledger updates, and best-effort
/// memory recording.
pub struct SessionAgent {
    session_id: String,
    ledger: HistoryLedger,
    dispatcher: GenerationDispatcher,
    memory: Arc<MemoryStore>,
    settings: SessionSettings,
    outbound: Option<mpsc::Sender<ServerEvent>>,
}

impl SessionAgent {
    pub fn new(
        session_id: String,
        ledger: HistoryLedger,
        dispatcher: GenerationDispatcher,
        memory: Arc<MemoryStore>,
        settings: SessionSettings,
    ) -> Self {
        Self {
            session_id,
            ledger,
            dispatcher,
            memory,
            settings,
            outbound: None,
        }
    }

    /// Runs the mailbox loop until every command sender is dropped.
    ///
    /// The agent outlives individual connections: a Detach (or a turn
    /// fault) only drops the outbound handle, and the next Attach resumes
    /// the same ledger.
    pub async fn run(mut self, mut commands: mpsc::Receiver<AgentCommand>) {
        while let Some(command) = commands.recv().await {
            match command {
                AgentCommand::Attach { outbound } => self.attach(outbound).await,
                AgentCommand::Frame { payload } => self.handle_frame(&payload).await,
                AgentCommand::Detach => {
                    debug!(session_id = %self.session_id, "client detached");
                    self.outbound = None;
                }
            }
        }
        debug!(session_id = %self.session_id, "agent mailbox closed");
    }

    /// Binds a new connection: hydrates the ledger (first stream only --
    /// hydration is idempotent) and greets the client.
    async fn attach(&mut self, outbound: mpsc::Sender<ServerEvent>) {
        if let Err(e) = self.ledger.hydrate().await {
            error!(session_id = %self.session_id, error = %e, "ledger hydration failed");
            let _ = outbound
                .send(ServerEvent::Error {
                    content: e.to_string(),
                })
                .await;
            return;
        }

        info!(
            session_id = %self.session_id,
            history = self.ledger.len(),
            "client attached"
        );
        self.outbound = Some(outbound);
        self.send(ServerEvent::Status {
            content: format!("Connected to {} ✅", self.settings.agent_name),
        })
        .await;
    }

    /// Handles one raw inbound frame. Malformed payloads and unrecognized
    /// types are dropped without any outbound traffic or state change.
    async fn handle_frame(&mut self, payload: &str) {
        let Some(event) = decode_frame(payload) else {
            debug!(session_id = %self.session_id, "ignoring unrecognized frame");
            return;
        };

        let text = event.text();
        if let Err(e) = self.process_message(text).await {
            error!(session_id = %self.session_id, error = %e, "turn processing failed");
            self.send(ServerEvent::Error {
                content: e.to_string(),
            })
            .await;
            // Dropping the outbound handle closes the connection; the
            // agent and its durable ledger survive for the next connect.
            self.outbound = None;
        }
    }

    /// Runs one full turn for a user message.
    async fn process_message(&mut self, text: String) -> Result<(), ConfabError> {
        self.ledger.append(Role::User, text.clone()).await?;

        // Retrieval is best-effort: failures and misses both yield "".
        let memory_context = self.memory.retrieve(&text).await;

        let recent = self.ledger.recent(self.settings.context_turns).await?;
        let mut messages = Vec::with_capacity(recent.len() + 3);
        messages.push(ChatMessage::system(self.settings.system_prompt.clone()));
        if !memory_context.is_empty() {
            messages.push(ChatMessage::system(format!(
                "Context from memory:\n{memory_context}"
            )));
        }
        messages.extend(recent.iter().map(ChatMessage::from));
        messages.push(ChatMessage::user(text.clone()));

        let reply = match self.dispatcher.generate(&messages).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(session_id = %self.session_id, error = %e, "generation failed, sending fallback reply");
                format!("Model error: {e}")
            }
        };

        // The reply goes out before the assistant turn is persisted; a
        // persist failure below cannot retract what the client saw.
        self.send(ServerEvent::AssistantReply {
            content: reply.clone(),
        })
        .await;

        self.ledger.append(Role::Assistant, reply.clone()).await?;

        // Fire-and-forget: recording may still be in flight when the next
        // turn begins, and its failure never reaches the client.
        let memory = Arc::clone(&self.memory);
        tokio::spawn(async move {
            memory.record(&text, &reply).await;
        });

        Ok(())
    }

    /// Sends a frame to the attached client, if any. A closed or missing
    /// connection discards the frame; replies computed after a close are
    /// undeliverable, not errors.
    async fn send(&self, event: ServerEvent) {
        if let Some(outbound) = &self.outbound
            && outbound.send(event).await.is_err()
        {
            debug!(session_id = %self.session_id, "client gone, dropping outbound frame");
        }
    }
}

/// Parses a raw frame into a recognized client event, or `None` for
/// anything malformed or of an unrecognized type.
fn decode_frame(payload: &str) -> Option<ClientEvent> {
    serde_json::from_str(payload).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration;

    use confab_core::types::{IndexEntry, IndexMatch};
    use confab_core::{
        EmbeddingBackend, GenerationBackend, GenerationErrorKind, SnapshotStore, Turn, VectorIndex,
    };

    #[derive(Default)]
    struct InMemoryStore {
        snapshots: Mutex<HashMap<String, Vec<Turn>>>,
    }

    #[async_trait]
    impl SnapshotStore for InMemoryStore {
        async fn get(&self, session_id: &str) -> Result<Option<Vec<Turn>>, ConfabError> {
            Ok(self.snapshots.lock().unwrap().get(session_id).cloned())
        }

        async fn put(&self, session_id: &str, turns: &[Turn]) -> Result<(), ConfabError> {
            self.snapshots
                .lock()
                .unwrap()
                .insert(session_id.to_string(), turns.to_vec());
            Ok(())
        }
    }

    struct RecordingBackend {
        reply: Result<String, String>,
        prompts: Mutex<Vec<Vec<ChatMessage>>>,
    }

    impl RecordingBackend {
        fn replying(text: &str) -> Self {
            Self {
                reply: Ok(text.to_string()),
                prompts: Mutex::new(Vec::new()),
            }
        }

        fn failing(message: &str) -> Self {
            Self {
                reply: Err(message.to_string()),
                prompts: Mutex::new(Vec::new()),
            }
        }

        fn last_prompt(&self) -> Vec<ChatMessage> {
            self.prompts.lock().unwrap().last().cloned().unwrap()
        }
    }

    #[async_trait]
    impl GenerationBackend for RecordingBackend {
        async fn invoke(
            &self,
            _model: &str,
            messages: &[ChatMessage],
        ) -> Result<String, ConfabError> {
            self.prompts.lock().unwrap().push(messages.to_vec());
            match &self.reply {
                Ok(text) => Ok(text.clone()),
                Err(message) => Err(ConfabError::Generation {
                    kind: GenerationErrorKind::Other,
                    message: message.clone(),
                }),
            }
        }
    }

    struct FixedEmbedding;

    #[async_trait]
    impl EmbeddingBackend for FixedEmbedding {
        async fn embed(&self, _text: &str) -> Result<Option<Vec<f32>>, ConfabError> {
            Ok(Some(vec![0.1, 0.2]))
        }
    }

    #[derive(Default)]
    struct CapturingIndex {
        matches: Vec<IndexMatch>,
        upserts: Mutex<Vec<IndexEntry>>,
    }

    #[async_trait]
    impl VectorIndex for CapturingIndex {
        async fn search(
            &self,
            _vector: &[f32],
            _top_k: usize,
        ) -> Result<Vec<IndexMatch>, ConfabError> {
            Ok(self.matches.clone())
        }

        async fn upsert(&self, entries: Vec<IndexEntry>) -> Result<(), ConfabError> {
            self.upserts.lock().unwrap().extend(entries);
            Ok(())
        }
    }

    struct Fixture {
        agent: SessionAgent,
        store: Arc<InMemoryStore>,
        backend: Arc<RecordingBackend>,
        index: Arc<CapturingIndex>,
    }

    fn fixture(backend: RecordingBackend, index: CapturingIndex) -> Fixture {
        let store = Arc::new(InMemoryStore::default());
        let backend = Arc::new(backend);
        let index = Arc::new(index);
        let memory = Arc::new(MemoryStore::new(
            Arc::new(FixedEmbedding),
            Some(index.clone() as Arc<dyn VectorIndex>),
            5,
        ));
        let ledger = HistoryLedger::new("sess-1".into(), store.clone(), 50);
        let dispatcher =
            GenerationDispatcher::new(backend.clone(), vec!["model-a".to_string()]);
        let agent = SessionAgent::new(
            "sess-1".into(),
            ledger,
            dispatcher,
            memory,
            SessionSettings::default(),
        );
        Fixture {
            agent,
            store,
            backend,
            index,
        }
    }

    fn match_with_content(text: &str) -> IndexMatch {
        let mut metadata = serde_json::Map::new();
        metadata.insert("content".into(), serde_json::Value::String(text.into()));
        IndexMatch {
            id: "m-1".into(),
            score: 0.9,
            metadata,
        }
    }

    #[test]
    fn decode_frame_accepts_user_message() {
        let event = decode_frame(r#"{"type":"userMessage","content":"Hi"}"#).unwrap();
        assert_eq!(event.text(), "Hi");
    }

    #[test]
    fn decode_frame_rejects_garbage_and_unknown_types() {
        assert!(decode_frame("not json at all").is_none());
        assert!(decode_frame(r#"{"type":"ping"}"#).is_none());
        assert!(decode_frame(r#"{"content":"no type"}"#).is_none());
    }

    #[tokio::test]
    async fn turn_appends_user_then_assistant() {
        let mut f = fixture(RecordingBackend::replying("the reply"), CapturingIndex::default());

        f.agent.process_message("Hi".into()).await.unwrap();

        let turns = f.store.get("sess-1").await.unwrap().unwrap();
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].role, Role::User);
        assert_eq!(turns[0].content, "Hi");
        assert_eq!(turns[1].role, Role::Assistant);
        assert_eq!(turns[1].content, "the reply");
        assert!(turns[0].ts <= turns[1].ts);
    }

    #[tokio::test]
    async fn prompt_leads_with_system_then_history_then_message() {
        let mut f = fixture(RecordingBackend::replying("ok"), CapturingIndex::default());

        f.agent.process_message("first".into()).await.unwrap();
        f.agent.process_message("second".into()).await.unwrap();

        let prompt = f.backend.last_prompt();
        // system, then the recent window (which already contains the new
        // user turn), then the message itself as the final entry.
        assert_eq!(prompt[0].role, confab_core::ChatRole::System);
        assert_eq!(prompt[0].content, DEFAULT_SYSTEM_PROMPT);
        let last = prompt.last().unwrap();
        assert_eq!(last.role, confab_core::ChatRole::User);
        assert_eq!(last.content, "second");
        // History covers the prior exchange in order.
        assert_eq!(prompt[1].content, "first");
        assert_eq!(prompt[2].content, "ok");
    }

    #[tokio::test]
    async fn retrieved_memory_becomes_second_system_message() {
        let index = CapturingIndex {
            matches: vec![match_with_content("the user's dog is Max")],
            ..Default::default()
        };
        let mut f = fixture(RecordingBackend::replying("ok"), index);

        f.agent.process_message("what's my dog's name?".into()).await.unwrap();

        let prompt = f.backend.last_prompt();
        assert_eq!(prompt[1].role, confab_core::ChatRole::System);
        assert_eq!(
            prompt[1].content,
            "Context from memory:\nthe user's dog is Max"
        );
    }

    #[tokio::test]
    async fn empty_memory_context_adds_no_system_message() {
        let mut f = fixture(RecordingBackend::replying("ok"), CapturingIndex::default());

        f.agent.process_message("hello".into()).await.unwrap();

        let prompt = f.backend.last_prompt();
        // Exactly one system message when nothing was retrieved.
        let system_count = prompt
            .iter()
            .filter(|m| m.role == confab_core::ChatRole::System)
            .count();
        assert_eq!(system_count, 1);
    }

    #[tokio::test]
    async fn generation_failure_produces_fallback_reply_and_persists_both_turns() {
        let mut f = fixture(
            RecordingBackend::failing("backend exploded"),
            CapturingIndex::default(),
        );

        f.agent.process_message("Hi".into()).await.unwrap();

        let turns = f.store.get("sess-1").await.unwrap().unwrap();
        assert_eq!(turns.len(), 2);
        assert!(
            turns[1].content.starts_with("Model error:"),
            "got: {}",
            turns[1].content
        );
    }

    #[tokio::test]
    async fn exchange_is_recorded_to_memory() {
        let mut f = fixture(RecordingBackend::replying("noted"), CapturingIndex::default());

        f.agent.process_message("remember this".into()).await.unwrap();

        // Recording is spawned; give it a moment to land.
        tokio::time::sleep(Duration::from_millis(50)).await;

        let upserts = f.index.upserts.lock().unwrap();
        assert_eq!(upserts.len(), 1);
        assert_eq!(
            upserts[0].metadata.get("content").and_then(|v| v.as_str()),
            Some("User: remember this\nAssistant: noted")
        );
    }

    #[tokio::test]
    async fn mailbox_loop_greets_processes_and_ignores_noise() {
        let f = fixture(RecordingBackend::replying("hello there"), CapturingIndex::default());
        let (command_tx, command_rx) = mpsc::channel(16);
        let (outbound_tx, mut outbound_rx) = mpsc::channel(16);

        let agent_task = tokio::spawn(f.agent.run(command_rx));

        command_tx
            .send(AgentCommand::Attach {
                outbound: outbound_tx,
            })
            .await
            .unwrap();

        let greeting = outbound_rx.recv().await.unwrap();
        assert!(matches!(greeting, ServerEvent::Status { .. }));

        // Noise frames produce no outbound traffic.
        command_tx
            .send(AgentCommand::Frame {
                payload: "garbage".into(),
            })
            .await
            .unwrap();
        command_tx
            .send(AgentCommand::Frame {
                payload: r#"{"type":"somethingElse","content":"x"}"#.into(),
            })
            .await
            .unwrap();

        command_tx
            .send(AgentCommand::Frame {
                payload: r#"{"type":"userMessage","content":"Hi"}"#.into(),
            })
            .await
            .unwrap();

        let reply = outbound_rx.recv().await.unwrap();
        assert_eq!(
            reply,
            ServerEvent::AssistantReply {
                content: "hello there".into()
            }
        );

        drop(command_tx);
        agent_task.await.unwrap();
    }

    #[tokio::test]
    async fn detach_then_reattach_resumes_the_same_ledger() {
        let f = fixture(RecordingBackend::replying("again"), CapturingIndex::default());
        let store = f.store.clone();
        let (command_tx, command_rx) = mpsc::channel(16);
        let agent_task = tokio::spawn(f.agent.run(command_rx));

        let (outbound_tx, mut outbound_rx) = mpsc::channel(16);
        command_tx
            .send(AgentCommand::Attach { outbound: outbound_tx })
            .await
            .unwrap();
        let _greeting = outbound_rx.recv().await.unwrap();
        command_tx
            .send(AgentCommand::Frame {
                payload: r#"{"type":"userMessage","content":"one"}"#.into(),
            })
            .await
            .unwrap();
        let _reply = outbound_rx.recv().await.unwrap();
        command_tx.send(AgentCommand::Detach).await.unwrap();

        // Reconnect under the same session: history continues.
        let (outbound_tx, mut outbound_rx) = mpsc::channel(16);
        command_tx
            .send(AgentCommand::Attach { outbound: outbound_tx })
            .await
            .unwrap();
        let _greeting = outbound_rx.recv().await.unwrap();
        command_tx
            .send(AgentCommand::Frame {
                payload: r#"{"type":"userMessage","content":"two"}"#.into(),
            })
            .await
            .unwrap();
        let _reply = outbound_rx.recv().await.unwrap();

        drop(command_tx);
        agent_task.await.unwrap();

        let turns = store.get("sess-1").await.unwrap().unwrap();
        assert_eq!(turns.len(), 4);
        assert_eq!(turns[0].content, "one");
        assert_eq!(turns[2].content, "two");
    }
}
