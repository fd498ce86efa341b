// SPDX-FileCopyrightText: 2026 Confab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Session routing: one long-lived agent task per session id.
//!
//! The registry creates an agent on first contact with a session id and
//! hands back its mailbox for every later connection, so reconnects resume
//! the same in-memory ledger. No two agents ever own the same session.

use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tokio::sync::mpsc;
use tracing::info;

use confab_agent::{
    AgentCommand, GenerationDispatcher, HistoryLedger, SessionAgent, SessionSettings,
};
use confab_core::{GenerationBackend, SnapshotStore};
use confab_memory::MemoryStore;

/// Mailbox capacity per session agent.
const MAILBOX_CAPACITY: usize = 64;

/// Maps session ids to persistent [`SessionAgent`] tasks.
pub struct SessionRegistry {
    store: Arc<dyn SnapshotStore>,
    backend: Arc<dyn GenerationBackend>,
    memory: Arc<MemoryStore>,
    models: Vec<String>,
    history_retention: usize,
    settings: SessionSettings,
    agents: DashMap<String, mpsc::Sender<AgentCommand>>,
}

impl SessionRegistry {
    pub fn new(
        store: Arc<dyn SnapshotStore>,
        backend: Arc<dyn GenerationBackend>,
        memory: Arc<MemoryStore>,
        models: Vec<String>,
        history_retention: usize,
        settings: SessionSettings,
    ) -> Self {
        Self {
            store,
            backend,
            memory,
            models,
            history_retention,
            settings,
            agents: DashMap::new(),
        }
    }

    /// Returns the mailbox for a session's agent, spawning the agent on
    /// first contact. A dead mailbox (agent task gone) is replaced.
    pub fn handle_for(&self, session_id: &str) -> mpsc::Sender<AgentCommand> {
        match self.agents.entry(session_id.to_string()) {
            Entry::Occupied(mut occupied) => {
                if occupied.get().is_closed() {
                    let handle = self.spawn_agent(session_id);
                    occupied.insert(handle.clone());
                    handle
                } else {
                    occupied.get().clone()
                }
            }
            Entry::Vacant(vacant) => {
                let handle = self.spawn_agent(session_id);
                vacant.insert(handle.clone());
                handle
            }
        }
    }

    /// Number of live session agents.
    pub fn session_count(&self) -> usize {
        self.agents.len()
    }

    fn spawn_agent(&self, session_id: &str) -> mpsc::Sender<AgentCommand> {
        let (command_tx, command_rx) = mpsc::channel(MAILBOX_CAPACITY);

        let ledger = HistoryLedger::new(
            session_id.to_string(),
            self.store.clone(),
            self.history_retention,
        );
        let dispatcher = GenerationDispatcher::new(self.backend.clone(), self.models.clone());
        let agent = SessionAgent::new(
            session_id.to_string(),
            ledger,
            dispatcher,
            self.memory.clone(),
            self.settings.clone(),
        );

        tokio::spawn(agent.run(command_rx));
        info!(session_id, "session agent started");
        command_tx
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    use confab_core::{ChatMessage, ConfabError, EmbeddingBackend, Turn};

    #[derive(Default)]
    struct NullStore {
        snapshots: Mutex<HashMap<String, Vec<Turn>>>,
    }

    #[async_trait]
    impl SnapshotStore for NullStore {
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

    struct EchoBackend;

    #[async_trait]
    impl GenerationBackend for EchoBackend {
        async fn invoke(
            &self,
            _model: &str,
            _messages: &[ChatMessage],
        ) -> Result<String, ConfabError> {
            Ok("echo".to_string())
        }
    }

    struct NoEmbedding;

    #[async_trait]
    impl EmbeddingBackend for NoEmbedding {
        async fn embed(&self, _text: &str) -> Result<Option<Vec<f32>>, ConfabError> {
            Ok(None)
        }
    }

    fn registry() -> SessionRegistry {
        let memory = Arc::new(MemoryStore::new(Arc::new(NoEmbedding), None, 5));
        SessionRegistry::new(
            Arc::new(NullStore::default()),
            Arc::new(EchoBackend),
            memory,
            vec!["model-a".to_string()],
            50,
            SessionSettings::default(),
        )
    }

    #[tokio::test]
    async fn same_session_reuses_the_agent() {
        let registry = registry();
        let first = registry.handle_for("sess-1");
        let second = registry.handle_for("sess-1");

        assert!(first.same_channel(&second));
        assert_eq!(registry.session_count(), 1);
    }

    #[tokio::test]
    async fn different_sessions_get_distinct_agents() {
        let registry = registry();
        let a = registry.handle_for("sess-a");
        let b = registry.handle_for("sess-b");

        assert!(!a.same_channel(&b));
        assert_eq!(registry.session_count(), 2);
    }

    #[tokio::test]
    async fn handles_survive_connection_churn() {
        let registry = registry();
        let first = registry.handle_for("sess-1");
        drop(first);

        // The registry keeps its own sender, so the agent stays alive and
        // the next connection reaches the same mailbox.
        let again = registry.handle_for("sess-1");
        assert!(!again.is_closed());
        assert_eq!(registry.session_count(), 1);
    }
}
