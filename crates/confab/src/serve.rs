// SPDX-FileCopyrightText: 2026 Confab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `confab serve` command implementation.
//!
//! Wires the full stack: SQLite snapshot storage, Workers AI generation
//! and embeddings, the optional Vectorize memory index, the session
//! registry, and the WebSocket gateway. Supports graceful shutdown via
//! signal handlers.

use std::sync::Arc;

use tracing::info;

use confab_agent::{DEFAULT_SYSTEM_PROMPT, SessionSettings, shutdown};
use confab_config::model::ConfabConfig;
use confab_core::{ConfabError, EmbeddingBackend, GenerationBackend, SnapshotStore, VectorIndex};
use confab_gateway::{GatewayState, ServerOptions, SessionRegistry, start_server};
use confab_memory::MemoryStore;
use confab_storage::SqliteSnapshots;
use confab_workersai::{VectorizeClient, WorkersAiClient};

/// Runs the `confab serve` command.
pub async fn run_serve(config: ConfabConfig) -> Result<(), ConfabError> {
    init_tracing(&config.agent.log_level);

    info!("starting confab serve");

    // Initialize snapshot storage.
    let snapshots = SqliteSnapshots::new(config.storage.clone());
    snapshots.initialize().await?;
    let store: Arc<dyn SnapshotStore> = Arc::new(snapshots);
    info!(path = config.storage.database_path.as_str(), "snapshot storage ready");

    // Backend credentials are required to serve.
    let Some(account_id) = config.generation.account_id.clone() else {
        eprintln!(
            "error: Cloudflare account id required. Set via: config or CONFAB_GENERATION_ACCOUNT_ID"
        );
        return Err(ConfabError::Config("generation.account_id is not set".into()));
    };
    let Some(api_token) = config.generation.api_token.clone() else {
        eprintln!(
            "error: API token required. Set via: config or CONFAB_GENERATION_API_TOKEN"
        );
        return Err(ConfabError::Config("generation.api_token is not set".into()));
    };

    // One Workers AI client serves both generation and embeddings.
    let workers_ai = Arc::new(WorkersAiClient::new(
        account_id.clone(),
        &api_token,
        config.generation.embedding_model.clone(),
    )?);
    info!(
        models = ?config.generation.models,
        "generation backends configured in fallback order"
    );

    // Vector index for long-term memory (optional).
    let index: Option<Arc<dyn VectorIndex>> = if config.memory.enabled {
        match &config.memory.index {
            Some(index_name) => {
                let client =
                    VectorizeClient::new(account_id, &api_token, index_name.clone())?;
                info!(index = index_name.as_str(), "vector index configured");
                Some(Arc::new(client))
            }
            None => {
                info!("memory enabled but no vector index configured; retrieval yields empty context");
                None
            }
        }
    } else {
        info!("memory system disabled by configuration");
        None
    };

    let memory = Arc::new(MemoryStore::new(
        workers_ai.clone() as Arc<dyn EmbeddingBackend>,
        index,
        config.memory.top_k,
    ));

    let settings = SessionSettings {
        agent_name: config.agent.name.clone(),
        system_prompt: config
            .agent
            .system_prompt
            .clone()
            .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string()),
        context_turns: config.agent.context_turns,
    };

    let registry = Arc::new(SessionRegistry::new(
        store,
        workers_ai as Arc<dyn GenerationBackend>,
        memory,
        config.generation.models.clone(),
        config.agent.history_retention,
        settings,
    ));

    // Install signal handler and serve until shutdown.
    let cancel = shutdown::install_signal_handler();
    let options = ServerOptions {
        host: config.server.host.clone(),
        port: config.server.port,
    };
    start_server(&options, GatewayState { registry }, cancel).await?;

    info!("confab serve shutdown complete");
    Ok(())
}

/// Initializes the tracing subscriber with the given log level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("confab={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
