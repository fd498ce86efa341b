// SPDX-FileCopyrightText: 2026 Confab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Confab session agent.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level Confab configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable
/// overrides. All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ConfabConfig {
    /// Agent identity and conversation behavior settings.
    #[serde(default)]
    pub agent: AgentConfig,

    /// Generation backend settings, including the model priority list.
    #[serde(default)]
    pub generation: GenerationConfig,

    /// Long-term memory settings.
    #[serde(default)]
    pub memory: MemoryConfig,

    /// History snapshot storage settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// WebSocket server settings.
    #[serde(default)]
    pub server: ServerConfig,
}

/// Agent identity and conversation behavior.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    /// Display name of the agent, used in the connection greeting.
    #[serde(default = "default_agent_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// System prompt override. `None` uses the built-in instruction.
    #[serde(default)]
    pub system_prompt: Option<String>,

    /// Maximum number of turns retained per session ledger. Older turns
    /// are evicted first.
    #[serde(default = "default_history_retention")]
    pub history_retention: usize,

    /// Number of recent turns included as conversational context in each
    /// generation prompt.
    #[serde(default = "default_context_turns")]
    pub context_turns: usize,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: default_agent_name(),
            log_level: default_log_level(),
            system_prompt: None,
            history_retention: default_history_retention(),
            context_turns: default_context_turns(),
        }
    }
}

fn default_agent_name() -> String {
    "confab".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_history_retention() -> usize {
    50
}

fn default_context_turns() -> usize {
    6
}

/// Generation backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GenerationConfig {
    /// Cloudflare account id. `None` requires environment variable.
    #[serde(default)]
    pub account_id: Option<String>,

    /// API token for the Workers AI and Vectorize REST APIs.
    #[serde(default)]
    pub api_token: Option<String>,

    /// Chat model ids in priority order (highest quality/cost first).
    /// The dispatcher tries each in turn when a model is unavailable.
    #[serde(default = "default_models")]
    pub models: Vec<String>,

    /// Embedding model id used for memory retrieval and recording.
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            account_id: None,
            api_token: None,
            models: default_models(),
            embedding_model: default_embedding_model(),
        }
    }
}

fn default_models() -> Vec<String> {
    vec![
        "@cf/meta/llama-3.1-70b-instruct".to_string(),
        "@cf/meta/llama-3.1-8b-instruct".to_string(),
        "@cf/mistral/mistral-7b-instruct-v0.2".to_string(),
    ]
}

fn default_embedding_model() -> String {
    "@cf/baai/bge-base-en-v1.5".to_string()
}

/// Long-term memory configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MemoryConfig {
    /// Enable memory retrieval and recording. When false, turns are
    /// answered from history alone.
    #[serde(default = "default_memory_enabled")]
    pub enabled: bool,

    /// Vectorize index name. `None` disables the vector index even when
    /// memory is enabled; retrieval then yields empty context.
    #[serde(default)]
    pub index: Option<String>,

    /// Number of nearest matches fetched per retrieval.
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            enabled: default_memory_enabled(),
            index: None,
            top_k: default_top_k(),
        }
    }
}

fn default_memory_enabled() -> bool {
    true
}

fn default_top_k() -> usize {
    5
}

/// History snapshot storage configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("confab").join("confab.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("confab.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_wal_mode() -> bool {
    true
}

/// WebSocket server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8787
}
