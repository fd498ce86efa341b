// SPDX-FileCopyrightText: 2026 Confab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde
//! attributes, such as known log levels, non-empty paths, and a non-empty
//! model priority list.

use crate::diagnostic::ConfigError;
use crate::model::ConfabConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &ConfabConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    // Validate log level is known.
    if !LOG_LEVELS.contains(&config.agent.log_level.as_str()) {
        errors.push(ConfigError::Validation {
            message: format!(
                "agent.log_level `{}` is not one of: {}",
                config.agent.log_level,
                LOG_LEVELS.join(", ")
            ),
        });
    }

    // Validate ledger bounds.
    if config.agent.history_retention == 0 {
        errors.push(ConfigError::Validation {
            message: "agent.history_retention must be at least 1".to_string(),
        });
    }

    if config.agent.context_turns == 0 {
        errors.push(ConfigError::Validation {
            message: "agent.context_turns must be at least 1".to_string(),
        });
    }

    if config.agent.context_turns > config.agent.history_retention {
        errors.push(ConfigError::Validation {
            message: format!(
                "agent.context_turns ({}) must not exceed agent.history_retention ({})",
                config.agent.context_turns, config.agent.history_retention
            ),
        });
    }

    // Validate the model priority list is non-empty and has no blank entries.
    if config.generation.models.is_empty() {
        errors.push(ConfigError::Validation {
            message: "generation.models must list at least one model id".to_string(),
        });
    }

    for (i, model) in config.generation.models.iter().enumerate() {
        if model.trim().is_empty() {
            errors.push(ConfigError::Validation {
                message: format!("generation.models[{i}] must not be empty"),
            });
        }
    }

    if config.generation.embedding_model.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "generation.embedding_model must not be empty".to_string(),
        });
    }

    // Validate memory retrieval depth.
    if config.memory.top_k == 0 {
        errors.push(ConfigError::Validation {
            message: "memory.top_k must be at least 1".to_string(),
        });
    }

    // Validate database_path is not empty.
    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "storage.database_path must not be empty".to_string(),
        });
    }

    // Validate server host looks like a valid IP or hostname.
    let host = config.server.host.trim();
    if host.is_empty() {
        errors.push(ConfigError::Validation {
            message: "server.host must not be empty".to_string(),
        });
    } else {
        let is_valid_ip = host.parse::<std::net::IpAddr>().is_ok();
        let is_valid_hostname = host
            .chars()
            .all(|c| c.is_alphanumeric() || c == '.' || c == '-' || c == ':');
        if !is_valid_ip && !is_valid_hostname {
            errors.push(ConfigError::Validation {
                message: format!("server.host `{host}` is not a valid IP address or hostname"),
            });
        }
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}
