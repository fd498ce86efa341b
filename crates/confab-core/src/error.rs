// SPDX-FileCopyrightText: 2026 Confab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Confab session agent.

use thiserror::Error;

/// The primary error type used across Confab's trait seams and core operations.
#[derive(Debug, Error)]
pub enum ConfabError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Snapshot store errors (database connection, query failure, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Connection and wire-protocol errors (bind failure, socket teardown).
    #[error("channel error: {message}")]
    Channel {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Generation backend errors, classified so the dispatcher can decide
    /// whether to fall through to the next model or stop.
    #[error("generation error: {message}")]
    Generation {
        kind: GenerationErrorKind,
        message: String,
    },

    /// Embedding or vector-index errors. These are recovered inside the
    /// memory adapter and never reach a conversational turn.
    #[error("memory error: {message}")]
    Memory {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Classification of a generation backend failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationErrorKind {
    /// The requested model id is unknown or unsupported by the backend.
    /// The dispatcher continues with the next model in priority order.
    ModelUnavailable,
    /// Any other failure. The dispatcher stops and surfaces it.
    Other,
}

impl ConfabError {
    /// Returns the failure classification if this is a generation error.
    pub fn generation_kind(&self) -> Option<GenerationErrorKind> {
        match self {
            ConfabError::Generation { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}
