// SPDX-FileCopyrightText: 2026 Confab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types used across the trait seams and the Confab workspace:
//! conversation turns, prompt messages, wire-protocol events, and
//! vector-index entry/match shapes.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Role of a conversation turn. The ledger only ever holds user and
/// assistant turns; system instructions exist solely in assembled prompts.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One message in a session's conversation history.
///
/// Immutable once created; evicted only in bulk by the ledger's retention
/// policy, never individually.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
    /// Milliseconds since the Unix epoch, assigned at append time.
    pub ts: i64,
}

/// Role tag for prompt messages sent to a generation backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

/// A role-tagged message in a generation prompt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

impl From<&Turn> for ChatMessage {
    fn from(turn: &Turn) -> Self {
        let role = match turn.role {
            Role::User => ChatRole::User,
            Role::Assistant => ChatRole::Assistant,
        };
        Self {
            role,
            content: turn.content.clone(),
        }
    }
}

// --- Wire protocol ---

/// Inbound client frame.
///
/// Frames that fail to deserialize (malformed JSON, unrecognized `type`)
/// are dropped silently by the session agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientEvent {
    #[serde(rename = "userMessage")]
    UserMessage {
        #[serde(default)]
        content: Option<serde_json::Value>,
    },
}

impl ClientEvent {
    /// Coerces the frame's content to text: strings pass through, absent or
    /// null content becomes empty, anything else is rendered as compact JSON.
    pub fn text(&self) -> String {
        let ClientEvent::UserMessage { content } = self;
        match content {
            None | Some(serde_json::Value::Null) => String::new(),
            Some(serde_json::Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        }
    }
}

/// Outbound server frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerEvent {
    /// Connection and lifecycle notices.
    #[serde(rename = "status")]
    Status { content: String },
    /// A completed assistant reply.
    #[serde(rename = "assistantReply")]
    AssistantReply { content: String },
    /// A turn- or connection-level failure description.
    #[serde(rename = "error")]
    Error { content: String },
}

// --- Vector index shapes ---

/// An entry to be written to the vector index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexEntry {
    pub id: String,
    pub vector: Vec<f32>,
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

/// A nearest-neighbor match returned by the vector index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexMatch {
    pub id: String,
    #[serde(default)]
    pub score: f64,
    #[serde(default)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}
