// SPDX-FileCopyrightText: 2026 Confab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Session agent core for Confab.
//!
//! One [`SessionAgent`] owns one conversation: it consumes commands from a
//! mailbox, keeps its [`HistoryLedger`] durable and bounded, augments each
//! prompt with retrieved memory, and calls generation through the
//! [`GenerationDispatcher`]'s ordered model fallback. The session router
//! in confab-gateway maps session ids onto these agents.

pub mod dispatch;
pub mod ledger;
pub mod session;
pub mod shutdown;

pub use dispatch::GenerationDispatcher;
pub use ledger::HistoryLedger;
pub use session::{AgentCommand, DEFAULT_SYSTEM_PROMPT, SessionAgent, SessionSettings};
