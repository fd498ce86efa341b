// SPDX-FileCopyrightText: 2026 Confab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Long-term semantic memory for the Confab session agent.
//!
//! Wraps an embedding backend and a vector index into two best-effort
//! operations: retrieve context for a query, and record a completed
//! exchange. Neither can fail a conversational turn -- every internal
//! failure is logged and converted into an empty result.

pub mod store;

pub use store::MemoryStore;
