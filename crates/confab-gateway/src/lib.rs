// SPDX-FileCopyrightText: 2026 Confab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP/WebSocket gateway for Confab.
//!
//! Upgrades `GET /agents/{session}` to a duplex stream and routes it, by
//! the session id in the path, to that session's persistent agent. The
//! gateway owns no conversation logic; it is routing and frame plumbing
//! around the confab-agent core.

pub mod registry;
pub mod server;
pub mod ws;

pub use registry::SessionRegistry;
pub use server::{GatewayState, ServerOptions, build_router, start_server};
