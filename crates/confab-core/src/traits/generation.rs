// SPDX-FileCopyrightText: 2026 Confab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Generation backend seam: prompt in, text out.

use async_trait::async_trait;

use crate::error::ConfabError;
use crate::types::ChatMessage;

/// A text-generation capability.
///
/// Implementations must classify failures via
/// [`GenerationErrorKind`](crate::error::GenerationErrorKind) so the
/// dispatcher can distinguish an unknown model from a real failure.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Runs the given model over an ordered list of role-tagged messages
    /// and returns the generated text.
    async fn invoke(
        &self,
        model: &str,
        messages: &[ChatMessage],
    ) -> Result<String, ConfabError>;
}
