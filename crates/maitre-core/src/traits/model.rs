// SPDX-FileCopyrightText: 2026 Maitre Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Model provider trait for language-model completions.

use async_trait::async_trait;

use crate::error::MaitreError;
use crate::traits::adapter::Adapter;

/// Language-model collaborator. The draft generator is the sole caller.
#[async_trait]
pub trait ModelProvider: Adapter {
    /// Sends a completion request and returns the generated text.
    ///
    /// Fails with [`MaitreError::Generation`]; transient API failures are
    /// marked as such so the draft generator can retry them.
    async fn complete(&self, prompt: &str) -> Result<String, MaitreError>;
}
